mod grade;

pub use grade::{evaluate_grade, GradePoint};

use serde::{Deserialize, Serialize};

use crate::schemas::attempt::{answer_is_blank, AnswerValue};
use crate::schemas::exam::{Question, QuestionOption, QuestionType};
use crate::session::answers::AnswerStore;

/// Judged outcome for a single question, including the snapshot fields the
/// review screen needs so the result can be rendered without re-fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionScore {
    pub question_id: String,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Vec<QuestionOption>,
    pub is_multi_select: bool,
    pub user_answer: Option<AnswerValue>,
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
    pub is_correct: bool,
    pub answered: bool,
    pub point_value: f64,
    pub points_earned: f64,
}

/// Aggregate outcome of one submission. Computed once, in a single pass, so
/// the answer counts and the point totals can never disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutcome {
    pub results: Vec<QuestionScore>,
    pub score: f64,
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
    pub total_questions: usize,
    pub total_points: f64,
    pub percentage: f64,
}

/// Grade a question set against the collected answers. Pure and total: no
/// structurally valid input can fail, unknown answer values simply never
/// match. An unanswered question is never correct and never counted
/// incorrect.
pub fn score(questions: &[Question], answers: &AnswerStore) -> ScoreOutcome {
    let mut results = Vec::with_capacity(questions.len());
    let mut correct = 0;
    let mut incorrect = 0;
    let mut unanswered = 0;
    let mut earned_points = 0.0;
    let mut total_points = 0.0;

    for question in questions {
        let user_answer = answers.answer(&question.id).cloned();
        let answered = !answer_is_blank(user_answer.as_ref());
        let is_correct = answered && judge(question, user_answer.as_ref());

        let point_value = question.point_value();
        let points_earned = if is_correct { point_value } else { 0.0 };
        total_points += point_value;
        earned_points += points_earned;

        if !answered {
            unanswered += 1;
        } else if is_correct {
            correct += 1;
        } else {
            incorrect += 1;
        }

        results.push(QuestionScore {
            question_id: question.id.clone(),
            question_text: question.question_text.clone(),
            question_type: question.question_type,
            options: question.options.clone(),
            is_multi_select: question.is_multi_select(),
            user_answer,
            correct_answer: render_correct_answer(question),
            explanation: question.explanation.clone(),
            is_correct,
            answered,
            point_value,
            points_earned,
        });
    }

    let percentage = if total_points > 0.0 { earned_points / total_points * 100.0 } else { 0.0 };

    ScoreOutcome {
        results,
        score: earned_points,
        correct,
        incorrect,
        unanswered,
        total_questions: questions.len(),
        total_points,
        percentage,
    }
}

fn judge(question: &Question, answer: Option<&AnswerValue>) -> bool {
    let Some(answer) = answer else {
        return false;
    };

    match question.question_type {
        QuestionType::MultipleChoice if !question.options.is_empty() => {
            if question.is_multi_select() {
                judge_multi_select(question, answer)
            } else {
                judge_single_select(question, answer)
            }
        }
        // True/false and free-text items compare against the canonical answer
        // verbatim. Exact string equality for short answers is a known
        // limitation of the grading policy, not an accident.
        _ => match answer {
            AnswerValue::One(text) => question.correct_answer.as_deref() == Some(text.as_str()),
            AnswerValue::Many(_) => false,
        },
    }
}

/// Exact set match: every correct option selected and nothing else. Option
/// keys compare case-insensitively; there is no partial credit.
fn judge_multi_select(question: &Question, answer: &AnswerValue) -> bool {
    let AnswerValue::Many(selected) = answer else {
        return false;
    };

    let mut expected: Vec<String> =
        question.correct_options().map(|option| option.key().to_ascii_lowercase()).collect();
    let mut chosen: Vec<String> = selected.iter().map(|item| item.to_ascii_lowercase()).collect();
    expected.sort();
    expected.dedup();
    chosen.sort();
    chosen.dedup();

    expected == chosen
}

fn judge_single_select(question: &Question, answer: &AnswerValue) -> bool {
    let AnswerValue::One(selected) = answer else {
        return false;
    };

    question
        .options
        .iter()
        .find(|option| option.key().eq_ignore_ascii_case(selected))
        .map(|option| option.is_correct)
        .unwrap_or(false)
}

/// The canonical answer as shown on review screens: joined option keys for
/// choice questions, the stored token otherwise.
fn render_correct_answer(question: &Question) -> Option<String> {
    if question.question_type == QuestionType::MultipleChoice && !question.options.is_empty() {
        let keys: Vec<&str> = question.correct_options().map(QuestionOption::key).collect();
        if keys.is_empty() {
            return question.correct_answer.clone();
        }
        return Some(keys.join(", "));
    }

    question.correct_answer.clone()
}

/// Round to two decimals the way scores and percentages are persisted.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
