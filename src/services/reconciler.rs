use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::schemas::attempt::{answer_is_blank, AnswerValue, AttemptAnswer, AttemptRecord};
use crate::schemas::exam::{normalize_options, Exam, Question, QuestionOption, QuestionType};
use crate::scoring::{QuestionScore, ScoreOutcome};

/// One fully populated row of the question review, merged from whichever
/// sources were available.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRow {
    pub question_id: String,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Vec<QuestionOption>,
    pub is_multi_select: bool,
    pub user_answer: Option<AnswerValue>,
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
    pub points: f64,
    pub is_correct: bool,
    pub answered: bool,
}

/// The reconciled review the result screen renders. Aggregates are recomputed
/// from the merged rows; upstream sources disagree or may be partial, so none
/// of their counts is trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledReview {
    pub rows: Vec<ReviewRow>,
    pub score: f64,
    pub percentage: f64,
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
    pub total_questions: usize,
    pub total_points: f64,
}

/// Last-resort score figures, typically read off the result record when
/// neither a live outcome nor the attempt carries them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileFallback {
    pub score: Option<f64>,
    pub percentage: Option<f64>,
}

struct Seed<'a> {
    key: Option<String>,
    base: Option<&'a QuestionScore>,
    attempt: Option<&'a AttemptAnswer>,
}

/// Merge a live outcome, an exam snapshot and a persisted attempt into one
/// ordered review.
///
/// Any of the three sources may be missing; field priority is base outcome,
/// then attempt, then snapshot. Only the total absence of question identity
/// degrades to an empty review; nothing here returns an error.
pub fn reconcile(
    base: Option<&ScoreOutcome>,
    exam: Option<&Exam>,
    attempt: Option<&AttemptRecord>,
    fallback: ReconcileFallback,
) -> ReconciledReview {
    let snapshot_questions: &[Question] =
        exam.map(|exam| exam.questions.as_slice()).unwrap_or_default();
    let attempt_answers: &[AttemptAnswer] =
        attempt.map(|attempt| attempt.answers.as_slice()).unwrap_or_default();

    let question_order: Vec<String> =
        snapshot_questions.iter().map(|question| question.id.clone()).collect();
    let question_lookup: HashMap<&str, &Question> =
        snapshot_questions.iter().map(|question| (question.id.as_str(), question)).collect();
    let answer_lookup: HashMap<String, &AttemptAnswer> = attempt_answers
        .iter()
        .filter_map(|answer| answer.lookup_key().map(|key| (key, answer)))
        .collect();

    let seeds: Vec<Seed<'_>> = match base {
        Some(outcome) if !outcome.results.is_empty() => outcome
            .results
            .iter()
            .map(|row| Seed { key: Some(row.question_id.clone()), base: Some(row), attempt: None })
            .collect(),
        _ if !attempt_answers.is_empty() => attempt_answers
            .iter()
            .map(|answer| Seed { key: answer.lookup_key(), base: None, attempt: Some(answer) })
            .collect(),
        _ => question_order
            .iter()
            .map(|key| Seed { key: Some(key.clone()), base: None, attempt: None })
            .collect(),
    };

    let mut rows: Vec<ReviewRow> = seeds
        .iter()
        .enumerate()
        .map(|(index, seed)| {
            let key = seed
                .key
                .clone()
                .or_else(|| question_order.get(index).cloned())
                .unwrap_or_else(|| index.to_string());

            let question_info = question_lookup.get(key.as_str()).copied();
            let attempt_answer =
                seed.attempt.or_else(|| answer_lookup.get(&key).copied());

            merge_row(index, key, seed.base, attempt_answer, question_info)
        })
        .collect();

    if !question_order.is_empty() {
        let order_index: HashMap<&str, usize> = question_order
            .iter()
            .enumerate()
            .map(|(position, key)| (key.as_str(), position))
            .collect();
        rows.sort_by_key(|row| {
            order_index.get(row.question_id.as_str()).copied().unwrap_or(usize::MAX)
        });
    }

    let total_questions = rows.len();
    let correct = rows.iter().filter(|row| row.is_correct).count();
    let unanswered = rows.iter().filter(|row| !row.answered).count();
    let incorrect = total_questions.saturating_sub(correct + unanswered);

    let score = base
        .map(|outcome| outcome.score)
        .or_else(|| attempt.and_then(|attempt| attempt.score))
        .or(fallback.score)
        .unwrap_or(0.0);
    let percentage = base
        .map(|outcome| outcome.percentage)
        .or_else(|| attempt.and_then(|attempt| attempt.percentage))
        .or(fallback.percentage)
        .unwrap_or(0.0);

    // Point values default to 1 per question, so a snapshot always yields the
    // true total; without one the merged rows are the best available figure.
    let total_points = match base {
        Some(outcome) => outcome.total_points,
        None if !snapshot_questions.is_empty() => {
            snapshot_questions.iter().map(Question::point_value).sum()
        }
        None => rows.iter().map(|row| row.points).sum(),
    };

    ReconciledReview {
        rows,
        score,
        percentage,
        correct,
        incorrect,
        unanswered,
        total_questions,
        total_points,
    }
}

fn merge_row(
    index: usize,
    key: String,
    base: Option<&QuestionScore>,
    attempt: Option<&AttemptAnswer>,
    question: Option<&Question>,
) -> ReviewRow {
    let user_answer = base
        .and_then(|row| row.user_answer.clone())
        .or_else(|| attempt.and_then(|answer| answer.answer.clone()));

    let options = base
        .map(|row| row.options.clone())
        .filter(|options| !options.is_empty())
        .or_else(|| {
            attempt
                .map(|answer| normalize_options(&answer.options))
                .filter(|options| !options.is_empty())
        })
        .or_else(|| question.map(|question| question.options.clone()))
        .unwrap_or_default();

    let correct_answer = base
        .and_then(|row| row.correct_answer.clone())
        .or_else(|| attempt.and_then(|answer| answer.correct_answer.clone()))
        .or_else(|| render_correct_from_options(&options))
        .or_else(|| question.and_then(|question| question.correct_answer.clone()));

    let explanation = base
        .and_then(|row| row.explanation.clone())
        .or_else(|| attempt.and_then(|answer| answer.explanation.clone()))
        .or_else(|| question.and_then(|question| question.explanation.clone()));

    let points = base
        .map(|row| row.point_value)
        .or_else(|| attempt.and_then(|answer| answer.points))
        .or_else(|| question.and_then(|question| question.points))
        .unwrap_or(0.0);

    let question_text = [
        question.map(|question| question.question_text.as_str()),
        base.map(|row| row.question_text.as_str()),
        attempt.and_then(|answer| answer.question.as_deref()),
    ]
    .into_iter()
    .flatten()
    .find(|text| !text.is_empty())
    .map(|text| text.to_string())
    .unwrap_or_else(|| format!("Question {}", index + 1));

    let question_type = question
        .map(|question| question.question_type)
        .or_else(|| base.map(|row| row.question_type))
        .or_else(|| attempt.and_then(|answer| answer.question_type))
        .unwrap_or(QuestionType::Unknown);

    let is_multi_select = base
        .map(|row| row.is_multi_select)
        .unwrap_or_else(|| options.iter().filter(|option| option.is_correct).count() > 1);

    let is_correct = base
        .map(|row| row.is_correct)
        .or_else(|| attempt.map(|answer| answer.is_correct))
        .unwrap_or(false);

    let answered = !answer_is_blank(user_answer.as_ref());

    ReviewRow {
        question_id: key,
        question_text,
        question_type,
        options,
        is_multi_select,
        user_answer,
        correct_answer,
        explanation,
        points,
        is_correct,
        answered,
    }
}

/// Render the canonical answer from option flags: every correct option as
/// "LABEL: text", joined. `None` when no option is flagged correct.
fn render_correct_from_options(options: &[QuestionOption]) -> Option<String> {
    let correct: Vec<String> = options
        .iter()
        .filter(|option| option.is_correct)
        .map(|option| {
            let key = option.key();
            if key.is_empty() {
                option.text.trim().to_string()
            } else {
                format!("{}: {}", key.to_uppercase(), option.text).trim().to_string()
            }
        })
        .collect();

    if correct.is_empty() {
        None
    } else {
        Some(correct.join(", "))
    }
}
