use serde_json::{json, Value};

use crate::schemas::exam::{Question, QuestionOption, QuestionType};

pub(crate) fn option(label: &str, text: &str, is_correct: bool) -> QuestionOption {
    QuestionOption {
        id: label.to_string(),
        label: label.to_string(),
        text: text.to_string(),
        is_correct,
    }
}

pub(crate) fn choice_question(id: &str, text: &str, options: Vec<QuestionOption>) -> Question {
    Question {
        id: id.to_string(),
        question_type: QuestionType::MultipleChoice,
        question_text: text.to_string(),
        options,
        correct_answer: None,
        points: None,
        explanation: None,
    }
}

pub(crate) fn true_false_question(id: &str, text: &str, correct: &str) -> Question {
    Question {
        id: id.to_string(),
        question_type: QuestionType::TrueFalse,
        question_text: text.to_string(),
        options: Vec::new(),
        correct_answer: Some(correct.to_string()),
        points: None,
        explanation: None,
    }
}

pub(crate) fn free_text_question(id: &str, text: &str, correct: &str) -> Question {
    Question {
        id: id.to_string(),
        question_type: QuestionType::ShortAnswer,
        question_text: text.to_string(),
        options: Vec::new(),
        correct_answer: Some(correct.to_string()),
        points: None,
        explanation: None,
    }
}

pub(crate) fn option_value(label: &str, text: &str, is_correct: bool) -> Value {
    json!({"id": label, "label": label, "text": text, "isCorrect": is_correct})
}

pub(crate) fn choice_question_value(id: &str, text: &str, options: Vec<Value>) -> Value {
    json!({
        "id": id,
        "questionType": "multiple-choice",
        "questionText": text,
        "options": options,
    })
}

pub(crate) fn true_false_question_value(id: &str, text: &str, correct: &str) -> Value {
    json!({
        "id": id,
        "questionType": "true-false",
        "questionText": text,
        "correctAnswer": correct,
    })
}

pub(crate) fn exam_value(
    id: &str,
    title: &str,
    duration_minutes: Option<f64>,
    questions: Vec<Value>,
) -> Value {
    let mut exam = json!({
        "id": id,
        "title": title,
        "passingScore": 60,
        "questions": questions,
    });
    if let Some(duration) = duration_minutes {
        exam["duration"] = json!(duration);
    }
    exam
}
