use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schemas::value_to_id;
use crate::services::relations::normalize_entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum QuestionType {
    #[serde(rename = "multiple-choice")]
    MultipleChoice,
    #[serde(rename = "true-false")]
    TrueFalse,
    #[serde(rename = "short-answer")]
    ShortAnswer,
    #[serde(rename = "essay")]
    Essay,
    #[serde(rename = "unknown")]
    Unknown,
}

impl QuestionType {
    fn parse(token: &str) -> Self {
        match token {
            "multiple-choice" => Self::MultipleChoice,
            "true-false" => Self::TrueFalse,
            "short-answer" => Self::ShortAnswer,
            "essay" => Self::Essay,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for QuestionType {
    fn from(token: String) -> Self {
        Self::parse(&token)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub id: String,
    pub label: String,
    pub text: String,
    pub is_correct: bool,
}

impl QuestionOption {
    /// The comparison key answers are matched against: the label when it is
    /// non-empty, the id otherwise.
    pub fn key(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub question_type: QuestionType,
    pub question_text: String,
    pub options: Vec<QuestionOption>,
    pub correct_answer: Option<String>,
    pub points: Option<f64>,
    pub explanation: Option<String>,
}

impl Question {
    /// Multi-select classification is derived, never stored: a choice question
    /// is multi-select iff more than one option is flagged correct.
    pub fn is_multi_select(&self) -> bool {
        self.options.iter().filter(|option| option.is_correct).count() > 1
    }

    pub fn correct_options(&self) -> impl Iterator<Item = &QuestionOption> {
        self.options.iter().filter(|option| option.is_correct)
    }

    pub fn point_value(&self) -> f64 {
        self.points.unwrap_or(1.0)
    }
}

/// The exam snapshot the session and the reconciler work from. Always built
/// through [`Exam::from_value`] so wrapper containers are flattened first.
#[derive(Debug, Clone)]
pub struct Exam {
    pub id: Option<String>,
    pub document_id: Option<String>,
    pub title: String,
    pub duration_minutes: Option<f64>,
    pub passing_score: Option<f64>,
    pub total_points: Option<f64>,
    pub exam_type: Option<String>,
    pub questions: Vec<Question>,
    pub course: Value,
    pub subject: Value,
}

impl Exam {
    pub fn from_value(raw: &Value) -> Self {
        let normalized = normalize_entity(raw);
        let questions = extract_questions(&normalized)
            .iter()
            .enumerate()
            .map(|(index, question)| question_from_value(question, index))
            .collect();

        let passing_score = [normalized.get("passingScore"), normalized.get("passingPercentage")]
            .into_iter()
            .flatten()
            .find_map(Value::as_f64);

        Self {
            id: normalized.get("id").and_then(value_to_id),
            document_id: normalized.get("documentId").and_then(value_to_id),
            title: normalized
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            duration_minutes: normalized.get("duration").and_then(Value::as_f64),
            passing_score,
            total_points: normalized.get("totalPoints").and_then(Value::as_f64),
            exam_type: normalized
                .get("examType")
                .and_then(Value::as_str)
                .map(|value| value.to_string()),
            questions,
            course: normalized.get("course").cloned().unwrap_or(Value::Null),
            subject: normalized.get("subject").cloned().unwrap_or(Value::Null),
        }
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.duration_minutes.map(|minutes| (minutes * 60.0).round() as i64)
    }
}

/// Question sequences arrive as a bare array, a `{data: […]}` container or a
/// single object depending on how the exam was fetched.
fn extract_questions(exam: &Value) -> Vec<Value> {
    let Some(questions) = exam.get("questions") else {
        return Vec::new();
    };

    match questions {
        Value::Array(items) => items.clone(),
        Value::Object(fields) => match fields.get("data") {
            Some(Value::Array(items)) => items.clone(),
            _ => vec![questions.clone()],
        },
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

pub(crate) fn question_from_value(raw: &Value, index: usize) -> Question {
    let normalized = normalize_entity(raw);

    let id = normalized
        .get("id")
        .and_then(value_to_id)
        .or_else(|| normalized.get("documentId").and_then(value_to_id))
        .unwrap_or_else(|| format!("question-{index}"));

    let question_text = [
        normalized.get("questionText"),
        normalized.get("title"),
        normalized.get("prompt"),
    ]
    .into_iter()
    .flatten()
    .find_map(Value::as_str)
    .unwrap_or_default()
    .to_string();

    let question_type = normalized
        .get("questionType")
        .and_then(Value::as_str)
        .map(QuestionType::parse)
        .unwrap_or(QuestionType::Unknown);

    let options = normalize_options(normalized.get("options").unwrap_or(&Value::Null));

    let correct_answer = normalized
        .get("correctAnswer")
        .and_then(Value::as_str)
        .map(|value| value.to_string());

    let points = normalized.get("points").and_then(Value::as_f64);
    let explanation = normalized
        .get("explanation")
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string());

    Question { id, question_type, question_text, options, correct_answer, points, explanation }
}

/// Option lists are persisted either as a JSON array or as a JSON-encoded
/// string, and the correctness flag goes by three different names. Shapes that
/// cannot be read collapse to an empty list, never an error.
pub(crate) fn normalize_options(raw: &Value) -> Vec<QuestionOption> {
    let parsed;
    let items = match raw {
        Value::Array(items) => items,
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(decoded)) => {
                parsed = decoded;
                &parsed
            }
            _ => {
                tracing::warn!("Question options were a string but not valid JSON");
                return Vec::new();
            }
        },
        _ => return Vec::new(),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => {
                let fallback = fields
                    .get("value")
                    .and_then(value_to_id)
                    .map(|value| format!("option-{value}"))
                    .unwrap_or_else(|| format!("option-{index}"));
                let id = fields.get("id").and_then(value_to_id);
                let label = fields.get("label").and_then(value_to_id);
                let text = fields
                    .get("text")
                    .or_else(|| fields.get("value"))
                    .map(render_text)
                    .unwrap_or_default();
                let is_correct = fields
                    .get("isCorrect")
                    .or_else(|| fields.get("correct"))
                    .or_else(|| fields.get("is_correct"))
                    .map(truthy)
                    .unwrap_or(false);

                QuestionOption {
                    id: id.clone().or_else(|| label.clone()).unwrap_or_else(|| fallback.clone()),
                    label: label.or(id).unwrap_or(fallback),
                    text,
                    is_correct,
                }
            }
            other => QuestionOption {
                id: format!("option-{index}"),
                label: format!("option-{index}"),
                text: render_text(other),
                is_correct: false,
            },
        })
        .collect()
}

fn render_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
