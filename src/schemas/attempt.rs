use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::schemas::deserialize_id;
use crate::schemas::exam::QuestionType;

/// A student's response to one question: a single option key, true/false
/// token or free text, or the unordered selection of a multi-select item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    One(String),
    Many(Vec<String>),
}

impl AnswerValue {
    /// An empty set and an empty or whitespace-only string both mean the
    /// question was left unanswered, the same as a missing entry.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::One(text) => text.trim().is_empty(),
            Self::Many(items) => items.is_empty(),
        }
    }
}

pub fn answer_is_blank(answer: Option<&AnswerValue>) -> bool {
    answer.map(AnswerValue::is_blank).unwrap_or(true)
}

/// One row of an attempt's `answers` list. New attempts persist only the
/// first four fields; older records may also carry denormalized question
/// snapshots, which the reconciler uses as a merge source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptAnswer {
    #[serde(default, deserialize_with = "deserialize_id", skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(default)]
    pub answer: Option<AnswerValue>,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
}

impl AttemptAnswer {
    /// The key this row is indexed under during reconciliation. Some backends
    /// store the question reference under `question` instead of `questionId`.
    pub fn lookup_key(&self) -> Option<String> {
        self.question_id.clone().or_else(|| self.question.clone())
    }
}

/// Attempt payload sent to the backend. Field names are the persisted wire
/// names and must not change.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewAttemptRecord {
    pub exam: String,
    pub student: String,
    pub attempt_number: i64,
    pub started_at: String,
    pub submitted_at: String,
    pub status: String,
    #[validate(range(min = 0.0, message = "score must be non-negative"))]
    pub score: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "percentage must be within 0..=100"))]
    pub percentage: f64,
    pub passed: bool,
    pub time_taken: Option<i64>,
    pub answers: Vec<AttemptAnswer>,
}

/// Attempt record as returned by the backend. Relation fields keep their raw
/// payload shape; resolve them through `services::relations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub exam: Value,
    #[serde(default)]
    pub student: Value,
    #[serde(default)]
    pub attempt_number: Option<i64>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub passed: Option<bool>,
    #[serde(default)]
    pub time_taken: Option<i64>,
    #[serde(default)]
    pub answers: Vec<AttemptAnswer>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn answer_blank_classification() {
        assert!(answer_is_blank(None));
        assert!(answer_is_blank(Some(&AnswerValue::One(String::new()))));
        assert!(answer_is_blank(Some(&AnswerValue::One("   ".to_string()))));
        assert!(answer_is_blank(Some(&AnswerValue::Many(Vec::new()))));
        assert!(!answer_is_blank(Some(&AnswerValue::One("b".to_string()))));
        assert!(!answer_is_blank(Some(&AnswerValue::Many(vec!["a".to_string()]))));
    }

    #[test]
    fn answer_value_deserializes_both_shapes() {
        let single: AnswerValue = serde_json::from_value(json!("b")).unwrap();
        assert_eq!(single, AnswerValue::One("b".to_string()));

        let multi: AnswerValue = serde_json::from_value(json!(["a", "c"])).unwrap();
        assert_eq!(multi, AnswerValue::Many(vec!["a".to_string(), "c".to_string()]));
    }

    #[test]
    fn attempt_answer_accepts_numeric_question_id() {
        let answer: AttemptAnswer =
            serde_json::from_value(json!({"questionId": 3, "answer": "b", "isCorrect": true}))
                .unwrap();
        assert_eq!(answer.question_id.as_deref(), Some("3"));
        assert!(answer.is_correct);
    }

    #[test]
    fn attempt_answer_lookup_key_falls_back_to_question_field() {
        let answer: AttemptAnswer =
            serde_json::from_value(json!({"question": "q-9", "answer": null})).unwrap();
        assert_eq!(answer.lookup_key().as_deref(), Some("q-9"));
    }

    #[test]
    fn new_attempt_serializes_wire_field_names() {
        let record = NewAttemptRecord {
            exam: "exam-1".to_string(),
            student: "student-1".to_string(),
            attempt_number: 1,
            started_at: "2025-01-02T10:00:00Z".to_string(),
            submitted_at: "2025-01-02T10:30:00Z".to_string(),
            status: "submitted".to_string(),
            score: 2.0,
            percentage: 66.67,
            passed: true,
            time_taken: Some(1800),
            answers: vec![AttemptAnswer {
                question_id: Some("q1".to_string()),
                answer: Some(AnswerValue::One("b".to_string())),
                is_correct: true,
                points: Some(1.0),
                question: None,
                question_type: None,
                correct_answer: None,
                explanation: None,
                options: Value::Null,
            }],
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["attemptNumber"], json!(1));
        assert_eq!(value["startedAt"], json!("2025-01-02T10:00:00Z"));
        assert_eq!(value["timeTaken"], json!(1800));
        assert_eq!(value["answers"][0]["questionId"], json!("q1"));
        assert_eq!(value["answers"][0]["isCorrect"], json!(true));
        assert!(value["answers"][0].get("correctAnswer").is_none());
    }
}
