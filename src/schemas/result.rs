use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::schemas::deserialize_id;

/// Result payload sent to the backend once the attempt id is known. The
/// `exam_attempt` field keeps its historical snake_case wire name; course and
/// subject are omitted entirely when they could not be resolved.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewResultRecord {
    pub result_type: String,
    #[validate(range(min = 0.0, message = "score must be non-negative"))]
    pub score: f64,
    #[validate(range(min = 0.0, message = "maxScore must be non-negative"))]
    pub max_score: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "percentage must be within 0..=100"))]
    pub percentage: f64,
    pub grade: String,
    #[validate(range(min = 0.0, max = 4.0, message = "gpa must be within 0..=4"))]
    pub gpa: f64,
    pub passed: bool,
    pub is_published: bool,
    pub student: String,
    pub exam: String,
    #[serde(rename = "exam_attempt")]
    pub exam_attempt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// Result record as returned by the backend; authoritative for the grade
/// presentation. Relation fields keep their raw payload shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub result_type: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub gpa: Option<f64>,
    #[serde(default)]
    pub passed: Option<bool>,
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub student: Value,
    #[serde(default)]
    pub exam: Value,
    #[serde(default, rename = "exam_attempt")]
    pub exam_attempt: Value,
    #[serde(default)]
    pub course: Value,
    #[serde(default)]
    pub subject: Value,
}
