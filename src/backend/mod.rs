//! Abstract contracts for the content-management backend the core talks to.
//!
//! The core never sees wire formats or transport; implementations adapt
//! whatever REST or storage layer actually holds exams, attempts and results.

pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::schemas::attempt::{AttemptRecord, NewAttemptRecord};
use crate::schemas::result::{NewResultRecord, ResultRecord};

/// Source and sink for exams, attempts and results.
///
/// `fetch_exam` returns the raw payload because backends wrap entities and
/// relations in different container shapes; normalization is the core's job.
/// Created records echo back with the backend-assigned identifier.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    async fn fetch_exam(&self, exam_id: &str) -> anyhow::Result<Value>;

    async fn create_attempt(&self, record: &NewAttemptRecord) -> anyhow::Result<AttemptRecord>;

    async fn fetch_attempt(&self, attempt_id: &str) -> anyhow::Result<AttemptRecord>;

    async fn create_result(&self, record: &NewResultRecord) -> anyhow::Result<ResultRecord>;

    async fn fetch_result(&self, result_id: &str) -> anyhow::Result<ResultRecord>;
}
