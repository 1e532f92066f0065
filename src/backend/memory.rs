use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::backend::ContentBackend;
use crate::schemas::attempt::{AttemptRecord, NewAttemptRecord};
use crate::schemas::result::{NewResultRecord, ResultRecord};

/// In-memory [`ContentBackend`] used by the test suites and by embedders that
/// need a self-contained store. Ids are minted as uuids; created records are
/// echoed back the way a real backend would echo them. Single failures can be
/// injected to exercise the retry paths.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
    fail_next_attempt: AtomicBool,
    fail_next_result: AtomicBool,
}

#[derive(Default)]
struct State {
    exams: HashMap<String, Value>,
    attempts: HashMap<String, AttemptRecord>,
    results: HashMap<String, ResultRecord>,
    result_payloads: Vec<Value>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_exam(&self, exam_id: &str, exam: Value) {
        self.state.lock().await.exams.insert(exam_id.to_string(), exam);
    }

    pub async fn remove_exam(&self, exam_id: &str) {
        self.state.lock().await.exams.remove(exam_id);
    }

    /// Seed a pre-existing attempt record, e.g. one written by another system.
    pub async fn insert_attempt(&self, attempt: Value) {
        let record: AttemptRecord =
            serde_json::from_value(attempt).expect("attempt fixture must deserialize");
        let id = record.id.clone().expect("attempt fixture must carry an id");
        self.state.lock().await.attempts.insert(id, record);
    }

    pub async fn insert_result(&self, result: Value) {
        let record: ResultRecord =
            serde_json::from_value(result).expect("result fixture must deserialize");
        let id = record.id.clone().expect("result fixture must carry an id");
        self.state.lock().await.results.insert(id, record);
    }

    /// Reject the next attempt creation with an error, once.
    pub fn fail_next_attempt_create(&self) {
        self.fail_next_attempt.store(true, Ordering::SeqCst);
    }

    /// Reject the next result creation with an error, once.
    pub fn fail_next_result_create(&self) {
        self.fail_next_result.store(true, Ordering::SeqCst);
    }

    pub async fn attempt_count(&self) -> usize {
        self.state.lock().await.attempts.len()
    }

    pub async fn result_count(&self) -> usize {
        self.state.lock().await.results.len()
    }

    /// The raw payload of the most recently created result, exactly as it was
    /// handed to the backend.
    pub async fn last_result_payload(&self) -> Option<Value> {
        self.state.lock().await.result_payloads.last().cloned()
    }
}

#[async_trait]
impl ContentBackend for InMemoryBackend {
    async fn fetch_exam(&self, exam_id: &str) -> anyhow::Result<Value> {
        self.state
            .lock()
            .await
            .exams
            .get(exam_id)
            .cloned()
            .ok_or_else(|| anyhow!("exam {exam_id} not found"))
    }

    async fn create_attempt(&self, record: &NewAttemptRecord) -> anyhow::Result<AttemptRecord> {
        if self.fail_next_attempt.swap(false, Ordering::SeqCst) {
            bail!("attempt creation rejected");
        }

        let id = Uuid::new_v4().to_string();
        let mut echoed = serde_json::to_value(record).context("serialize attempt")?;
        echoed["id"] = json!(id.clone());
        let attempt: AttemptRecord =
            serde_json::from_value(echoed).context("echo attempt record")?;

        self.state.lock().await.attempts.insert(id, attempt.clone());
        Ok(attempt)
    }

    async fn fetch_attempt(&self, attempt_id: &str) -> anyhow::Result<AttemptRecord> {
        self.state
            .lock()
            .await
            .attempts
            .get(attempt_id)
            .cloned()
            .ok_or_else(|| anyhow!("attempt {attempt_id} not found"))
    }

    async fn create_result(&self, record: &NewResultRecord) -> anyhow::Result<ResultRecord> {
        if self.fail_next_result.swap(false, Ordering::SeqCst) {
            bail!("result creation rejected");
        }

        let id = Uuid::new_v4().to_string();
        let payload = serde_json::to_value(record).context("serialize result")?;
        let mut echoed = payload.clone();
        echoed["id"] = json!(id.clone());
        let result: ResultRecord = serde_json::from_value(echoed).context("echo result record")?;

        let mut state = self.state.lock().await;
        state.result_payloads.push(payload);
        state.results.insert(id, result.clone());
        Ok(result)
    }

    async fn fetch_result(&self, result_id: &str) -> anyhow::Result<ResultRecord> {
        self.state
            .lock()
            .await
            .results
            .get(result_id)
            .cloned()
            .ok_or_else(|| anyhow!("result {result_id} not found"))
    }
}
