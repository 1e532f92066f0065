use anyhow::Context;
use serde_json::Value;

use crate::backend::ContentBackend;
use crate::schemas::attempt::AttemptRecord;
use crate::schemas::exam::Exam;
use crate::schemas::result::ResultRecord;
use crate::services::reconciler::{reconcile, ReconcileFallback, ReconciledReview};
use crate::services::relations::extract_relation_id;

/// Everything the result screen needs, assembled from a stored result id.
#[derive(Debug, Clone)]
pub struct ReviewBundle {
    pub result: ResultRecord,
    pub attempt: Option<AttemptRecord>,
    pub exam: Option<Exam>,
    pub review: ReconciledReview,
}

/// Rebuild the full per-question review for a persisted result.
///
/// The result record is fetched first, then the attempt it references, then
/// the exam snapshot when neither relation already carries the questions.
/// Result and attempt fetch failures propagate; a failed exam fetch only
/// costs the snapshot enrichment and the review degrades per the reconciler
/// rules.
pub async fn load_review<B>(backend: &B, result_id: &str) -> anyhow::Result<ReviewBundle>
where
    B: ContentBackend + ?Sized,
{
    let result =
        backend.fetch_result(result_id).await.context("Failed to fetch exam result")?;

    let mut attempt = None;
    if let Some(attempt_id) = extract_relation_id(&result.exam_attempt) {
        let record = backend
            .fetch_attempt(&attempt_id)
            .await
            .context("Failed to fetch exam attempt")?;
        attempt = Some(record);
    }

    let mut exam = exam_from_relation(&result.exam)
        .or_else(|| attempt.as_ref().and_then(|record| exam_from_relation(&record.exam)));

    if exam.as_ref().map(|exam| exam.questions.is_empty()).unwrap_or(true) {
        let candidate = exam
            .as_ref()
            .and_then(|exam| exam.document_id.clone().or_else(|| exam.id.clone()))
            .or_else(|| extract_relation_id(&result.exam))
            .or_else(|| attempt.as_ref().and_then(|record| extract_relation_id(&record.exam)));

        if let Some(exam_id) = candidate {
            match backend.fetch_exam(&exam_id).await {
                Ok(raw) => {
                    let fetched = Exam::from_value(&raw);
                    if !fetched.questions.is_empty() || exam.is_none() {
                        exam = Some(fetched);
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        exam_id = %exam_id,
                        error = %err,
                        "Exam snapshot unavailable; review will be built without it"
                    );
                }
            }
        }
    }

    let fallback = ReconcileFallback { score: result.score, percentage: result.percentage };
    let review = reconcile(None, exam.as_ref(), attempt.as_ref(), fallback);

    tracing::debug!(
        result_id = %result_id,
        rows = review.rows.len(),
        with_snapshot = exam.is_some(),
        with_attempt = attempt.is_some(),
        "Review reconciled"
    );

    Ok(ReviewBundle { result, attempt, exam, review })
}

/// The result record's explicit flag wins; otherwise the pass mark is
/// recomputed from the exam's threshold, defaulting when the exam does not
/// carry one.
pub fn resolve_passed(
    result: &ResultRecord,
    exam: Option<&Exam>,
    review: &ReconciledReview,
    default_threshold: f64,
) -> bool {
    if let Some(passed) = result.passed {
        return passed;
    }

    let threshold =
        exam.and_then(|exam| exam.passing_score).unwrap_or(default_threshold);
    review.percentage >= threshold
}

fn exam_from_relation(value: &Value) -> Option<Exam> {
    match value {
        Value::Object(_) => Some(Exam::from_value(value)),
        _ => None,
    }
}
