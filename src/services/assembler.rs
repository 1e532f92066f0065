use serde_json::Value;
use time::PrimitiveDateTime;
use validator::Validate;

use crate::backend::ContentBackend;
use crate::core::time::format_primitive;
use crate::schemas::attempt::{AttemptAnswer, NewAttemptRecord};
use crate::schemas::exam::Exam;
use crate::schemas::result::NewResultRecord;
use crate::scoring::{evaluate_grade, round2, ScoreOutcome};
use crate::services::relations::extract_relation_id;
use crate::session::controller::SubmitOutcome;
use crate::session::SessionError;

pub(crate) struct SubmissionInput<'a> {
    pub exam: &'a Exam,
    pub requested_exam_id: Option<&'a str>,
    pub student_id: &'a str,
    pub outcome: &'a ScoreOutcome,
    pub started_at: PrimitiveDateTime,
    pub time_taken: Option<i64>,
    pub passing_score: f64,
}

/// Build and persist the attempt and result records for a scored session.
///
/// The attempt is created first; the result references the created attempt's
/// id, so the two calls are awaited strictly in order and never issued in
/// parallel. Both required identifiers are resolved up front: a submission
/// that cannot name its exam or student fails before anything is written.
pub(crate) async fn persist_submission<B>(
    backend: &B,
    input: SubmissionInput<'_>,
) -> Result<SubmitOutcome, SessionError>
where
    B: ContentBackend + ?Sized,
{
    let exam_id = input
        .exam
        .document_id
        .clone()
        .or_else(|| input.exam.id.clone())
        .or_else(|| input.requested_exam_id.map(|id| id.to_string()))
        .ok_or(SessionError::MissingIdentifier("exam"))?;

    if input.student_id.trim().is_empty() {
        return Err(SessionError::MissingIdentifier("student"));
    }

    let submitted_at = crate::core::time::primitive_now_utc();
    let outcome = input.outcome;
    let passed = outcome.percentage >= input.passing_score;

    let answers = outcome
        .results
        .iter()
        .map(|row| AttemptAnswer {
            question_id: Some(row.question_id.clone()),
            answer: row.user_answer.clone(),
            is_correct: row.is_correct,
            points: Some(row.points_earned),
            question: None,
            question_type: None,
            correct_answer: None,
            explanation: None,
            options: Value::Null,
        })
        .collect();

    let attempt_payload = NewAttemptRecord {
        exam: exam_id.clone(),
        student: input.student_id.to_string(),
        attempt_number: 1,
        started_at: format_primitive(input.started_at),
        submitted_at: format_primitive(submitted_at),
        status: "submitted".to_string(),
        score: round2(outcome.score),
        percentage: round2(outcome.percentage),
        passed,
        time_taken: input.time_taken,
        answers,
    };
    attempt_payload
        .validate()
        .map_err(|err| SessionError::InvalidPayload(err.to_string()))?;

    let attempt = backend
        .create_attempt(&attempt_payload)
        .await
        .map_err(|err| SessionError::Persistence(err.context("Failed to create exam attempt")))?;
    let attempt_id = attempt
        .id
        .clone()
        .ok_or(SessionError::MissingIdentifier("attempt"))?;

    let grade = evaluate_grade(outcome.percentage);
    let max_score = input.exam.total_points.unwrap_or(outcome.total_points);
    let course = extract_relation_id(&input.exam.course);
    let subject = extract_relation_id(&input.exam.subject);

    let result_payload = NewResultRecord {
        result_type: "exam".to_string(),
        score: round2(outcome.score),
        max_score: round2(max_score),
        percentage: round2(outcome.percentage),
        grade: grade.grade.to_string(),
        gpa: round2(grade.gpa),
        passed,
        is_published: true,
        student: input.student_id.to_string(),
        exam: exam_id.clone(),
        exam_attempt: attempt_id.clone(),
        course,
        subject,
    };
    result_payload
        .validate()
        .map_err(|err| SessionError::InvalidPayload(err.to_string()))?;

    let result = backend
        .create_result(&result_payload)
        .await
        .map_err(|err| SessionError::Persistence(err.context("Failed to create exam result")))?;

    tracing::info!(
        exam_id = %exam_id,
        student_id = %input.student_id,
        attempt_id = %attempt_id,
        result_id = result.id.as_deref().unwrap_or(""),
        score = result_payload.score,
        percentage = result_payload.percentage,
        grade = %result_payload.grade,
        passed,
        "Submission records persisted"
    );

    Ok(SubmitOutcome { result, attempt, score: outcome.clone(), exam: input.exam.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::InMemoryBackend;
    use crate::core::time::primitive_now_utc;
    use crate::schemas::exam::Exam;
    use crate::scoring;
    use crate::session::answers::AnswerStore;
    use crate::test_support::{exam_value, true_false_question_value};
    use serde_json::json;

    fn scored_exam(raw: serde_json::Value) -> (Exam, ScoreOutcome) {
        let exam = Exam::from_value(&raw);
        let mut answers = AnswerStore::new();
        answers.set_answer("q1", "true", false);
        let outcome = scoring::score(&exam.questions, &answers);
        (exam, outcome)
    }

    #[tokio::test]
    async fn result_references_created_attempt_and_relations() {
        let backend = InMemoryBackend::new();
        let mut raw = exam_value(
            "exam-1",
            "With relations",
            Some(30.0),
            vec![true_false_question_value("q1", "One", "true")],
        );
        raw["course"] = json!({"data": {"id": "course-7"}});
        raw["subject"] = json!({"documentId": "subject-9"});
        let (exam, outcome) = scored_exam(raw);

        let input = SubmissionInput {
            exam: &exam,
            requested_exam_id: None,
            student_id: "student-1",
            outcome: &outcome,
            started_at: primitive_now_utc(),
            time_taken: Some(120),
            passing_score: 60.0,
        };

        let submit = persist_submission(&backend, input).await.unwrap();
        let attempt_id = submit.attempt.id.clone().unwrap();
        assert_eq!(
            extract_relation_id(&submit.result.exam_attempt).as_deref(),
            Some(attempt_id.as_str())
        );

        let stored = backend.last_result_payload().await.unwrap();
        assert_eq!(stored["course"], json!("course-7"));
        assert_eq!(stored["subject"], json!("subject-9"));
        assert_eq!(stored["grade"], json!("A+"));
        assert_eq!(stored["gpa"], json!(4.0));
    }

    #[tokio::test]
    async fn unresolvable_relations_are_left_out_of_the_result() {
        let backend = InMemoryBackend::new();
        let raw = exam_value(
            "exam-1",
            "No relations",
            None,
            vec![true_false_question_value("q1", "One", "true")],
        );
        let (exam, outcome) = scored_exam(raw);

        let input = SubmissionInput {
            exam: &exam,
            requested_exam_id: None,
            student_id: "student-1",
            outcome: &outcome,
            started_at: primitive_now_utc(),
            time_taken: None,
            passing_score: 60.0,
        };

        persist_submission(&backend, input).await.unwrap();
        let stored = backend.last_result_payload().await.unwrap();
        assert!(stored.get("course").is_none());
        assert!(stored.get("subject").is_none());
    }

    #[tokio::test]
    async fn missing_exam_id_fails_before_any_write() {
        let backend = InMemoryBackend::new();
        let raw = json!({"title": "No id", "questions": [
            {"id": "q1", "questionType": "true-false", "questionText": "One", "correctAnswer": "true"}
        ]});
        let (exam, outcome) = scored_exam(raw);

        let input = SubmissionInput {
            exam: &exam,
            requested_exam_id: None,
            student_id: "student-1",
            outcome: &outcome,
            started_at: primitive_now_utc(),
            time_taken: None,
            passing_score: 60.0,
        };

        let err = persist_submission(&backend, input).await.expect_err("exam id unresolved");
        assert!(matches!(err, SessionError::MissingIdentifier("exam")));
        assert_eq!(backend.attempt_count().await, 0);
    }

    #[tokio::test]
    async fn requested_exam_id_backfills_a_snapshot_without_ids() {
        let backend = InMemoryBackend::new();
        let raw = json!({"title": "No id", "questions": [
            {"id": "q1", "questionType": "true-false", "questionText": "One", "correctAnswer": "true"}
        ]});
        let (exam, outcome) = scored_exam(raw);

        let input = SubmissionInput {
            exam: &exam,
            requested_exam_id: Some("exam-route-id"),
            student_id: "student-1",
            outcome: &outcome,
            started_at: primitive_now_utc(),
            time_taken: None,
            passing_score: 60.0,
        };

        let submit = persist_submission(&backend, input).await.unwrap();
        assert_eq!(
            extract_relation_id(&submit.attempt.exam).as_deref(),
            Some("exam-route-id")
        );
    }

    #[tokio::test]
    async fn attempt_failure_leaves_no_result_behind() {
        let backend = InMemoryBackend::new();
        backend.fail_next_attempt_create();
        let raw = exam_value(
            "exam-1",
            "Failing",
            None,
            vec![true_false_question_value("q1", "One", "true")],
        );
        let (exam, outcome) = scored_exam(raw);

        let input = SubmissionInput {
            exam: &exam,
            requested_exam_id: None,
            student_id: "student-1",
            outcome: &outcome,
            started_at: primitive_now_utc(),
            time_taken: None,
            passing_score: 60.0,
        };

        let err = persist_submission(&backend, input).await.expect_err("attempt rejected");
        assert!(matches!(err, SessionError::Persistence(_)));
        assert_eq!(backend.attempt_count().await, 0);
        assert_eq!(backend.result_count().await, 0);
    }
}
