use serde::Serialize;
use serde_json::Value;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::backend::ContentBackend;
use crate::core::config::Settings;
use crate::core::time::primitive_now_utc;
use crate::schemas::attempt::{AnswerValue, AttemptRecord};
use crate::schemas::exam::{Exam, Question};
use crate::schemas::result::ResultRecord;
use crate::scoring::{self, ScoreOutcome};
use crate::services::assembler::{self, SubmissionInput};
use crate::session::answers::AnswerStore;
use crate::session::timer::{Countdown, TickOutcome};
use crate::session::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Active,
    Submitting,
    Submitted,
    Failed,
}

/// How `finish` was invoked. A manual finish must pass `Confirmed`, which the
/// caller may only construct after the student confirmed; expiry bypasses the
/// confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishTrigger {
    Confirmed,
    AutoExpiry,
}

/// Everything the presentation layer receives on submit success.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub result: ResultRecord,
    pub attempt: AttemptRecord,
    pub score: ScoreOutcome,
    pub exam: Exam,
}

/// One student's run through one exam. Owns the answer store, the countdown
/// and the navigation cursor; dropped when the student leaves without
/// submitting. Never shared between runs, so a retake cannot alias state.
#[derive(Debug)]
pub struct ExamSession {
    id: String,
    student_id: String,
    exam: Exam,
    requested_exam_id: Option<String>,
    answers: AnswerStore,
    timer: Countdown,
    current_index: usize,
    phase: SessionPhase,
    last_error: Option<String>,
    started_at: PrimitiveDateTime,
    settings: Settings,
}

impl ExamSession {
    /// Fetch the exam and enter the active state. Fetch failures and an empty
    /// question sequence are both load failures: the session never starts.
    pub async fn load<B>(
        backend: &B,
        exam_id: &str,
        student_id: &str,
        settings: &Settings,
    ) -> Result<Self, SessionError>
    where
        B: ContentBackend + ?Sized,
    {
        let raw = backend.fetch_exam(exam_id).await.map_err(SessionError::ExamUnavailable)?;
        Self::new(Exam::from_value(&raw), Some(exam_id.to_string()), student_id, settings)
    }

    /// Start from an already fetched exam payload (the browse screen hands
    /// the exam over instead of re-fetching it).
    pub fn open(raw: &Value, student_id: &str, settings: &Settings) -> Result<Self, SessionError> {
        Self::new(Exam::from_value(raw), None, student_id, settings)
    }

    fn new(
        exam: Exam,
        requested_exam_id: Option<String>,
        student_id: &str,
        settings: &Settings,
    ) -> Result<Self, SessionError> {
        if exam.questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }

        let timer = match exam.duration_seconds() {
            Some(duration) => Countdown::start(duration, settings.timer().warning_threshold_seconds),
            None => Countdown::idle(),
        };

        let session = Self {
            id: Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            exam,
            requested_exam_id,
            answers: AnswerStore::new(),
            timer,
            current_index: 0,
            phase: SessionPhase::Active,
            last_error: None,
            started_at: primitive_now_utc(),
            settings: settings.clone(),
        };

        tracing::info!(
            session_id = %session.id,
            student_id = %session.student_id,
            questions = session.exam.questions.len(),
            timed = session.timer.remaining_seconds().is_some(),
            "Exam session opened"
        );

        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn remaining_seconds(&self) -> Option<u64> {
        self.timer.remaining_seconds()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.exam.questions[self.current_index]
    }

    /// Record a response for a question; whether the value toggles inside a
    /// selection set follows from the question's derived multi-select flag.
    /// Ignored outside the active phase: answers are frozen once submission
    /// starts.
    pub fn record_answer(&mut self, question_id: &str, value: impl Into<String>) {
        if self.phase != SessionPhase::Active {
            return;
        }

        let multi_select = self
            .exam
            .questions
            .iter()
            .find(|question| question.id == question_id)
            .map(Question::is_multi_select)
            .unwrap_or(false);
        self.answers.set_answer(question_id, value, multi_select);
    }

    /// Put back an answer captured earlier in this run.
    pub fn restore_answer(&mut self, question_id: &str, value: AnswerValue) {
        if self.phase != SessionPhase::Active {
            return;
        }
        self.answers.restore(question_id, value);
    }

    pub fn clear_answer(&mut self, question_id: &str) {
        if self.phase != SessionPhase::Active {
            return;
        }
        self.answers.clear(question_id);
    }

    pub fn toggle_review(&mut self, question_id: &str) {
        if self.phase != SessionPhase::Active {
            return;
        }
        self.answers.toggle_review(question_id);
    }

    /// Move to the previous question. Navigation never wraps; at the first
    /// question this is a no-op. Returns whether the cursor moved.
    pub fn previous(&mut self) -> bool {
        if self.phase != SessionPhase::Active || self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        true
    }

    pub fn next(&mut self) -> bool {
        if self.phase != SessionPhase::Active
            || self.current_index + 1 >= self.exam.questions.len()
        {
            return false;
        }
        self.current_index += 1;
        true
    }

    pub fn jump_to(&mut self, index: usize) -> bool {
        if self.phase != SessionPhase::Active || index >= self.exam.questions.len() {
            return false;
        }
        self.current_index = index;
        true
    }

    /// Advance the countdown by one second. Returns `Expired` exactly once,
    /// at which point the caller must drive `finish(FinishTrigger::AutoExpiry)`.
    /// Once the session has left the active phase, ticks (including an
    /// in-flight expiry) are ignored.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != SessionPhase::Active {
            return TickOutcome::Inactive;
        }
        self.timer.tick()
    }

    /// Score the collected answers and persist the attempt and result
    /// records. Idempotent: while submitting or once submitted, further calls
    /// are no-ops returning `Ok(None)`. After a persistence failure the
    /// session is `Failed` and `finish` may be invoked again.
    pub async fn finish<B>(
        &mut self,
        backend: &B,
        trigger: FinishTrigger,
    ) -> Result<Option<SubmitOutcome>, SessionError>
    where
        B: ContentBackend + ?Sized,
    {
        match self.phase {
            SessionPhase::Submitting | SessionPhase::Submitted => return Ok(None),
            SessionPhase::Active | SessionPhase::Failed => {}
        }

        self.phase = SessionPhase::Submitting;
        self.last_error = None;

        let outcome = scoring::score(&self.exam.questions, &self.answers);
        let passing_score = self
            .exam
            .passing_score
            .unwrap_or(self.settings.grading().default_passing_score);
        let time_taken = self.exam.duration_seconds().map(|duration| {
            let remaining = self.timer.remaining_seconds().unwrap_or(0) as i64;
            (duration - remaining).max(0)
        });

        let input = SubmissionInput {
            exam: &self.exam,
            requested_exam_id: self.requested_exam_id.as_deref(),
            student_id: &self.student_id,
            outcome: &outcome,
            started_at: self.started_at,
            time_taken,
            passing_score,
        };

        match assembler::persist_submission(backend, input).await {
            Ok(submit) => {
                self.phase = SessionPhase::Submitted;
                self.timer.cancel();
                tracing::info!(
                    session_id = %self.id,
                    result_id = submit.result.id.as_deref().unwrap_or(""),
                    auto = trigger == FinishTrigger::AutoExpiry,
                    percentage = submit.score.percentage,
                    "Exam submitted"
                );
                Ok(Some(submit))
            }
            Err(err) => {
                self.phase = SessionPhase::Failed;
                self.last_error = Some(err.to_string());
                tracing::error!(
                    session_id = %self.id,
                    auto = trigger == FinishTrigger::AutoExpiry,
                    error = %err,
                    "Exam submission failed"
                );
                Err(err)
            }
        }
    }

    /// Abandon the run: stop the countdown and discard in-progress state.
    /// Nothing is handed to the backend.
    pub fn exit(&mut self) {
        self.timer.cancel();
        tracing::info!(session_id = %self.id, "Exam session exited without submission");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::InMemoryBackend;
    use crate::test_support::{
        choice_question_value, exam_value, option_value, true_false_question_value,
    };

    fn settings() -> Settings {
        Settings::default()
    }

    fn five_question_exam() -> Value {
        exam_value(
            "exam-1",
            "Unit exam",
            Some(1.0),
            vec![
                true_false_question_value("q1", "One", "true"),
                true_false_question_value("q2", "Two", "true"),
                true_false_question_value("q3", "Three", "false"),
                true_false_question_value("q4", "Four", "false"),
                true_false_question_value("q5", "Five", "true"),
            ],
        )
    }

    #[tokio::test]
    async fn load_failure_when_exam_has_no_questions() {
        let backend = InMemoryBackend::new();
        backend.insert_exam("empty", exam_value("empty", "Empty", None, vec![])).await;

        let err = ExamSession::load(&backend, "empty", "student-1", &settings())
            .await
            .expect_err("must not activate");
        assert!(matches!(err, SessionError::NoQuestions));
    }

    #[tokio::test]
    async fn load_failure_when_exam_is_missing() {
        let backend = InMemoryBackend::new();
        let err = ExamSession::load(&backend, "ghost", "student-1", &settings())
            .await
            .expect_err("must not activate");
        assert!(matches!(err, SessionError::ExamUnavailable(_)));
    }

    #[tokio::test]
    async fn navigation_clamps_at_both_ends() {
        let backend = InMemoryBackend::new();
        backend.insert_exam("exam-1", five_question_exam()).await;
        let mut session =
            ExamSession::load(&backend, "exam-1", "student-1", &settings()).await.unwrap();

        assert!(!session.previous());
        assert!(session.next());
        assert!(session.jump_to(4));
        assert!(!session.next());
        assert!(!session.jump_to(5));
        assert_eq!(session.current_index(), 4);
        assert_eq!(session.current_question().id, "q5");
    }

    #[tokio::test]
    async fn finish_twice_produces_one_attempt_and_one_result() {
        let backend = InMemoryBackend::new();
        backend.insert_exam("exam-1", five_question_exam()).await;
        let mut session =
            ExamSession::load(&backend, "exam-1", "student-1", &settings()).await.unwrap();
        session.record_answer("q1", "true");

        let first = session.finish(&backend, FinishTrigger::Confirmed).await.unwrap();
        assert!(first.is_some());
        assert_eq!(session.phase(), SessionPhase::Submitted);

        let second = session.finish(&backend, FinishTrigger::Confirmed).await.unwrap();
        assert!(second.is_none());

        assert_eq!(backend.attempt_count().await, 1);
        assert_eq!(backend.result_count().await, 1);
    }

    #[tokio::test]
    async fn timer_expiry_forces_exactly_one_submission() {
        let backend = InMemoryBackend::new();
        backend.insert_exam("exam-1", five_question_exam()).await;
        let mut session =
            ExamSession::load(&backend, "exam-1", "student-1", &settings()).await.unwrap();
        session.record_answer("q1", "true");
        session.record_answer("q2", "true");

        let mut expiries = 0;
        for _ in 0..120 {
            if session.tick() == TickOutcome::Expired {
                expiries += 1;
                let submit = session
                    .finish(&backend, FinishTrigger::AutoExpiry)
                    .await
                    .unwrap()
                    .expect("forced submission");
                assert_eq!(submit.score.unanswered, 3);
                assert_eq!(submit.score.correct, 2);
            }
        }

        assert_eq!(expiries, 1);
        assert_eq!(backend.attempt_count().await, 1);
        assert_eq!(backend.result_count().await, 1);
        assert_eq!(session.phase(), SessionPhase::Submitted);
    }

    #[tokio::test]
    async fn answers_freeze_once_submission_starts() {
        let backend = InMemoryBackend::new();
        backend.insert_exam("exam-1", five_question_exam()).await;
        let mut session =
            ExamSession::load(&backend, "exam-1", "student-1", &settings()).await.unwrap();
        session.record_answer("q1", "true");
        session.finish(&backend, FinishTrigger::Confirmed).await.unwrap();

        session.record_answer("q2", "true");
        session.clear_answer("q1");
        assert!(session.answers().is_answered("q1"));
        assert!(!session.answers().is_answered("q2"));
        assert!(!session.next());
    }

    #[tokio::test]
    async fn persistence_failure_is_retryable() {
        let backend = InMemoryBackend::new();
        backend.insert_exam("exam-1", five_question_exam()).await;
        backend.fail_next_result_create();
        let mut session =
            ExamSession::load(&backend, "exam-1", "student-1", &settings()).await.unwrap();
        session.record_answer("q1", "true");

        let err = session
            .finish(&backend, FinishTrigger::Confirmed)
            .await
            .expect_err("result creation rejected");
        assert!(matches!(err, SessionError::Persistence(_)));
        assert_eq!(session.phase(), SessionPhase::Failed);
        assert!(session.last_error().is_some());

        let retried = session.finish(&backend, FinishTrigger::Confirmed).await.unwrap();
        assert!(retried.is_some());
        assert_eq!(session.phase(), SessionPhase::Submitted);
        assert_eq!(backend.result_count().await, 1);
    }

    #[tokio::test]
    async fn missing_student_id_fails_fast_without_persisting() {
        let backend = InMemoryBackend::new();
        backend.insert_exam("exam-1", five_question_exam()).await;
        let mut session = ExamSession::load(&backend, "exam-1", "", &settings()).await.unwrap();

        let err = session
            .finish(&backend, FinishTrigger::Confirmed)
            .await
            .expect_err("student id unresolved");
        assert!(matches!(err, SessionError::MissingIdentifier("student")));
        assert_eq!(backend.attempt_count().await, 0);
        assert_eq!(backend.result_count().await, 0);
    }

    #[tokio::test]
    async fn multi_select_answers_toggle_through_the_session() {
        let backend = InMemoryBackend::new();
        let exam = exam_value(
            "exam-2",
            "Multi",
            None,
            vec![choice_question_value(
                "q1",
                "Pick two",
                vec![
                    option_value("a", "first", true),
                    option_value("b", "second", false),
                    option_value("c", "third", true),
                ],
            )],
        );
        backend.insert_exam("exam-2", exam).await;
        let mut session =
            ExamSession::load(&backend, "exam-2", "student-1", &settings()).await.unwrap();

        session.record_answer("q1", "a");
        session.record_answer("q1", "c");
        let submit = session.finish(&backend, FinishTrigger::Confirmed).await.unwrap().unwrap();
        assert_eq!(submit.score.correct, 1);
        assert_eq!(submit.score.percentage, 100.0);
        assert!(submit.result.passed.unwrap_or(false));
    }

    #[tokio::test]
    async fn untimed_exam_reports_no_time_taken() {
        let backend = InMemoryBackend::new();
        let exam =
            exam_value("exam-3", "Untimed", None, vec![true_false_question_value("q1", "One", "true")]);
        backend.insert_exam("exam-3", exam).await;
        let mut session =
            ExamSession::load(&backend, "exam-3", "student-1", &settings()).await.unwrap();

        assert_eq!(session.tick(), TickOutcome::Inactive);
        let submit = session.finish(&backend, FinishTrigger::Confirmed).await.unwrap().unwrap();
        assert_eq!(submit.attempt.time_taken, None);
    }
}
