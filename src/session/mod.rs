pub mod answers;
pub mod controller;
pub mod timer;

pub use answers::AnswerStore;
pub use controller::{ExamSession, FinishTrigger, SessionPhase, SubmitOutcome};
pub use timer::{Countdown, TickOutcome, TimerState};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The exam could not be fetched at all; the session never becomes active.
    #[error("failed to load exam")]
    ExamUnavailable(#[source] anyhow::Error),
    /// An exam without questions cannot be scored; terminal until the exam is
    /// fixed upstream.
    #[error("exam has no questions")]
    NoQuestions,
    /// Submission assembly could not resolve a required identifier.
    #[error("missing {0} identifier")]
    MissingIdentifier(&'static str),
    #[error("invalid submission payload: {0}")]
    InvalidPayload(String),
    /// Attempt or result creation was rejected by the backend; the student
    /// may invoke finish again.
    #[error("failed to persist submission")]
    Persistence(#[source] anyhow::Error),
}
