//! Tests, questions and the attempt state machine.

pub mod model;
pub mod session;
pub mod stats;

pub use model::{ContentError, Question, Test, TestSummary};
pub use session::{AnswerRecord, Attempt, QuizResult, Session, SessionError, SessionState};
pub use stats::TestStats;
