//! One user's attempt at one test.
//!
//! A [`Session`] only exists once a test has been started, so the
//! `NotStarted` state is the absence of a session. From there it is
//! `InProgress` until the last question is answered and `Completed` after
//! that. A completed session never accepts answers again; starting over means
//! building a new session.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::model::{Question, Test};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("test has no questions")]
    EmptyTest,

    #[error("option {selected} is not one of the {options} options")]
    InvalidAnswer { selected: usize, options: usize },

    #[error("no question at index {index}, test has {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("session is not completed yet")]
    NotCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    InProgress,
    Completed,
}

/// A recorded answer. Correctness is decided when it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: Uuid,
    pub question_index: usize,
    pub selected_option: usize,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizResult {
    pub score: usize,
    pub max_score: usize,
    pub percentage: f64,
    pub passing_score: u8,
    pub passed: bool,
}

/// A completed session as it is archived for a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub uuid: Uuid,
    pub user_id: i64,
    pub test_id: Uuid,
    pub test_title: String,
    pub result: QuizResult,
    pub answers: Vec<AnswerRecord>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Session {
    test: Arc<Test>,
    current_idx: usize,
    answers: Vec<AnswerRecord>,
    correct: usize,
    completed: bool,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn start(test: Arc<Test>) -> Result<Self, SessionError> {
        Self::start_at(test, Utc::now())
    }

    pub fn start_at(test: Arc<Test>, started_at: DateTime<Utc>) -> Result<Self, SessionError> {
        if test.questions().is_empty() {
            return Err(SessionError::EmptyTest);
        }

        Ok(Self {
            answers: Vec::with_capacity(test.questions().len()),
            test,
            current_idx: 0,
            correct: 0,
            completed: false,
            started_at,
            completed_at: None,
        })
    }

    pub fn test(&self) -> &Test {
        &self.test
    }

    pub fn test_id(&self) -> &Uuid {
        self.test.uuid()
    }

    pub fn current_idx(&self) -> usize {
        self.current_idx
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn correct_count(&self) -> usize {
        self.correct
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn state(&self) -> SessionState {
        if self.completed {
            SessionState::Completed
        } else {
            SessionState::InProgress
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn current_question(&self) -> Result<&Question, SessionError> {
        let len = self.test.questions().len();
        if self.completed {
            return Err(SessionError::OutOfRange {
                index: self.current_idx,
                len,
            });
        }

        self.test
            .questions()
            .get(self.current_idx)
            .ok_or(SessionError::OutOfRange {
                index: self.current_idx,
                len,
            })
    }

    pub fn submit_answer(&mut self, selected: usize) -> Result<&AnswerRecord, SessionError> {
        self.submit_answer_at(selected, Utc::now())
    }

    /// Record the answer to the current question and move on.
    ///
    /// Nothing changes when the session is already completed or `selected` is
    /// not a valid option index.
    pub fn submit_answer_at(
        &mut self,
        selected: usize,
        now: DateTime<Utc>,
    ) -> Result<&AnswerRecord, SessionError> {
        let question = self.current_question()?;
        let options = question.options().len();
        if selected >= options {
            return Err(SessionError::InvalidAnswer { selected, options });
        }

        let record = AnswerRecord {
            question_id: *question.uuid(),
            question_index: self.current_idx,
            selected_option: selected,
            is_correct: selected == question.correct_option(),
        };

        if record.is_correct {
            self.correct += 1;
        }
        self.answers.push(record);
        self.current_idx += 1;

        if self.current_idx == self.test.questions().len() {
            self.completed = true;
            self.completed_at = Some(now);
        }

        Ok(&self.answers[self.answers.len() - 1])
    }

    pub fn compute_result(&self) -> Result<QuizResult, SessionError> {
        if !self.completed {
            return Err(SessionError::NotCompleted);
        }

        let score = self.answers.iter().filter(|a| a.is_correct).count();
        let max_score = self.test.questions().len();
        let percentage = score as f64 * 100.0 / max_score as f64;
        let passing_score = self.test.passing_score();

        Ok(QuizResult {
            score,
            max_score,
            percentage,
            passing_score,
            passed: percentage >= f64::from(passing_score),
        })
    }
}

impl Attempt {
    pub fn from_session(user_id: i64, session: &Session) -> Result<Self, SessionError> {
        let result = session.compute_result()?;
        let completed_at = session.completed_at().ok_or(SessionError::NotCompleted)?;

        Ok(Self {
            uuid: Uuid::new_v4(),
            user_id,
            test_id: *session.test_id(),
            test_title: session.test().title().to_owned(),
            result,
            answers: session.answers().to_vec(),
            started_at: session.started_at(),
            completed_at,
        })
    }
}
