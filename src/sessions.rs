//! Running sessions, keyed by user and test.
//!
//! Each session sits behind its own async mutex so that answers for the same
//! user and test are applied one at a time. Sessions nobody touched for longer
//! than the configured TTL are dropped by [`SessionStore::expire_idle`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::quiz::{AnswerRecord, Attempt, Question, Session, SessionError, Test};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user: i64,
    pub test: Uuid,
}

impl SessionKey {
    pub fn new(user: i64, test: Uuid) -> Self {
        Self { user, test }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("no running session")]
    NoSession,

    #[error("question {got} is not the current one ({expected})")]
    Stale { expected: usize, got: usize },

    #[error(transparent)]
    Engine(#[from] SessionError),
}

/// The question a user has to answer next.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub question: Question,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Next(QuestionView),
    /// The last answer closed the session; it is already out of the store.
    Completed(Attempt),
}

/// The recorded answer, the question it answered, and what comes next.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub answer: AnswerRecord,
    pub question: Question,
    pub progress: Progress,
}

struct Entry {
    session: Session,
    touched: Instant,
}

type Handle = Arc<tokio::sync::Mutex<Entry>>;

pub struct SessionStore {
    sessions: Mutex<HashMap<SessionKey, Handle>>,
    ttl: Duration,
}

fn view(session: &Session) -> Result<QuestionView, SessionError> {
    Ok(QuestionView {
        index: session.current_idx(),
        total: session.test().questions().len(),
        question: session.current_question()?.clone(),
    })
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn map(&self) -> MutexGuard<'_, HashMap<SessionKey, Handle>> {
        // A panic while holding the map lock cannot leave a half-written entry.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn handle(&self, key: &SessionKey) -> Result<Handle, SessionStoreError> {
        self.map()
            .get(key)
            .cloned()
            .ok_or(SessionStoreError::NoSession)
    }

    fn is_current(&self, key: &SessionKey, handle: &Handle) -> bool {
        self.map()
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, handle))
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    /// Start a fresh attempt, replacing any session for the same user and test.
    pub fn start(&self, user: i64, test: Arc<Test>) -> Result<QuestionView, SessionStoreError> {
        let key = SessionKey::new(user, *test.uuid());
        let session = Session::start(test)?;
        let first = view(&session)?;

        let entry = Entry {
            session,
            touched: Instant::now(),
        };
        if self
            .map()
            .insert(key, Arc::new(tokio::sync::Mutex::new(entry)))
            .is_some()
        {
            tracing::debug!("User {} restarted test {}", user, key.test);
        }

        Ok(first)
    }

    pub async fn current(&self, key: &SessionKey) -> Result<QuestionView, SessionStoreError> {
        let handle = self.handle(key)?;
        let entry = handle.lock().await;
        Ok(view(&entry.session)?)
    }

    /// Answer question `question_index` with option `selected`.
    ///
    /// `question_index` must be the session's current index, which turns
    /// repeated taps on an already answered question into [`SessionStoreError::Stale`].
    /// The answer that completes the session also archives it: the entry is
    /// removed while its lock is still held and the [`Attempt`] is returned.
    pub async fn submit(
        &self,
        key: &SessionKey,
        question_index: usize,
        selected: usize,
    ) -> Result<SubmitOutcome, SessionStoreError> {
        let handle = self.handle(key)?;
        let mut entry = handle.lock().await;
        if !self.is_current(key, &handle) {
            return Err(SessionStoreError::NoSession);
        }

        let expected = entry.session.current_idx();
        if entry.session.is_completed() || question_index != expected {
            return Err(SessionStoreError::Stale {
                expected,
                got: question_index,
            });
        }

        let question = entry.session.current_question()?.clone();
        let answer = entry.session.submit_answer(selected)?.clone();
        entry.touched = Instant::now();

        let progress = if entry.session.is_completed() {
            let attempt = Attempt::from_session(key.user, &entry.session)?;
            let mut map = self.map();
            if map.get(key).is_some_and(|current| Arc::ptr_eq(current, &handle)) {
                map.remove(key);
            }
            Progress::Completed(attempt)
        } else {
            Progress::Next(view(&entry.session)?)
        };

        Ok(SubmitOutcome {
            answer,
            question,
            progress,
        })
    }

    pub fn abandon(&self, key: &SessionKey) -> bool {
        self.map().remove(key).is_some()
    }

    /// Drop every session of `user`, returning how many there were.
    pub fn abandon_user(&self, user: i64) -> usize {
        let mut map = self.map();
        let before = map.len();
        map.retain(|key, _| key.user != user);
        before - map.len()
    }

    /// Drop sessions idle for longer than the TTL. Sessions locked by an
    /// in-flight answer are kept.
    pub fn expire_idle(&self, now: Instant) -> usize {
        let mut map = self.map();
        let before = map.len();
        map.retain(|key, handle| match handle.try_lock() {
            Ok(entry) => {
                let keep = now.saturating_duration_since(entry.touched) <= self.ttl;
                if !keep {
                    tracing::info!("Session of user {} for test {} expired", key.user, key.test);
                }
                keep
            }
            Err(_) => true,
        });
        before - map.len()
    }

    pub fn spawn_expiry(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let expired = self.expire_idle(Instant::now());
                if expired > 0 {
                    tracing::debug!("Expired {} idle sessions", expired);
                }
            }
        })
    }
}
