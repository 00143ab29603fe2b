use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::quiz::{Attempt, Test, TestStats, TestSummary};

use super::connection::{ContentStore, ResultStore, StoreError};

/// Store kept in process memory, for tests and local runs without Postgres.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tests: Arc<Mutex<Vec<Test>>>,
    attempts: Arc<Mutex<Vec<Attempt>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test, replacing one with the same id.
    pub fn upsert_test(&self, test: Test) -> Result<(), StoreError> {
        let mut guard = self
            .tests
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        match guard.iter_mut().find(|t| t.uuid() == test.uuid()) {
            Some(existing) => *existing = test,
            None => guard.push(test),
        }
        Ok(())
    }
}

impl ContentStore for InMemoryStore {
    async fn get_test(&self, id: Uuid) -> Result<Test, StoreError> {
        let guard = self
            .tests
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        guard
            .iter()
            .find(|t| *t.uuid() == id && t.is_active())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_active_tests(&self) -> Result<Vec<TestSummary>, StoreError> {
        let guard = self
            .tests
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let mut summaries: Vec<TestSummary> = guard
            .iter()
            .filter(|t| t.is_active() && !t.questions().is_empty())
            .map(Test::summary)
            .collect();
        summaries.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(summaries)
    }
}

impl ResultStore for InMemoryStore {
    async fn save_attempt(&self, attempt: &Attempt) -> Result<(), StoreError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        guard.push(attempt.clone());
        Ok(())
    }

    async fn user_attempts(&self, user_id: i64, limit: usize) -> Result<Vec<Attempt>, StoreError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let mut found: Vec<Attempt> = guard
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        found.truncate(limit);
        Ok(found)
    }

    async fn test_stats(&self, test_id: Uuid) -> Result<TestStats, StoreError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(TestStats::from_results(
            guard
                .iter()
                .filter(|a| a.test_id == test_id)
                .map(|a| &a.result),
        ))
    }
}
