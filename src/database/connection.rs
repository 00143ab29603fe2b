use std::future::Future;

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use thiserror::Error;
use uuid::Uuid;

use crate::quiz::{Attempt, ContentError, Test, TestStats, TestSummary};

use super::quiz::{narrow, AttemptRecord, QuestionRecord, ResultRecord, TestRecord, TestSummaryRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("invalid stored content: {0}")]
    Content(#[from] ContentError),

    #[error("corrupt column value: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Source of test definitions.
pub trait ContentStore: Send + Sync {
    /// Fetch an active test with its questions in authoring order.
    fn get_test(&self, id: Uuid) -> impl Future<Output = Result<Test, StoreError>> + Send;

    /// Active tests that have at least one question.
    fn list_active_tests(&self) -> impl Future<Output = Result<Vec<TestSummary>, StoreError>> + Send;
}

/// Archive of completed attempts.
pub trait ResultStore: Send + Sync {
    fn save_attempt(&self, attempt: &Attempt) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Most recent attempts of a user, newest first.
    fn user_attempts(
        &self,
        user_id: i64,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Attempt>, StoreError>> + Send;

    fn test_stats(&self, test_id: Uuid) -> impl Future<Output = Result<TestStats, StoreError>> + Send;
}

pub struct Connection {
    pool: PgPool,
}

impl Connection {
    pub async fn connect(connection_string: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        tracing::debug!("Applying embedded migrations");
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

impl ContentStore for Connection {
    async fn get_test(&self, id: Uuid) -> Result<Test, StoreError> {
        let mut tx = self.pool.begin().await?;

        let test_record = sqlx::query_as::<_, TestRecord>(
            "SELECT uuid, title, description, passing_score, is_active FROM tests WHERE uuid = $1 AND is_active",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        let question_records = sqlx::query_as::<_, QuestionRecord>(
            "SELECT uuid, text, options, correct_option, explanation FROM questions WHERE test_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            "Loaded test '{}' with {} questions",
            test_record.title,
            question_records.len()
        );

        let questions = question_records
            .into_iter()
            .map(QuestionRecord::into_question)
            .collect::<Result<Vec<_>, _>>()?;

        test_record.into_test(questions)
    }

    async fn list_active_tests(&self) -> Result<Vec<TestSummary>, StoreError> {
        let records = sqlx::query_as::<_, TestSummaryRecord>(
            "SELECT t.uuid, t.title, t.description, t.passing_score, COUNT(q.uuid) AS question_count \
             FROM tests t INNER JOIN questions q ON q.test_id = t.uuid \
             WHERE t.is_active \
             GROUP BY t.uuid \
             ORDER BY t.title",
        )
        .fetch_all(&self.pool)
        .await?;

        records
            .into_iter()
            .map(TestSummaryRecord::into_summary)
            .collect()
    }
}

impl ResultStore for Connection {
    async fn save_attempt(&self, attempt: &Attempt) -> Result<(), StoreError> {
        let result = &attempt.result;
        let score: i32 = narrow(result.score, "score")?;
        let max_score: i32 = narrow(result.max_score, "max_score")?;
        sqlx::query(
            "INSERT INTO attempts (uuid, user_id, test_id, test_title, score, max_score, percentage, passing_score, passed, answers, started_at, completed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(attempt.uuid)
        .bind(attempt.user_id)
        .bind(attempt.test_id)
        .bind(&attempt.test_title)
        .bind(score)
        .bind(max_score)
        .bind(result.percentage)
        .bind(i16::from(result.passing_score))
        .bind(result.passed)
        .bind(Json(&attempt.answers))
        .bind(attempt.started_at)
        .bind(attempt.completed_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Saved attempt {} of user {}", attempt.uuid, attempt.user_id);
        Ok(())
    }

    async fn user_attempts(&self, user_id: i64, limit: usize) -> Result<Vec<Attempt>, StoreError> {
        let limit: i64 = narrow(limit, "limit")?;
        let records = sqlx::query_as::<_, AttemptRecord>(
            "SELECT uuid, user_id, test_id, test_title, score, max_score, percentage, passing_score, passed, answers, started_at, completed_at \
             FROM attempts WHERE user_id = $1 ORDER BY completed_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        records.into_iter().map(AttemptRecord::into_attempt).collect()
    }

    async fn test_stats(&self, test_id: Uuid) -> Result<TestStats, StoreError> {
        let records = sqlx::query_as::<_, ResultRecord>(
            "SELECT score, max_score, percentage, passing_score, passed FROM attempts WHERE test_id = $1",
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;

        let results = records
            .into_iter()
            .map(ResultRecord::into_result)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TestStats::from_results(&results))
    }
}
