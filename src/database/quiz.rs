//! Row shapes for the Postgres tables and their conversion into domain types.

use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use crate::quiz::{AnswerRecord, Attempt, Question, QuizResult, Test, TestSummary};

use super::connection::StoreError;

#[derive(Debug, FromRow)]
pub(crate) struct TestRecord {
    pub uuid: Uuid,
    pub title: String,
    pub description: String,
    pub passing_score: i16,
    pub is_active: bool,
}

#[derive(Debug, FromRow)]
pub(crate) struct QuestionRecord {
    pub uuid: Uuid,
    pub text: String,
    pub options: Vec<String>,
    pub correct_option: i16,
    pub explanation: Option<String>,
}

#[derive(Debug, FromRow)]
pub(crate) struct TestSummaryRecord {
    pub uuid: Uuid,
    pub title: String,
    pub description: String,
    pub passing_score: i16,
    pub question_count: i64,
}

#[derive(Debug, FromRow)]
pub(crate) struct ResultRecord {
    pub score: i32,
    pub max_score: i32,
    pub percentage: f64,
    pub passing_score: i16,
    pub passed: bool,
}

#[derive(Debug, FromRow)]
pub(crate) struct AttemptRecord {
    pub uuid: Uuid,
    pub user_id: i64,
    pub test_id: Uuid,
    pub test_title: String,
    pub score: i32,
    pub max_score: i32,
    pub percentage: f64,
    pub passing_score: i16,
    pub passed: bool,
    pub answers: Json<Vec<AnswerRecord>>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

pub(crate) fn narrow<T: TryFrom<S>, S: Copy + std::fmt::Display>(value: S, column: &str) -> Result<T, StoreError> {
    T::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} = {value}")))
}

impl TestRecord {
    pub fn into_test(self, questions: Vec<Question>) -> Result<Test, StoreError> {
        Ok(Test::retrieve(
            self.uuid,
            self.title,
            self.description,
            questions,
            narrow(self.passing_score, "passing_score")?,
            self.is_active,
        )?)
    }
}

impl QuestionRecord {
    pub fn into_question(self) -> Result<Question, StoreError> {
        Ok(Question::retrieve(
            self.uuid,
            self.text,
            self.options,
            narrow(self.correct_option, "correct_option")?,
            self.explanation,
        )?)
    }
}

impl TestSummaryRecord {
    pub fn into_summary(self) -> Result<TestSummary, StoreError> {
        Ok(TestSummary {
            uuid: self.uuid,
            title: self.title,
            description: self.description,
            question_count: narrow(self.question_count, "question_count")?,
            passing_score: narrow(self.passing_score, "passing_score")?,
        })
    }
}

impl ResultRecord {
    pub fn into_result(self) -> Result<QuizResult, StoreError> {
        Ok(QuizResult {
            score: narrow(self.score, "score")?,
            max_score: narrow(self.max_score, "max_score")?,
            percentage: self.percentage,
            passing_score: narrow(self.passing_score, "passing_score")?,
            passed: self.passed,
        })
    }
}

impl AttemptRecord {
    pub fn into_attempt(self) -> Result<Attempt, StoreError> {
        let result = ResultRecord {
            score: self.score,
            max_score: self.max_score,
            percentage: self.percentage,
            passing_score: self.passing_score,
            passed: self.passed,
        }
        .into_result()?;

        Ok(Attempt {
            uuid: self.uuid,
            user_id: self.user_id,
            test_id: self.test_id,
            test_title: self.test_title,
            result,
            answers: self.answers.0,
            started_at: self.started_at,
            completed_at: self.completed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_correct_option_is_corrupt() {
        let record = QuestionRecord {
            uuid: Uuid::new_v4(),
            text: "Where are figs stored?".into(),
            options: vec!["Fridge".into(), "Shelf".into()],
            correct_option: -1,
            explanation: None,
        };

        assert!(matches!(
            record.into_question(),
            Err(StoreError::Corrupt(column)) if column == "correct_option = -1"
        ));
    }

    #[test]
    fn out_of_range_correct_option_is_a_content_error() {
        let record = QuestionRecord {
            uuid: Uuid::new_v4(),
            text: "Where are figs stored?".into(),
            options: vec!["Fridge".into(), "Shelf".into()],
            correct_option: 2,
            explanation: None,
        };

        assert!(matches!(record.into_question(), Err(StoreError::Content(_))));
    }

    #[test]
    fn oversized_count_is_corrupt_not_clamped() {
        let err = narrow::<i32, usize>(usize::MAX, "score").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(column) if column.starts_with("score = ")));
        assert_eq!(narrow::<i32, usize>(7, "score").unwrap(), 7);
    }
}
