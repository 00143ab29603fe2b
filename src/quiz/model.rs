use thiserror::Error;
use uuid::Uuid;

/// Authoring mistakes caught when a test or question is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("question needs at least 2 options, got {0}")]
    TooFewOptions(usize),

    #[error("correct option {correct} is out of range for {options} options")]
    CorrectOptionOutOfRange { correct: usize, options: usize },

    #[error("passing score {0} is above 100")]
    PassingScoreOutOfRange(u8),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    uuid: Uuid,
    title: String,
    description: String,
    questions: Vec<Question>,
    passing_score: u8,
    is_active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    uuid: Uuid,
    text: String,
    options: Vec<String>,
    correct_option: usize,
    explanation: Option<String>,
}

/// Listing view of an active test, without its questions.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSummary {
    pub uuid: Uuid,
    pub title: String,
    pub description: String,
    pub question_count: usize,
    pub passing_score: u8,
}

impl Test {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        questions: Vec<Question>,
        passing_score: u8,
    ) -> Result<Self, ContentError> {
        Self::retrieve(
            Uuid::new_v4(),
            title.into(),
            description.into(),
            questions,
            passing_score,
            true,
        )
    }

    /// Rebuild a test from stored fields, re-checking the passing score.
    pub fn retrieve(
        uuid: Uuid,
        title: String,
        description: String,
        questions: Vec<Question>,
        passing_score: u8,
        is_active: bool,
    ) -> Result<Self, ContentError> {
        if passing_score > 100 {
            return Err(ContentError::PassingScoreOutOfRange(passing_score));
        }

        Ok(Self {
            uuid,
            title,
            description,
            questions,
            passing_score,
            is_active,
        })
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn passing_score(&self) -> u8 {
        self.passing_score
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }

    pub fn summary(&self) -> TestSummary {
        TestSummary {
            uuid: self.uuid,
            title: self.title.clone(),
            description: self.description.clone(),
            question_count: self.questions.len(),
            passing_score: self.passing_score,
        }
    }
}

impl Question {
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
        explanation: Option<String>,
    ) -> Result<Self, ContentError> {
        Self::retrieve(
            Uuid::new_v4(),
            text.into(),
            options,
            correct_option,
            explanation,
        )
    }

    pub fn retrieve(
        uuid: Uuid,
        text: String,
        options: Vec<String>,
        correct_option: usize,
        explanation: Option<String>,
    ) -> Result<Self, ContentError> {
        if options.len() < 2 {
            return Err(ContentError::TooFewOptions(options.len()));
        }
        if correct_option >= options.len() {
            return Err(ContentError::CorrectOptionOutOfRange {
                correct: correct_option,
                options: options.len(),
            });
        }

        Ok(Self {
            uuid,
            text,
            options,
            correct_option,
            explanation,
        })
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}
