use uuid::Uuid;

/// Where a chat is in the bot dialogue. The attempt itself lives in the
/// session store; the dialogue only remembers which test it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QuizState {
    #[default]
    Start,
    Selection,
    ReadyToRun {
        test_id: Uuid,
    },
    Running {
        test_id: Uuid,
    },
}
