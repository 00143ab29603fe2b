use state::QuizState;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::Dialogue};

pub mod commands;
pub mod config;
pub mod database;
pub mod keyboard;
pub mod logging;
pub mod quiz;
pub mod render;
pub mod runner;
pub mod schema;
pub mod sessions;
pub mod state;

type UserDialogue = Dialogue<QuizState, InMemStorage<QuizState>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;
