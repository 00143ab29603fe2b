use std::sync::Arc;

use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use trainingquizbot::config::Config;
use trainingquizbot::database::Connection;
use trainingquizbot::schema::schema;
use trainingquizbot::sessions::SessionStore;
use trainingquizbot::state::QuizState;
use trainingquizbot::{commands::Command, logging};

use teloxide::utils::command::BotCommands;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;
    logging::init(&config)?;

    let connection = Arc::new(
        Connection::connect(&config.database_url, config.database_max_connections).await?,
    );
    connection.run_migrations().await?;

    let sessions = Arc::new(SessionStore::new(config.session_ttl));
    let sweeper = sessions.clone().spawn_expiry(config.session_sweep);

    let bot = Bot::new(&config.teloxide_token);
    bot.set_my_commands(Command::bot_commands()).await?;
    tracing::info!("Starting bot...");

    Dispatcher::builder(bot, schema::<Connection>())
        .dependencies(dptree::deps![
            InMemStorage::<QuizState>::new(),
            connection,
            sessions,
            Arc::new(config)
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    sweeper.abort();
    tracing::info!("Bot stopped");
    Ok(())
}
