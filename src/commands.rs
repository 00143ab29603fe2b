use std::sync::Arc;

use teloxide::{prelude::*, utils::command::BotCommands};
use tracing::instrument;

use crate::{
    config::Config, database::ResultStore, keyboard::action_keyboard, render, sessions::SessionStore,
    state::QuizState, HandlerResult, UserDialogue,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "start the bot.")]
    Start,
    #[command(description = "stop the current test.")]
    Cancel,
    #[command(description = "show your latest results.")]
    Results,
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, sessions))]
pub(crate) async fn cancel(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    sessions: Arc<SessionStore>,
) -> HandlerResult {
    let dropped = sessions.abandon_user(msg.chat.id.0);
    tracing::info!("Chat {} cancelled, dropped {} sessions", msg.chat.id, dropped);
    bot.send_message(msg.chat.id, "Cancelling dialogue")
        .reply_markup(action_keyboard())
        .await?;
    dialogue.update(QuizState::Start).await?;
    Ok(())
}

pub(crate) async fn start(bot: Bot, msg: Message, dialogue: UserDialogue) -> HandlerResult {
    bot.send_message(msg.chat.id, "Please choose what to do:")
        .reply_markup(action_keyboard())
        .await?;
    dialogue.update(QuizState::Start).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, store, config))]
pub(crate) async fn results<Store: ResultStore>(
    bot: Bot,
    msg: Message,
    store: Arc<Store>,
    config: Arc<Config>,
) -> HandlerResult {
    let attempts = store
        .user_attempts(msg.chat.id.0, config.results_history_limit)
        .await?;
    bot.send_message(msg.chat.id, render::history(&attempts))
        .parse_mode(teloxide::types::ParseMode::Html)
        .await?;
    Ok(())
}
