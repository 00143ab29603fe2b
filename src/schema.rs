use std::{error::Error, sync::Arc};

use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        DpHandlerDescription, UpdateHandler,
    },
    prelude::*,
};
use tracing::instrument;

use crate::{
    commands::{self, Command},
    config::Config,
    database::{ContentStore, ResultStore},
    keyboard::{action_keyboard, CallbackData, MY_RESULTS, TAKE_TEST},
    runner,
    state::QuizState,
    HandlerResult, UserDialogue,
};

type BotHandler = Handler<'static, DependencyMap, Result<(), Box<dyn Error + Send + Sync + 'static>>, DpHandlerDescription>;

/// Dispatch tree for a bot backed by `Store`.
pub fn schema<Store>() -> UpdateHandler<Box<dyn Error + Send + Sync + 'static>>
where
    Store: ContentStore + ResultStore + 'static,
{
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(commands::help))
        .branch(case![Command::Start].endpoint(commands::start))
        .branch(case![Command::Cancel].endpoint(commands::cancel))
        .branch(case![Command::Results].endpoint(commands::results::<Store>));

    let handler = Update::filter_message()
        .branch(command_handler)
        .branch(case![QuizState::Start].endpoint(choose_what_to_do::<Store>))
        .branch(running_scheme::<Store>())
        .endpoint(invalid_state);

    dialogue::enter::<Update, InMemStorage<QuizState>, QuizState, _>()
        .branch(handler)
        .branch(callback_query_scheme::<Store>())
}

async fn choose_what_to_do<Store: ContentStore + ResultStore>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    store: Arc<Store>,
    config: Arc<Config>,
) -> HandlerResult {
    let text = msg.text().map(str::to_owned);
    match text.as_deref() {
        Some(TAKE_TEST) => {
            tracing::info!("Chat {} chooses to take a test.", msg.chat.id);
            runner::list_tests(bot, dialogue, msg, store).await?;
        }
        Some(MY_RESULTS) => {
            commands::results(bot, msg, store, config).await?;
        }
        other => {
            tracing::info!("Invalid message {:?} from chat {}", other, msg.chat.id);
            bot.send_message(msg.chat.id, "Invalid input. Please try again.")
                .reply_markup(action_keyboard())
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "debug")]
fn running_scheme<Store>() -> BotHandler
where
    Store: ContentStore + ResultStore + 'static,
{
    use dptree::case;
    tracing::debug!("Building dispatching tree for runner");
    Update::filter_message()
        .branch(case![QuizState::ReadyToRun { test_id }].endpoint(runner::running_ready::<Store>))
}

#[instrument(level = "debug")]
fn callback_query_scheme<Store>() -> BotHandler
where
    Store: ContentStore + ResultStore + 'static,
{
    use dptree::case;
    tracing::debug!("Building dispatching tree for callback query");
    Update::filter_callback_query()
        .branch(case![QuizState::Selection].endpoint(runner::select_test::<Store>))
        .branch(case![QuizState::Running { test_id }].endpoint(runner::take_answer::<Store>))
        .endpoint(outdated_button)
}

/// Toast for a button pressed outside the state it was made for.
fn outdated_button_text(data: Option<&str>) -> &'static str {
    match data.and_then(CallbackData::parse) {
        Some(CallbackData::Answer { .. }) => "This test is already over.",
        Some(CallbackData::Select { .. }) => "Please pick a test from the latest list.",
        None => "This button is no longer active.",
    }
}

#[instrument(level = "info", skip(bot))]
async fn outdated_button(bot: Bot, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(&q.id)
        .text(outdated_button_text(q.data.as_deref()))
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot))]
async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    tracing::info!("Chat {}: invalid input '{:?}'", msg.chat.id, msg.text());
    bot.send_message(
        msg.chat.id,
        "Unable to handle the message. Enter /help to see usages.",
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn outdated_buttons_get_a_toast() {
        let answer = CallbackData::Answer {
            test_id: Uuid::new_v4(),
            question: 2,
            option: 1,
        }
        .to_string();
        let select = CallbackData::Select {
            test_id: Uuid::new_v4(),
        }
        .to_string();

        assert_eq!(outdated_button_text(Some(&answer)), "This test is already over.");
        assert_eq!(
            outdated_button_text(Some(&select)),
            "Please pick a test from the latest list."
        );
        assert_eq!(outdated_button_text(Some("junk")), "This button is no longer active.");
        assert_eq!(outdated_button_text(None), "This button is no longer active.");
    }
}
