use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::GetChatId,
    prelude::*,
    types::{ParseMode, ReplyMarkup},
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    database::{ContentStore, ResultStore, StoreError},
    keyboard::{action_keyboard, answers_keyboard, tests_keyboard, yes_no_keyboard, CallbackData},
    quiz::SessionError,
    render,
    sessions::{Progress, SessionKey, SessionStore, SessionStoreError, SubmitOutcome},
    state::QuizState,
    HandlerResult, UserDialogue,
};

#[instrument(level = "info", skip(bot, dialogue, store))]
pub(crate) async fn list_tests<Store: ContentStore>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    store: Arc<Store>,
) -> HandlerResult {
    let tests = store.list_active_tests().await?;
    if tests.is_empty() {
        bot.send_message(msg.chat.id, "No available tests yet.")
            .await?;
        return Ok(());
    }

    tracing::info!("Chat {} lists {} tests", msg.chat.id, tests.len());
    bot.send_message(msg.chat.id, render::tests_list(&tests))
        .parse_mode(ParseMode::Html)
        .reply_markup(tests_keyboard(&tests))
        .await?;
    dialogue.update(QuizState::Selection).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, store))]
pub(crate) async fn select_test<Store: ContentStore + ResultStore>(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    store: Arc<Store>,
) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;
    let Some(chat_id) = q.chat_id() else {
        return Ok(());
    };
    let Some(CallbackData::Select { test_id }) = q.data.as_deref().and_then(CallbackData::parse)
    else {
        tracing::warn!("Chat {}: unexpected callback {:?}", chat_id, q.data);
        return Ok(());
    };

    let test = match store.get_test(test_id).await {
        Ok(test) => test,
        Err(StoreError::NotFound) => {
            tracing::info!("Chat {} selected missing test {}", chat_id, test_id);
            bot.send_message(chat_id, "Test not found.").await?;
            return Ok(());
        }
        Err(e) => {
            tracing::error!("Database error: {:?}", e);
            return Err(e.into());
        }
    };
    let stats = store.test_stats(test_id).await?;

    tracing::info!("Chat {} selected '{}'", chat_id, test.title());
    bot.send_message(chat_id, render::test_card(&test.summary(), &stats))
        .parse_mode(ParseMode::Html)
        .reply_markup(yes_no_keyboard())
        .await?;
    dialogue.update(QuizState::ReadyToRun { test_id }).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, store, sessions))]
pub(crate) async fn running_ready<Store: ContentStore>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    test_id: Uuid,
    store: Arc<Store>,
    sessions: Arc<SessionStore>,
) -> HandlerResult {
    match msg.text() {
        Some("Yes") | Some("Yes✔️") => {
            let test = match store.get_test(test_id).await {
                Ok(test) => Arc::new(test),
                Err(StoreError::NotFound) => {
                    bot.send_message(msg.chat.id, "Sorry, this test is no longer available.")
                        .reply_markup(action_keyboard())
                        .await?;
                    dialogue.update(QuizState::Start).await?;
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            let first = match sessions.start(msg.chat.id.0, test) {
                Ok(first) => first,
                Err(SessionStoreError::Engine(SessionError::EmptyTest)) => {
                    bot.send_message(msg.chat.id, "Sorry, no questions for that test available.")
                        .reply_markup(action_keyboard())
                        .await?;
                    dialogue.update(QuizState::Start).await?;
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            tracing::info!("Chat {} starts test {}", msg.chat.id, test_id);
            bot.send_message(msg.chat.id, "Let's begin!")
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            bot.send_message(msg.chat.id, render::question(&first))
                .parse_mode(ParseMode::Html)
                .reply_markup(answers_keyboard(test_id, &first))
                .await?;
            dialogue.update(QuizState::Running { test_id }).await?;
        }
        Some("No") | Some("No❌") => {
            tracing::info!("Chat {} declines test {}", msg.chat.id, test_id);
            bot.send_message(msg.chat.id, "OK. What do you want to do now?")
                .reply_markup(action_keyboard())
                .await?;
            dialogue.update(QuizState::Start).await?;
        }
        _ => {
            bot.send_message(
                msg.chat.id,
                "Please, enter a valid answer <b>Yes</b> or <b>No</b>.",
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
    }

    Ok(())
}

/// Submit an answer and, when it completes the test, archive the attempt.
///
/// Runs before any Telegram call so a failed edit or send cannot lose the attempt.
pub(crate) async fn record_answer<Store: ResultStore>(
    sessions: &SessionStore,
    store: &Store,
    key: &SessionKey,
    question: usize,
    option: usize,
) -> Result<SubmitOutcome, SessionStoreError> {
    let outcome = sessions.submit(key, question, option).await?;
    if let Progress::Completed(attempt) = &outcome.progress {
        if let Err(e) = store.save_attempt(attempt).await {
            tracing::error!("Failed to save attempt {}: {:?}", attempt.uuid, e);
        }
    }
    Ok(outcome)
}

#[instrument(level = "info", skip(bot, dialogue, store, sessions))]
pub(crate) async fn take_answer<Store: ResultStore>(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    test_id: Uuid,
    store: Arc<Store>,
    sessions: Arc<SessionStore>,
) -> HandlerResult {
    let Some(chat_id) = q.chat_id() else {
        bot.answer_callback_query(&q.id).await?;
        return Ok(());
    };
    let (question, option) = match q.data.as_deref().and_then(CallbackData::parse) {
        Some(CallbackData::Answer {
            test_id: answered,
            question,
            option,
        }) if answered == test_id => (question, option),
        _ => {
            bot.answer_callback_query(&q.id)
                .text("This button belongs to another test.")
                .await?;
            return Ok(());
        }
    };

    let key = SessionKey::new(chat_id.0, test_id);
    let outcome = match record_answer(&sessions, &*store, &key, question, option).await {
        Ok(outcome) => outcome,
        Err(SessionStoreError::Stale { .. }) => {
            bot.answer_callback_query(&q.id)
                .text("This question has already been answered.")
                .await?;
            return Ok(());
        }
        Err(SessionStoreError::NoSession) => {
            bot.answer_callback_query(&q.id).await?;
            bot.send_message(chat_id, "The test session has expired. Please start again.")
                .reply_markup(action_keyboard())
                .await?;
            dialogue.update(QuizState::Start).await?;
            return Ok(());
        }
        Err(SessionStoreError::Engine(e)) => {
            tracing::warn!("Chat {}: rejected answer: {}", chat_id, e);
            bot.answer_callback_query(&q.id)
                .text("Please choose one of the offered answers.")
                .await?;
            return Ok(());
        }
    };

    tracing::info!(
        "Chat {} answers option {} to question #{} of test {}. Correctness: {}",
        chat_id,
        option,
        question + 1,
        test_id,
        outcome.answer.is_correct
    );

    if let Err(e) = bot.answer_callback_query(&q.id).await {
        tracing::warn!("Chat {}: failed to answer callback: {}", chat_id, e);
    }
    if let Some(message) = &q.message {
        if let Err(e) = bot
            .edit_message_text(
                chat_id,
                message.id(),
                render::feedback(question, &outcome.question, &outcome.answer),
            )
            .parse_mode(ParseMode::Html)
            .await
        {
            tracing::warn!("Chat {}: failed to show feedback: {}", chat_id, e);
        }
    }

    match outcome.progress {
        Progress::Next(next) => {
            bot.send_message(chat_id, render::question(&next))
                .parse_mode(ParseMode::Html)
                .reply_markup(answers_keyboard(test_id, &next))
                .await?;
        }
        Progress::Completed(attempt) => {
            let result = &attempt.result;
            tracing::info!(
                "Chat {} completed '{}' with result {:.1}%, passed: {}",
                chat_id,
                attempt.test_title,
                result.percentage,
                result.passed
            );
            dialogue.update(QuizState::Start).await?;
            bot.send_message(chat_id, render::result(&attempt.test_title, result))
                .parse_mode(ParseMode::Html)
                .reply_markup(action_keyboard())
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::database::InMemoryStore;
    use crate::quiz::{Question, Test};

    fn two_questions() -> Test {
        let questions = ["Where are limes kept?", "Where is rocket sold?"]
            .into_iter()
            .map(|text| Question::new(text, vec!["Fridge".into(), "Shelf".into()], 0, None).unwrap())
            .collect();
        Test::new("Greens", "", questions, 50).unwrap()
    }

    #[tokio::test]
    async fn last_answer_is_archived_before_replying() {
        let store = InMemoryStore::new();
        let sessions = SessionStore::new(Duration::from_secs(60));
        let test = Arc::new(two_questions());
        let key = SessionKey::new(4, *test.uuid());
        sessions.start(4, test).unwrap();

        record_answer(&sessions, &store, &key, 0, 0).await.unwrap();
        assert!(store.user_attempts(4, 10).await.unwrap().is_empty());

        let outcome = record_answer(&sessions, &store, &key, 1, 1).await.unwrap();
        assert!(matches!(outcome.progress, Progress::Completed(_)));

        let saved = store.user_attempts(4, 10).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].result.score, 1);
        assert!(sessions.is_empty());
    }
}
