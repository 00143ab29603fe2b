use std::sync::Arc;
use std::time::Duration;

use trainingquizbot::database::{ContentStore, InMemoryStore, ResultStore, StoreError};
use trainingquizbot::quiz::{Question, Test};
use trainingquizbot::sessions::{Progress, SessionKey, SessionStore, SessionStoreError};
use uuid::Uuid;

/// Five questions about store sections; the right answer is always option 0.
fn sections_test(passing_score: u8) -> Test {
    let questions = [
        "Where is dill displayed?",
        "Where do strawberries go in June?",
        "Where are cashews kept?",
        "Where is the coffee sold?",
        "Where are mangoes displayed?",
    ]
    .into_iter()
    .map(|text| {
        Question::new(
            text,
            vec!["Right section".into(), "Wrong section".into(), "Storage".into()],
            0,
            None,
        )
        .unwrap()
    })
    .collect();

    Test::new("Store sections", "Where everything lives", questions, passing_score).unwrap()
}

async fn take(
    store: &InMemoryStore,
    sessions: &SessionStore,
    user: i64,
    test_id: Uuid,
    picks: &[usize],
) -> trainingquizbot::quiz::Attempt {
    let test = Arc::new(store.get_test(test_id).await.unwrap());
    let key = SessionKey::new(user, test_id);
    sessions.start(user, test).unwrap();

    let mut finished = None;
    for (index, pick) in picks.iter().enumerate() {
        let outcome = sessions.submit(&key, index, *pick).await.unwrap();
        let last = index + 1 == picks.len();
        match outcome.progress {
            Progress::Completed(attempt) => {
                assert!(last);
                finished = Some(attempt);
            }
            Progress::Next(_) => assert!(!last),
        }
    }

    let attempt = finished.unwrap();
    store.save_attempt(&attempt).await.unwrap();
    attempt
}

#[tokio::test]
async fn attempts_are_archived_and_aggregated() {
    let store = InMemoryStore::new();
    let sessions = SessionStore::new(Duration::from_secs(600));
    let test = sections_test(70);
    let test_id = *test.uuid();
    store.upsert_test(test).unwrap();

    let passed = take(&store, &sessions, 10, test_id, &[0, 0, 0, 0, 1]).await;
    assert_eq!(passed.result.score, 4);
    assert_eq!(passed.result.percentage, 80.0);
    assert!(passed.result.passed);

    let failed = take(&store, &sessions, 11, test_id, &[0, 1, 0, 1, 0]).await;
    assert_eq!(failed.result.percentage, 60.0);
    assert!(!failed.result.passed);

    let stats = store.test_stats(test_id).await.unwrap();
    assert_eq!(stats.total_attempts, 2);
    assert_eq!(stats.passing_rate, 50.0);
    assert_eq!(stats.average_percentage, 70.0);

    let history = store.user_attempts(10, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].answers.len(), 5);
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn threshold_tie_passes() {
    let store = InMemoryStore::new();
    let sessions = SessionStore::new(Duration::from_secs(600));
    let test = sections_test(80);
    let test_id = *test.uuid();
    store.upsert_test(test).unwrap();

    let attempt = take(&store, &sessions, 1, test_id, &[0, 0, 2, 0, 0]).await;
    assert_eq!(attempt.result.percentage, 80.0);
    assert!(attempt.result.passed);
}

#[tokio::test]
async fn unknown_test_is_not_found() {
    let store = InMemoryStore::new();
    assert!(matches!(
        store.get_test(Uuid::new_v4()).await,
        Err(StoreError::NotFound)
    ));
}

#[tokio::test]
async fn restarting_replaces_the_running_session() {
    let store = InMemoryStore::new();
    let sessions = SessionStore::new(Duration::from_secs(600));
    let test = sections_test(70);
    let test_id = *test.uuid();
    store.upsert_test(test).unwrap();
    let key = SessionKey::new(5, test_id);

    let test = Arc::new(store.get_test(test_id).await.unwrap());
    sessions.start(5, test.clone()).unwrap();
    sessions.submit(&key, 0, 0).await.unwrap();
    sessions.submit(&key, 1, 0).await.unwrap();

    let first = sessions.start(5, test).unwrap();
    assert_eq!(first.index, 0);
    assert_eq!(sessions.current(&key).await.unwrap().index, 0);
    assert_eq!(sessions.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_taps_record_one_answer() {
    let store = InMemoryStore::new();
    let sessions = Arc::new(SessionStore::new(Duration::from_secs(600)));
    let test = sections_test(70);
    let test_id = *test.uuid();
    store.upsert_test(test).unwrap();
    let key = SessionKey::new(3, test_id);

    sessions
        .start(3, Arc::new(store.get_test(test_id).await.unwrap()))
        .unwrap();

    let taps: Vec<_> = (0..16)
        .map(|i| {
            let sessions = sessions.clone();
            tokio::spawn(async move { sessions.submit(&key, 0, i % 3).await })
        })
        .collect();

    let mut recorded = 0;
    for tap in taps {
        match tap.await.unwrap() {
            Ok(_) => recorded += 1,
            Err(SessionStoreError::Stale { expected, got }) => {
                assert_eq!((expected, got), (1, 0));
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(recorded, 1);
    assert_eq!(sessions.current(&key).await.unwrap().index, 1);
}

#[tokio::test]
async fn abandoned_session_is_gone() {
    let store = InMemoryStore::new();
    let sessions = SessionStore::new(Duration::from_secs(600));
    let test = sections_test(70);
    let test_id = *test.uuid();
    store.upsert_test(test).unwrap();
    let key = SessionKey::new(9, test_id);

    sessions
        .start(9, Arc::new(store.get_test(test_id).await.unwrap()))
        .unwrap();
    assert!(sessions.abandon(&key));

    assert_eq!(
        sessions.submit(&key, 0, 0).await.unwrap_err(),
        SessionStoreError::NoSession
    );
}

#[tokio::test]
async fn editing_a_test_does_not_rescore_a_running_session() {
    let store = InMemoryStore::new();
    let sessions = SessionStore::new(Duration::from_secs(600));
    let original = sections_test(70);
    let test_id = *original.uuid();
    store.upsert_test(original.clone()).unwrap();
    let key = SessionKey::new(12, test_id);

    sessions
        .start(12, Arc::new(store.get_test(test_id).await.unwrap()))
        .unwrap();
    let first = sessions.submit(&key, 0, 0).await.unwrap();
    assert!(first.answer.is_correct);

    let moved: Vec<Question> = original
        .questions()
        .iter()
        .map(|q| {
            Question::retrieve(*q.uuid(), q.text().into(), q.options().to_vec(), 1, None).unwrap()
        })
        .collect();
    let edited = Test::retrieve(
        test_id,
        original.title().into(),
        original.description().into(),
        moved,
        original.passing_score(),
        true,
    )
    .unwrap();
    store.upsert_test(edited).unwrap();
    assert_eq!(store.get_test(test_id).await.unwrap().questions()[1].correct_option(), 1);

    let second = sessions.submit(&key, 1, 0).await.unwrap();
    assert!(second.answer.is_correct);
    assert_eq!(second.question.correct_option(), 0);

    let mut last = None;
    for index in 2..5 {
        last = Some(sessions.submit(&key, index, 0).await.unwrap().progress);
    }
    let Some(Progress::Completed(attempt)) = last else {
        panic!("expected completion");
    };
    assert!(attempt.answers[0].is_correct);
    assert!(attempt.answers[1].is_correct);
    assert_eq!(attempt.result.score, 5);
}
