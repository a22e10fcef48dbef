use kanji_core::model::{
    DisplayMode, ExampleEntry, KanjiRecord, KanjiStatus, QuizType, QuizTypeFilter, ReadingField,
};
use async_trait::async_trait;
use services::{AppServices, QuizError, QuizPhase, SheetSource};
use storage::repository::{
    BlobStore, CorpusRepository, InMemoryStore, PreferencesRepository, Storage, StorageError,
    StoreKey,
};

fn record(kanji: &str, status: KanjiStatus) -> KanjiRecord {
    KanjiRecord {
        kanji: kanji.into(),
        hanviet: vec!["HV".into()],
        kun: vec!["くん".into()],
        on: vec!["オン".into()],
        example: vec![ExampleEntry::new("例", None)],
        status,
    }
}

async fn seeded_services() -> AppServices {
    let services = AppServices::in_memory(SheetSource::default());
    let corpus = vec![
        record("一", KanjiStatus::Existing),
        record("二", KanjiStatus::Updated),
        record("三", KanjiStatus::New),
        record("四", KanjiStatus::New),
    ];
    services.storage().corpus.replace_corpus(&corpus).await.unwrap();
    services
        .storage()
        .blobs
        .set(
            StoreKey::DailyPlan,
            r#"[{"kanji": [{"kanji": "二"}]}, {"kanji": [{"kanji": "三"}, {"kanji": "四"}]}]"#,
        )
        .await
        .unwrap();
    services
        .storage()
        .blobs
        .set(StoreKey::DailyProgress, r#"{"day1": [0], "day2": [0]}"#)
        .await
        .unwrap();
    services
}

#[tokio::test]
async fn session_sees_learned_set_from_progress() {
    let services = seeded_services().await;
    let session = services.quiz_loop().open_session().await.unwrap();
    assert_eq!(session.learned(), ["二".to_owned()]);

    let counts = session.counts();
    assert_eq!((counts.learned, counts.total, counts.matching), (1, 4, 4));
}

#[tokio::test]
async fn loosely_shaped_progress_still_opens_a_session() {
    let services = seeded_services().await;
    let blobs = &services.storage().blobs;
    blobs
        .set(
            StoreKey::DailyPlan,
            r#"[{"kanji": [{"kanji": "二"}, "stray"]}, "not a day"]"#,
        )
        .await
        .unwrap();
    blobs
        .set(StoreKey::DailyProgress, r#"{"day1": ["0", "1"], "day2": "done"}"#)
        .await
        .unwrap();

    let mut session = services.quiz_loop().open_session().await.unwrap();
    assert_eq!(session.learned(), ["二".to_owned()]);
    assert!(session.start().is_ok());
}

#[tokio::test]
async fn history_walk_matches_navigation() {
    let services = seeded_services().await;
    let mut session = services.quiz_loop().open_session().await.unwrap();
    session.set_mode(DisplayMode::Order);

    session.start().unwrap();
    let first_next = session.next().unwrap().kanji.clone();
    session.next().unwrap();
    session.next().unwrap();
    session.previous().unwrap();
    assert_eq!(session.previous().unwrap().kanji, first_next);
}

#[tokio::test]
async fn learned_filter_only_selects_completed_plan_kanji() {
    let services = seeded_services().await;
    let mut session = services.quiz_loop().open_session().await.unwrap();
    session.set_types(QuizTypeFilter::only(&[QuizType::Learned]));
    session.set_mode(DisplayMode::Order);

    assert_eq!(session.start().unwrap().kanji, "二");
    assert_eq!(session.next().unwrap().kanji, "二");
    assert_eq!(session.history_len(), 1);
}

#[tokio::test]
async fn empty_selection_leaves_session_configuring() {
    let services = seeded_services().await;
    let mut session = services.quiz_loop().open_session().await.unwrap();
    session.set_types(QuizTypeFilter::none());

    assert!(!session.setup_view().can_start());
    assert!(matches!(session.start(), Err(QuizError::EmptySelection)));
    assert_eq!(session.phase(), QuizPhase::Configuring);
}

#[tokio::test]
async fn marks_and_preferences_persist_across_sessions() {
    let services = seeded_services().await;
    let quiz_loop = services.quiz_loop();

    let mut session = quiz_loop.open_session().await.unwrap();
    session.set_mode(DisplayMode::Order);
    session.start().unwrap();
    assert!(quiz_loop.toggle_mark(&mut session).await.unwrap());
    quiz_loop
        .set_skip(&mut session, ReadingField::Hanviet, true)
        .await
        .unwrap();
    assert!(
        quiz_loop
            .set_romaji(&mut session, ReadingField::Kun, true)
            .await
            .unwrap()
    );
    assert!(
        !quiz_loop
            .set_romaji(&mut session, ReadingField::Hanviet, true)
            .await
            .unwrap()
    );

    let reopened = quiz_loop.open_session().await.unwrap();
    assert!(reopened.marked().contains("一"));
    assert!(reopened.skip_fields().hanviet);
    assert!(reopened.romaji_mode().kun);

    let mut marked_only = reopened;
    marked_only.set_types(QuizTypeFilter::only(&[QuizType::Marked]));
    assert_eq!(marked_only.start().unwrap().kanji, "一");
}

#[tokio::test]
async fn marks_can_be_toggled_without_a_quiz() {
    let services = seeded_services().await;
    let quiz_loop = services.quiz_loop();

    assert!(quiz_loop.toggle_marked_word("三").await.unwrap());
    assert!(quiz_loop.toggle_marked_word("四").await.unwrap());
    assert!(!quiz_loop.toggle_marked_word("三").await.unwrap());

    let marked = services.storage().preferences.marked_words().await.unwrap();
    assert_eq!(marked.iter().collect::<Vec<_>>(), vec!["四"]);
}

#[tokio::test]
async fn seeded_random_sessions_are_reproducible() {
    let services = seeded_services().await;
    let quiz_loop = services.quiz_loop().as_ref().clone().with_seed(99);

    let mut draws = Vec::new();
    for _ in 0..2 {
        let mut session = quiz_loop.open_session().await.unwrap();
        let mut seen = vec![session.start().unwrap().kanji.clone()];
        for _ in 0..10 {
            seen.push(session.next().unwrap().kanji.clone());
        }
        draws.push(seen);
    }
    assert_eq!(draws[0], draws[1]);
}

#[derive(Clone, Default)]
struct FrozenStore {
    inner: InMemoryStore,
}

#[async_trait]
impl BlobStore for FrozenStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, _key: StoreKey, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("read-only".into()))
    }
}

#[tokio::test]
async fn failed_mark_write_leaves_session_unmarked() {
    let inner = InMemoryStore::default();
    inner
        .replace_corpus(&[record("一", KanjiStatus::New)])
        .await
        .unwrap();
    let services = AppServices::from_storage(
        Storage::from_store(FrozenStore { inner }),
        SheetSource::default(),
    );
    let quiz_loop = services.quiz_loop();
    let mut session = quiz_loop.open_session().await.unwrap();
    session.start().unwrap();

    let err = quiz_loop.toggle_mark(&mut session).await.unwrap_err();
    assert!(matches!(err, QuizError::Storage(StorageError::Connection(_))));
    assert!(!session.is_current_marked());
    assert!(session.marked().is_empty());
}
