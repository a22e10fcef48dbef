use kanji_core::model::{ExampleEntry, KanjiRecord, KanjiStatus, MarkedWords, RomajiMode};
use storage::repository::{
    BlobStore, CorpusRepository, PreferencesRepository, ProgressRepository, Storage, StoreKey,
};
use storage::sqlite::SqliteRepository;

fn record(kanji: &str, kun: &[&str]) -> KanjiRecord {
    KanjiRecord {
        kanji: kanji.into(),
        hanviet: vec!["NHẬT".into()],
        kun: kun.iter().map(|s| (*s).to_owned()).collect(),
        on: vec!["ニチ".into()],
        example: vec![ExampleEntry::new("日本", Some("にほん".into()))],
        status: KanjiStatus::New,
    }
}

#[tokio::test]
async fn sqlite_corpus_round_trip_replaces_previous_value() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_corpus?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.replace_corpus(&[record("日", &["ひ"]), record("月", &["つき"])])
        .await
        .unwrap();
    repo.replace_corpus(&[record("日", &["ひ", "か"])]).await.unwrap();

    let loaded = repo.load_corpus().await.unwrap();
    assert_eq!(loaded, vec![record("日", &["ひ", "か"])]);

    let snapshot = repo.prior_snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.get("月").is_none());
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(applied, 1);
}

#[tokio::test]
async fn sqlite_storage_persists_preferences_and_reads_progress() {
    let storage = Storage::sqlite("sqlite:file:memdb_prefs?mode=memory&cache=shared")
        .await
        .expect("storage");

    let romaji = RomajiMode { kun: true, on: false };
    storage.preferences.save_romaji_mode(romaji).await.unwrap();
    let marked: MarkedWords = ["日".to_owned(), "月".to_owned()].into_iter().collect();
    storage.preferences.save_marked_words(&marked).await.unwrap();

    assert_eq!(storage.preferences.romaji_mode().await.unwrap(), romaji);
    assert_eq!(storage.preferences.marked_words().await.unwrap(), marked);

    storage
        .blobs
        .set(StoreKey::DailyPlan, r#"[{"kanji": [{"kanji": "日"}]}]"#)
        .await
        .unwrap();
    storage
        .blobs
        .set(StoreKey::DailyProgress, r#"{"day1": [0]}"#)
        .await
        .unwrap();
    assert_eq!(storage.progress.learned_kanji().await.unwrap(), vec!["日"]);
}

#[tokio::test]
async fn legacy_stored_corpus_loads_as_canonical_records() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_legacy?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.set(
        StoreKey::KanjiData,
        r#"[{"kanji": "火", "hanviet": "HỎA", "kun": "ひ", "on": ["カ"], "example": []}]"#,
    )
    .await
    .unwrap();

    let loaded = repo.load_corpus().await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].hanviet, vec!["HỎA"]);
    assert_eq!(loaded[0].kun, vec!["ひ"]);
    assert_eq!(loaded[0].status, KanjiStatus::Existing);
}
