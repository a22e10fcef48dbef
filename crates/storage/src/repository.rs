use async_trait::async_trait;
use kanji_core::ingest::PriorSnapshot;
use kanji_core::model::{DailyPlan, DailyProgress, KanjiRecord, MarkedWords, RomajiMode, SkipFields};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::mapping;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Keys of the persisted key-value namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    KanjiData,
    SkipFields,
    RomajiMode,
    MarkedWords,
    DailyProgress,
    DailyPlan,
}

impl StoreKey {
    pub const ALL: [Self; 6] = [
        Self::KanjiData,
        Self::SkipFields,
        Self::RomajiMode,
        Self::MarkedWords,
        Self::DailyProgress,
        Self::DailyPlan,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KanjiData => "kanjiData",
            Self::SkipFields => "kanjiQuiz_skipFields",
            Self::RomajiMode => "kanjiQuiz_romajiMode",
            Self::MarkedWords => "markedWords",
            Self::DailyProgress => "dailyProgress",
            Self::DailyPlan => "dailyLearningPlan",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw key-value persistence. Values are JSON documents; `set` replaces the whole value.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: StoreKey) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn set(&self, key: StoreKey, value: &str) -> Result<(), StorageError>;
}

//
// ─── TYPED REPOSITORIES ────────────────────────────────────────────────────────
//

/// The imported kanji corpus.
#[async_trait]
pub trait CorpusRepository: Send + Sync {
    /// Stored corpus with legacy shapes normalized. Empty when nothing was imported yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the corpus cannot be read or is not a JSON array.
    async fn load_corpus(&self) -> Result<Vec<KanjiRecord>, StorageError>;

    /// Stored corpus indexed for change classification, shapes preserved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the corpus cannot be read or is not a JSON array.
    async fn prior_snapshot(&self) -> Result<PriorSnapshot, StorageError>;

    /// Replace the whole corpus in a single write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the corpus cannot be encoded or stored.
    async fn replace_corpus(&self, records: &[KanjiRecord]) -> Result<(), StorageError>;
}

/// Quiz preferences and marks.
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be read or decoded.
    async fn skip_fields(&self) -> Result<SkipFields, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn save_skip_fields(&self, skip: SkipFields) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be read or decoded.
    async fn romaji_mode(&self) -> Result<RomajiMode, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn save_romaji_mode(&self, romaji: RomajiMode) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be read or decoded.
    async fn marked_words(&self) -> Result<MarkedWords, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn save_marked_words(&self, marked: &MarkedWords) -> Result<(), StorageError>;
}

/// Daily study progress, written by other tools and only read here.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be read or decoded.
    async fn daily_progress(&self) -> Result<DailyProgress, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be read or decoded.
    async fn daily_plan(&self) -> Result<DailyPlan, StorageError>;

    /// Kanji of every fully completed plan day.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if progress or plan cannot be read.
    async fn learned_kanji(&self) -> Result<Vec<String>, StorageError> {
        let progress = self.daily_progress().await?;
        let plan = self.daily_plan().await?;
        Ok(kanji_core::model::learned_kanji(&progress, &plan))
    }
}

#[async_trait]
impl<T: BlobStore + ?Sized> CorpusRepository for T {
    async fn load_corpus(&self) -> Result<Vec<KanjiRecord>, StorageError> {
        let Some(raw) = self.get(StoreKey::KanjiData).await? else {
            return Ok(Vec::new());
        };
        let records = mapping::corpus(mapping::decode_corpus(&raw)?);
        tracing::debug!(records = records.len(), "loaded corpus");
        Ok(records)
    }

    async fn prior_snapshot(&self) -> Result<PriorSnapshot, StorageError> {
        let Some(raw) = self.get(StoreKey::KanjiData).await? else {
            return Ok(PriorSnapshot::new());
        };
        Ok(mapping::prior_snapshot(&mapping::decode_corpus(&raw)?))
    }

    async fn replace_corpus(&self, records: &[KanjiRecord]) -> Result<(), StorageError> {
        let encoded = mapping::encode(records)?;
        self.set(StoreKey::KanjiData, &encoded).await?;
        tracing::debug!(records = records.len(), "replaced corpus");
        Ok(())
    }
}

#[async_trait]
impl<T: BlobStore + ?Sized> PreferencesRepository for T {
    async fn skip_fields(&self) -> Result<SkipFields, StorageError> {
        let raw = self.get(StoreKey::SkipFields).await?;
        mapping::decode_or_default(raw.as_deref())
    }

    async fn save_skip_fields(&self, skip: SkipFields) -> Result<(), StorageError> {
        self.set(StoreKey::SkipFields, &mapping::encode(&skip)?).await
    }

    async fn romaji_mode(&self) -> Result<RomajiMode, StorageError> {
        let raw = self.get(StoreKey::RomajiMode).await?;
        mapping::decode_or_default(raw.as_deref())
    }

    async fn save_romaji_mode(&self, romaji: RomajiMode) -> Result<(), StorageError> {
        self.set(StoreKey::RomajiMode, &mapping::encode(&romaji)?).await
    }

    async fn marked_words(&self) -> Result<MarkedWords, StorageError> {
        let raw = self.get(StoreKey::MarkedWords).await?;
        mapping::decode_or_default(raw.as_deref())
    }

    async fn save_marked_words(&self, marked: &MarkedWords) -> Result<(), StorageError> {
        self.set(StoreKey::MarkedWords, &mapping::encode(marked)?).await
    }
}

#[async_trait]
impl<T: BlobStore + ?Sized> ProgressRepository for T {
    async fn daily_progress(&self) -> Result<DailyProgress, StorageError> {
        let raw = self.get(StoreKey::DailyProgress).await?;
        mapping::decode_or_default(raw.as_deref())
    }

    async fn daily_plan(&self) -> Result<DailyPlan, StorageError> {
        let raw = self.get(StoreKey::DailyPlan).await?;
        mapping::decode_or_default(raw.as_deref())
    }
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    values: Arc<Mutex<HashMap<StoreKey, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl BlobStore for InMemoryStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>, StorageError> {
        let guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&key).cloned())
    }

    async fn set(&self, key: StoreKey, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key, value.to_owned());
        Ok(())
    }
}

/// Aggregates the typed repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub blobs: Arc<dyn BlobStore>,
    pub corpus: Arc<dyn CorpusRepository>,
    pub preferences: Arc<dyn PreferencesRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    /// Expose one blob store through every typed repository.
    #[must_use]
    pub fn from_store<S: BlobStore + Clone + 'static>(store: S) -> Self {
        let blobs: Arc<dyn BlobStore> = Arc::new(store.clone());
        let corpus: Arc<dyn CorpusRepository> = Arc::new(store.clone());
        let preferences: Arc<dyn PreferencesRepository> = Arc::new(store.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(store);
        Self {
            blobs,
            corpus,
            preferences,
            progress,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanji_core::model::{KanjiStatus, ReadingField};

    fn record(kanji: &str) -> KanjiRecord {
        KanjiRecord {
            kanji: kanji.into(),
            hanviet: vec!["SƠN".into()],
            kun: vec!["やま".into()],
            on: vec!["サン".into()],
            example: vec![],
            status: KanjiStatus::New,
        }
    }

    #[test]
    fn keys_match_persisted_names() {
        let names: Vec<_> = StoreKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "kanjiData",
                "kanjiQuiz_skipFields",
                "kanjiQuiz_romajiMode",
                "markedWords",
                "dailyProgress",
                "dailyLearningPlan",
            ]
        );
    }

    #[tokio::test]
    async fn empty_store_yields_defaults() {
        let store = InMemoryStore::new();
        assert!(store.load_corpus().await.unwrap().is_empty());
        assert!(store.prior_snapshot().await.unwrap().is_empty());
        assert_eq!(store.skip_fields().await.unwrap(), SkipFields::default());
        assert_eq!(store.romaji_mode().await.unwrap(), RomajiMode::default());
        assert!(store.marked_words().await.unwrap().is_empty());
        assert!(store.learned_kanji().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corpus_round_trips_and_replaces_wholesale() {
        let store = InMemoryStore::new();
        store.replace_corpus(&[record("山"), record("川")]).await.unwrap();
        store.replace_corpus(&[record("川")]).await.unwrap();

        let loaded = store.load_corpus().await.unwrap();
        assert_eq!(loaded, vec![record("川")]);
    }

    #[tokio::test]
    async fn preferences_round_trip() {
        let storage = Storage::in_memory();
        let mut skip = SkipFields::default();
        skip.set(ReadingField::On, true);
        storage.preferences.save_skip_fields(skip).await.unwrap();

        let mut marked = MarkedWords::new();
        marked.toggle("山");
        storage.preferences.save_marked_words(&marked).await.unwrap();

        assert!(storage.preferences.skip_fields().await.unwrap().on);
        assert!(storage.preferences.marked_words().await.unwrap().contains("山"));
        assert_eq!(
            storage.blobs.get(StoreKey::MarkedWords).await.unwrap().as_deref(),
            Some(r#"["山"]"#)
        );
    }

    #[tokio::test]
    async fn learned_kanji_come_from_completed_days() {
        let store = InMemoryStore::new();
        store
            .set(
                StoreKey::DailyPlan,
                r#"[{"kanji": [{"kanji": "日"}, {"kanji": "月"}]}, {"kanji": [{"kanji": "火"}]}]"#,
            )
            .await
            .unwrap();
        store
            .set(StoreKey::DailyProgress, r#"{"day1": [0, 1], "day2": []}"#)
            .await
            .unwrap();
        assert_eq!(store.learned_kanji().await.unwrap(), vec!["日", "月"]);
    }

    #[tokio::test]
    async fn malformed_preference_is_a_serialization_error() {
        let store = InMemoryStore::new();
        store.set(StoreKey::SkipFields, "not json").await.unwrap();
        assert!(matches!(
            store.skip_fields().await,
            Err(StorageError::Serialization(_))
        ));
    }
}
