use std::sync::Arc;

use kanji_core::model::ReadingField;
use storage::repository::{CorpusRepository, PreferencesRepository, ProgressRepository};

use super::service::QuizSession;
use crate::error::QuizError;

/// Opens quiz sessions from storage and persists marks and preferences as they change.
///
/// Each change is written as soon as it happens; concurrent writers to the same key
/// overwrite one another.
#[derive(Clone)]
pub struct QuizLoopService {
    corpus: Arc<dyn CorpusRepository>,
    preferences: Arc<dyn PreferencesRepository>,
    progress: Arc<dyn ProgressRepository>,
    seed: Option<u64>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        corpus: Arc<dyn CorpusRepository>,
        preferences: Arc<dyn PreferencesRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            corpus,
            preferences,
            progress,
            seed: None,
        }
    }

    /// Seed random selection of the sessions this service opens.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Load corpus, learned set, marks and preferences into a new session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if any of them cannot be read.
    pub async fn open_session(&self) -> Result<QuizSession, QuizError> {
        let corpus = self.corpus.load_corpus().await?;
        let learned = self.progress.learned_kanji().await?;
        let marked = self.preferences.marked_words().await?;
        let skip = self.preferences.skip_fields().await?;
        let romaji = self.preferences.romaji_mode().await?;
        tracing::debug!(
            corpus = corpus.len(),
            learned = learned.len(),
            marked = marked.len(),
            "opened quiz session"
        );

        let session = QuizSession::new(corpus, learned, marked).with_preferences(skip, romaji);
        Ok(match self.seed {
            Some(seed) => session.with_seed(seed),
            None => session,
        })
    }

    /// Toggle the mark on the current record and persist the marked list. The toggle is
    /// undone when the list cannot be written.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotActive` outside a running quiz, or a storage error.
    pub async fn toggle_mark(&self, session: &mut QuizSession) -> Result<bool, QuizError> {
        let marked = session.toggle_mark()?;
        if let Err(err) = self.preferences.save_marked_words(session.marked()).await {
            session.toggle_mark()?;
            tracing::warn!(error = %err, "mark not saved, reverted");
            return Err(err.into());
        }
        Ok(marked)
    }

    /// Toggle the mark on any kanji without a running quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the marked list cannot be read or written.
    pub async fn toggle_marked_word(&self, kanji: &str) -> Result<bool, QuizError> {
        let mut marked = self.preferences.marked_words().await?;
        let now_marked = marked.toggle(kanji);
        self.preferences.save_marked_words(&marked).await?;
        tracing::info!(kanji, marked = now_marked, "toggled mark");
        Ok(now_marked)
    }

    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the preference cannot be written.
    pub async fn set_skip(
        &self,
        session: &mut QuizSession,
        field: ReadingField,
        skipped: bool,
    ) -> Result<(), QuizError> {
        session.set_skip(field, skipped);
        self.preferences.save_skip_fields(session.skip_fields()).await?;
        Ok(())
    }

    /// Returns false, without writing, when the field has no romaji mode.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the preference cannot be written.
    pub async fn set_romaji(
        &self,
        session: &mut QuizSession,
        field: ReadingField,
        romaji: bool,
    ) -> Result<bool, QuizError> {
        if !session.set_romaji(field, romaji) {
            return Ok(false);
        }
        self.preferences.save_romaji_mode(session.romaji_mode()).await?;
        Ok(true)
    }
}
