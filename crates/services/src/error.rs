//! Shared error types for the services crate.

use thiserror::Error;

use kanji_core::model::ReadingField;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use workbook::WorkbookError;

/// Errors emitted by `ImportService`. None of them leave a partially written corpus.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("could not read spreadsheet: {0}")]
    Workbook(#[from] WorkbookError),
    #[error("invalid worksheet json: {0}")]
    Worksheet(#[from] serde_json::Error),
    #[error("default spreadsheet {source_name} is unavailable: {reason}")]
    DefaultFileUnavailable { source_name: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by quiz sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no kanji match the selected quiz types")]
    EmptySelection,
    #[error("no quiz is in progress")]
    NotActive,
    #[error("no previous kanji in this quiz")]
    NoPrevious,
    #[error("{field} answer slot {index} is out of range ({slots} slots)")]
    AnswerSlotOutOfRange {
        field: ReadingField,
        index: usize,
        slots: usize,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
