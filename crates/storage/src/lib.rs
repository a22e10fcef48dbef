#![forbid(unsafe_code)]

pub mod mapping;
pub mod repository;
pub mod sqlite;

pub use repository::{
    BlobStore, CorpusRepository, InMemoryStore, PreferencesRepository, ProgressRepository,
    Storage, StorageError, StoreKey,
};
