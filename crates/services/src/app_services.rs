use std::sync::Arc;

use storage::repository::Storage;

use crate::error::AppServicesError;
use crate::import_service::{ImportService, SheetSource};
use crate::sessions::QuizLoopService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    import: Arc<ImportService>,
    quiz_loop: Arc<QuizLoopService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        default_sheet: SheetSource,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, default_sheet))
    }

    #[must_use]
    pub fn in_memory(default_sheet: SheetSource) -> Self {
        Self::from_storage(Storage::in_memory(), default_sheet)
    }

    #[must_use]
    pub fn from_storage(storage: Storage, default_sheet: SheetSource) -> Self {
        let import = Arc::new(
            ImportService::new(Arc::clone(&storage.corpus)).with_default_sheet(default_sheet),
        );
        let quiz_loop = Arc::new(QuizLoopService::new(
            Arc::clone(&storage.corpus),
            Arc::clone(&storage.preferences),
            Arc::clone(&storage.progress),
        ));
        Self {
            storage,
            import,
            quiz_loop,
        }
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn import(&self) -> Arc<ImportService> {
        Arc::clone(&self.import)
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }
}
