use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kanji_core::ingest::{ImportStats, Worksheet};
use kanji_core::ingest_worksheet;
use reqwest::Client;
use storage::repository::CorpusRepository;

use crate::error::ImportError;

/// Well-known location of the bundled spreadsheet.
pub const DEFAULT_SHEET: &str = "KANJI_N3.xlsx";

/// Where the default spreadsheet is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSource {
    Url(String),
    Path(PathBuf),
}

impl SheetSource {
    /// `http(s)://` locations are fetched, anything else is a filesystem path.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Url(raw.to_owned())
        } else {
            Self::Path(PathBuf::from(raw))
        }
    }
}

impl Default for SheetSource {
    fn default() -> Self {
        Self::Path(PathBuf::from(DEFAULT_SHEET))
    }
}

impl fmt::Display for SheetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Outcome of one import pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub stats: ImportStats,
    pub skipped_rows: usize,
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stats)?;
        if self.skipped_rows > 0 {
            write!(f, " ({} rows ignored)", self.skipped_rows)?;
        }
        Ok(())
    }
}

/// Turns spreadsheets into the persisted corpus.
///
/// Every entry point decodes the whole input before touching storage, and the corpus is
/// replaced in a single write, so a failed import leaves the previous corpus as it was.
#[derive(Clone)]
pub struct ImportService {
    corpus: Arc<dyn CorpusRepository>,
    client: Client,
    default_sheet: SheetSource,
}

impl ImportService {
    #[must_use]
    pub fn new(corpus: Arc<dyn CorpusRepository>) -> Self {
        Self {
            corpus,
            client: Client::new(),
            default_sheet: SheetSource::default(),
        }
    }

    #[must_use]
    pub fn with_default_sheet(mut self, source: SheetSource) -> Self {
        self.default_sheet = source;
        self
    }

    #[must_use]
    pub fn default_sheet(&self) -> &SheetSource {
        &self.default_sheet
    }

    /// Classify a decoded worksheet against the stored corpus and replace it.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Storage` if the prior corpus cannot be read or the new one
    /// cannot be written.
    pub async fn import_worksheet(&self, sheet: &Worksheet) -> Result<ImportReport, ImportError> {
        let prior = self.corpus.prior_snapshot().await?;
        let outcome = ingest_worksheet(sheet, &prior);
        if outcome.skipped_rows > 0 {
            tracing::warn!(rows = outcome.skipped_rows, "ignored rows without kanji or examples");
        }

        self.corpus.replace_corpus(&outcome.records).await?;

        let stats = outcome.stats;
        tracing::info!(
            total = stats.total,
            new = stats.new,
            updated = stats.updated,
            existing = stats.existing,
            "imported kanji corpus"
        );
        Ok(ImportReport {
            stats,
            skipped_rows: outcome.skipped_rows,
        })
    }

    /// Import the first worksheet of an `.xlsx` file.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Workbook` if the bytes are not a readable workbook, or a
    /// storage error from [`Self::import_worksheet`].
    pub async fn import_bytes(&self, bytes: &[u8]) -> Result<ImportReport, ImportError> {
        let sheet = workbook::read_first_worksheet(bytes)?;
        self.import_worksheet(&sheet).await
    }

    /// Import a worksheet grid given as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Worksheet` if the JSON does not describe a grid, or a storage
    /// error from [`Self::import_worksheet`].
    pub async fn import_worksheet_json(&self, json: &str) -> Result<ImportReport, ImportError> {
        let sheet: Worksheet = serde_json::from_str(json)?;
        self.import_worksheet(&sheet).await
    }

    /// Import a file chosen by the user. `.json` files are read as worksheet grids,
    /// everything else as `.xlsx`.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Io` if the file cannot be read, or a decoding/storage error.
    pub async fn import_file(&self, path: &Path) -> Result<ImportReport, ImportError> {
        let bytes = tokio::fs::read(path).await?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "read spreadsheet file");
        if is_json(path) {
            let json = String::from_utf8_lossy(&bytes);
            self.import_worksheet_json(&json).await
        } else {
            self.import_bytes(&bytes).await
        }
    }

    /// Fetch and import the default spreadsheet.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::DefaultFileUnavailable` if the file is missing or the server
    /// answers with a non-success status, `ImportError::Http`/`Io` for transport
    /// failures, or a decoding/storage error.
    pub async fn import_default(&self) -> Result<ImportReport, ImportError> {
        let bytes = self.fetch_default().await?;
        tracing::info!(source = %self.default_sheet, bytes = bytes.len(), "loaded default spreadsheet");
        self.import_bytes(&bytes).await
    }

    async fn fetch_default(&self) -> Result<Vec<u8>, ImportError> {
        match &self.default_sheet {
            SheetSource::Url(url) => {
                let response = self.client.get(url).send().await?;
                if !response.status().is_success() {
                    return Err(ImportError::DefaultFileUnavailable {
                        source_name: url.clone(),
                        reason: format!("server answered {}", response.status()),
                    });
                }
                Ok(response.bytes().await?.to_vec())
            }
            SheetSource::Path(path) => match tokio::fs::read(path).await {
                Ok(bytes) => Ok(bytes),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    Err(ImportError::DefaultFileUnavailable {
                        source_name: path.display().to_string(),
                        reason: "file not found".into(),
                    })
                }
                Err(err) => Err(err.into()),
            },
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
