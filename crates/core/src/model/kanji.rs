use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::readings::{count_non_blank, split_readings};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KanjiError {
    #[error("kanji key cannot be empty")]
    EmptyKanji,

    #[error("unknown kanji status: {0}")]
    UnknownStatus(String),
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Classification of a record relative to the previous import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KanjiStatus {
    New,
    Updated,
    #[default]
    Existing,
}

impl KanjiStatus {
    pub const ALL: [KanjiStatus; 3] = [Self::Existing, Self::Updated, Self::New];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Updated => "updated",
            Self::Existing => "existing",
        }
    }
}

impl fmt::Display for KanjiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KanjiStatus {
    type Err = KanjiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "new" => Ok(Self::New),
            "updated" => Ok(Self::Updated),
            "existing" => Ok(Self::Existing),
            other => Err(KanjiError::UnknownStatus(other.to_owned())),
        }
    }
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// One example word, optionally carrying its ruby reading.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExampleEntry {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub phonetic: Option<String>,
}

impl ExampleEntry {
    #[must_use]
    pub fn new(text: impl Into<String>, phonetic: Option<String>) -> Self {
        Self {
            text: text.into(),
            phonetic,
        }
    }

    /// True when the entry carries visible text.
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// A kanji dictionary entry as stored in the corpus.
///
/// Records are produced by an import pass and never mutated afterwards; marks and
/// learned tracking live in separate sets keyed by [`KanjiRecord::kanji`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanjiRecord {
    pub kanji: String,
    pub hanviet: Vec<String>,
    pub kun: Vec<String>,
    pub on: Vec<String>,
    pub example: Vec<ExampleEntry>,
    #[serde(default)]
    pub status: KanjiStatus,
}

impl KanjiRecord {
    /// Number of non-blank native readings.
    #[must_use]
    pub fn kun_count(&self) -> usize {
        count_non_blank(&self.kun)
    }

    /// Number of non-blank borrowed readings.
    #[must_use]
    pub fn on_count(&self) -> usize {
        count_non_blank(&self.on)
    }

    #[must_use]
    pub fn has_hanviet(&self) -> bool {
        count_non_blank(&self.hanviet) > 0
    }

    /// Examples with visible text, in sheet order.
    pub fn visible_examples(&self) -> impl Iterator<Item = &ExampleEntry> {
        self.example.iter().filter(|entry| entry.has_text())
    }
}

/// A record under construction during an import pass, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRecord {
    pub kanji: String,
    pub hanviet: Vec<String>,
    pub kun: Vec<String>,
    pub on: Vec<String>,
    pub example: Vec<ExampleEntry>,
}

impl DraftRecord {
    /// Open a draft from the raw column texts of a record-start row.
    ///
    /// # Errors
    ///
    /// Returns `KanjiError::EmptyKanji` if the trimmed kanji text is empty.
    pub fn from_columns(
        kanji: &str,
        hanviet: &str,
        kun: &str,
        on: &str,
        first_examples: [ExampleEntry; 2],
    ) -> Result<Self, KanjiError> {
        let kanji = kanji.trim();
        if kanji.is_empty() {
            return Err(KanjiError::EmptyKanji);
        }

        Ok(Self {
            kanji: kanji.to_owned(),
            hanviet: split_readings(hanviet),
            kun: split_readings(kun),
            on: split_readings(on),
            example: first_examples.into(),
        })
    }

    pub fn push_example(&mut self, entry: ExampleEntry) {
        self.example.push(entry);
    }

    /// Seal the draft with its classification.
    #[must_use]
    pub fn into_record(self, status: KanjiStatus) -> KanjiRecord {
        KanjiRecord {
            kanji: self.kanji,
            hanviet: self.hanviet,
            kun: self.kun,
            on: self.on,
            example: self.example,
            status,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
