use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::kanji::{KanjiRecord, KanjiStatus};

//
// ─── FILTER TOGGLES ────────────────────────────────────────────────────────────
//

/// One inclusion criterion of the quiz filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizType {
    Existing,
    Updated,
    New,
    Learned,
    Marked,
}

impl QuizType {
    pub const ALL: [QuizType; 5] = [
        Self::Existing,
        Self::Updated,
        Self::New,
        Self::Learned,
        Self::Marked,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Existing => "existing",
            Self::Updated => "updated",
            Self::New => "new",
            Self::Learned => "learned",
            Self::Marked => "marked",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl From<KanjiStatus> for QuizType {
    fn from(status: KanjiStatus) -> Self {
        match status {
            KanjiStatus::Existing => Self::Existing,
            KanjiStatus::Updated => Self::Updated,
            KanjiStatus::New => Self::New,
        }
    }
}

impl fmt::Display for QuizType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Five independent inclusion toggles. All enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct QuizTypeFilter {
    pub existing: bool,
    pub updated: bool,
    pub new: bool,
    pub learned: bool,
    pub marked: bool,
}

impl QuizTypeFilter {
    /// A filter with every criterion disabled.
    #[must_use]
    pub fn none() -> Self {
        Self {
            existing: false,
            updated: false,
            new: false,
            learned: false,
            marked: false,
        }
    }

    /// A filter enabling exactly the given criteria.
    #[must_use]
    pub fn only(types: &[QuizType]) -> Self {
        let mut filter = Self::none();
        for ty in types {
            filter.set(*ty, true);
        }
        filter
    }

    #[must_use]
    pub fn is_enabled(&self, ty: QuizType) -> bool {
        match ty {
            QuizType::Existing => self.existing,
            QuizType::Updated => self.updated,
            QuizType::New => self.new,
            QuizType::Learned => self.learned,
            QuizType::Marked => self.marked,
        }
    }

    #[must_use]
    pub fn allows_status(&self, status: KanjiStatus) -> bool {
        self.is_enabled(status.into())
    }

    pub fn set(&mut self, ty: QuizType, enabled: bool) {
        match ty {
            QuizType::Existing => self.existing = enabled,
            QuizType::Updated => self.updated = enabled,
            QuizType::New => self.new = enabled,
            QuizType::Learned => self.learned = enabled,
            QuizType::Marked => self.marked = enabled,
        }
    }

    pub fn toggle(&mut self, ty: QuizType) {
        let current = self.is_enabled(ty);
        self.set(ty, !current);
    }

    #[must_use]
    pub fn any_enabled(&self) -> bool {
        QuizType::ALL.into_iter().any(|ty| self.is_enabled(ty))
    }
}

impl Default for QuizTypeFilter {
    fn default() -> Self {
        Self {
            existing: true,
            updated: true,
            new: true,
            learned: true,
            marked: true,
        }
    }
}

/// How the next record is picked from the filtered corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Random,
    Order,
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// The three reading fields a learner answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingField {
    Hanviet,
    Kun,
    On,
}

impl ReadingField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hanviet => "hanviet",
            Self::Kun => "kun",
            Self::On => "on",
        }
    }
}

impl fmt::Display for ReadingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-progress answers for the current record.
///
/// `kun` and `on` hold one slot per non-blank reading of the record; a zero-length slot
/// list tells the input widget not to require an answer for that field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerBuffer {
    pub hanviet: String,
    pub kun: Vec<String>,
    pub on: Vec<String>,
}

impl AnswerBuffer {
    /// Fresh, blank answers sized to the record's readings.
    #[must_use]
    pub fn for_record(record: &KanjiRecord) -> Self {
        Self {
            hanviet: String::new(),
            kun: vec![String::new(); record.kun_count()],
            on: vec![String::new(); record.on_count()],
        }
    }

    #[must_use]
    pub fn slots(&self, field: ReadingField) -> usize {
        match field {
            ReadingField::Hanviet => 1,
            ReadingField::Kun => self.kun.len(),
            ReadingField::On => self.on.len(),
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.hanviet.is_empty()
            && self.kun.iter().all(String::is_empty)
            && self.on.iter().all(String::is_empty)
    }
}

/// Per-field correctness reported by the answer widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Correctness {
    pub hanviet: bool,
    pub kun: bool,
    pub on: bool,
}

impl Correctness {
    #[must_use]
    pub fn all_correct(&self) -> bool {
        self.hanviet && self.kun && self.on
    }
}

//
// ─── PREFERENCES ───────────────────────────────────────────────────────────────
//

/// Fields the learner chose not to answer. Persisted across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkipFields {
    #[serde(default)]
    pub hanviet: bool,
    #[serde(default)]
    pub kun: bool,
    #[serde(default)]
    pub on: bool,
}

impl SkipFields {
    #[must_use]
    pub fn is_skipped(&self, field: ReadingField) -> bool {
        match field {
            ReadingField::Hanviet => self.hanviet,
            ReadingField::Kun => self.kun,
            ReadingField::On => self.on,
        }
    }

    pub fn set(&mut self, field: ReadingField, skipped: bool) {
        match field {
            ReadingField::Hanviet => self.hanviet = skipped,
            ReadingField::Kun => self.kun = skipped,
            ReadingField::On => self.on = skipped,
        }
    }
}

/// Fields whose answers are typed as romaji. Only the Japanese readings qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RomajiMode {
    #[serde(default)]
    pub kun: bool,
    #[serde(default)]
    pub on: bool,
}

impl RomajiMode {
    #[must_use]
    pub fn is_romaji(&self, field: ReadingField) -> bool {
        match field {
            ReadingField::Hanviet => false,
            ReadingField::Kun => self.kun,
            ReadingField::On => self.on,
        }
    }

    /// Returns false when the field has no romaji mode.
    pub fn set(&mut self, field: ReadingField, romaji: bool) -> bool {
        match field {
            ReadingField::Hanviet => return false,
            ReadingField::Kun => self.kun = romaji,
            ReadingField::On => self.on = romaji,
        }
        true
    }
}

//
// ─── MARKS ─────────────────────────────────────────────────────────────────────
//

/// Kanji flagged for review, in the order they were marked.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkedWords(Vec<String>);

impl MarkedWords {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, kanji: &str) -> bool {
        self.0.iter().any(|k| k == kanji)
    }

    /// Flip membership of `kanji`. Returns true if it is marked afterwards.
    pub fn toggle(&mut self, kanji: &str) -> bool {
        if self.contains(kanji) {
            self.0.retain(|k| k != kanji);
            false
        } else {
            self.0.push(kanji.to_owned());
            true
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<String> for MarkedWords {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut marked = Self::new();
        for kanji in iter {
            if !marked.contains(&kanji) {
                marked.0.push(kanji);
            }
        }
        marked
    }
}
