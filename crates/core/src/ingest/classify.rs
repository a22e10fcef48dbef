//! Change classification of freshly built drafts against the previous corpus.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;

use crate::model::{DraftRecord, ExampleEntry, KanjiRecord, KanjiStatus, ReadingValue};

/// Example list of a prior record in its stored shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamplesValue {
    List(Vec<Option<ExampleEntry>>),
    Malformed,
}

impl<'de> Deserialize<'de> for ExamplesValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            List(Vec<Option<ExampleEntry>>),
            Other(IgnoredAny),
        }

        Ok(match Shape::deserialize(deserializer)? {
            Shape::List(items) => Self::List(items),
            Shape::Other(_) => Self::Malformed,
        })
    }
}

impl ExamplesValue {
    /// Canonical list form; a malformed value yields no examples.
    #[must_use]
    pub fn normalized(&self) -> Vec<ExampleEntry> {
        match self {
            Self::List(items) => items.iter().flatten().cloned().collect(),
            Self::Malformed => Vec::new(),
        }
    }
}

impl Default for ExamplesValue {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// A record of the previous snapshot, readings kept in their persisted shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorRecord {
    pub hanviet: ReadingValue,
    pub kun: ReadingValue,
    pub on: ReadingValue,
    pub example: ExamplesValue,
}

impl From<&KanjiRecord> for PriorRecord {
    fn from(record: &KanjiRecord) -> Self {
        Self {
            hanviet: record.hanviet.as_slice().into(),
            kun: record.kun.as_slice().into(),
            on: record.on.as_slice().into(),
            example: ExamplesValue::List(record.example.iter().cloned().map(Some).collect()),
        }
    }
}

/// Prior corpus indexed by kanji. The last entry wins when a key repeats.
#[derive(Debug, Clone, Default)]
pub struct PriorSnapshot {
    by_kanji: HashMap<String, PriorRecord>,
}

impl PriorSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kanji: impl Into<String>, record: PriorRecord) {
        self.by_kanji.insert(kanji.into(), record);
    }

    #[must_use]
    pub fn get(&self, kanji: &str) -> Option<&PriorRecord> {
        self.by_kanji.get(kanji)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_kanji.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_kanji.is_empty()
    }
}

impl<'a> FromIterator<&'a KanjiRecord> for PriorSnapshot {
    fn from_iter<I: IntoIterator<Item = &'a KanjiRecord>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for record in iter {
            snapshot.insert(record.kanji.clone(), PriorRecord::from(record));
        }
        snapshot
    }
}

/// Compare two reading fields, ignoring blank tokens.
///
/// Two bare strings compare by strict equality without trimming. A list never equals a
/// non-list, and malformed values never equal anything.
#[must_use]
pub fn readings_equal(a: &ReadingValue, b: &ReadingValue) -> bool {
    match (a, b) {
        (ReadingValue::List(a), ReadingValue::List(b)) => {
            let a = a.iter().filter(|t| !t.trim().is_empty());
            let b = b.iter().filter(|t| !t.trim().is_empty());
            a.eq(b)
        }
        (ReadingValue::Bare(a), ReadingValue::Bare(b)) => a == b,
        _ => false,
    }
}

/// Compare two example lists, ignoring entries without visible text.
#[must_use]
pub fn examples_equal(a: &ExamplesValue, b: &ExamplesValue) -> bool {
    let (ExamplesValue::List(a), ExamplesValue::List(b)) = (a, b) else {
        return false;
    };
    let visible = |items: &'_ Vec<Option<ExampleEntry>>| {
        items
            .iter()
            .flatten()
            .filter(|entry| entry.has_text())
            .map(|entry| (entry.text.clone(), entry.phonetic.clone()))
            .collect::<Vec<_>>()
    };
    visible(a) == visible(b)
}

/// Status of `draft` relative to its prior record, if any.
#[must_use]
pub fn classify(prior: Option<&PriorRecord>, draft: &DraftRecord) -> KanjiStatus {
    let Some(prior) = prior else {
        return KanjiStatus::New;
    };

    let hanviet_same = readings_equal(&prior.hanviet, &draft.hanviet.as_slice().into());
    let kun_same = readings_equal(&prior.kun, &draft.kun.as_slice().into());
    let on_same = readings_equal(&prior.on, &draft.on.as_slice().into());
    let examples_same = examples_equal(
        &prior.example,
        &ExamplesValue::List(draft.example.iter().cloned().map(Some).collect()),
    );

    if hanviet_same && kun_same && on_same && examples_same {
        KanjiStatus::Existing
    } else {
        KanjiStatus::Updated
    }
}

/// Per-status counts of one import pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportStats {
    pub new: usize,
    pub updated: usize,
    pub existing: usize,
    pub total: usize,
}

impl ImportStats {
    #[must_use]
    pub fn from_records(records: &[KanjiRecord]) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.status {
                KanjiStatus::New => stats.new += 1,
                KanjiStatus::Updated => stats.updated += 1,
                KanjiStatus::Existing => stats.existing += 1,
            }
        }
        stats
    }
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records: {} new, {} updated, {} unchanged",
            self.total, self.new, self.updated, self.existing
        )
    }
}

/// Finalize every draft with its status against `prior`.
#[must_use]
pub fn classify_drafts(drafts: Vec<DraftRecord>, prior: &PriorSnapshot) -> Vec<KanjiRecord> {
    drafts
        .into_iter()
        .map(|draft| {
            let status = classify(prior.get(&draft.kanji), &draft);
            draft.into_record(status)
        })
        .collect()
}
