//! JSON shapes of persisted values and their conversion into domain types.
//!
//! Stored corpora may predate the current schema: readings saved as a bare string,
//! examples that are not a list, records without a status. Those shapes are accepted here
//! and normalized, so nothing past the storage boundary sees them.

use kanji_core::ingest::{ExamplesValue, PriorRecord, PriorSnapshot};
use kanji_core::model::{KanjiRecord, KanjiStatus, ReadingValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn missing_reading() -> ReadingValue {
    ReadingValue::Malformed
}

fn missing_examples() -> ExamplesValue {
    ExamplesValue::Malformed
}

/// A corpus entry exactly as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredKanji {
    #[serde(default)]
    pub kanji: String,
    #[serde(default = "missing_reading")]
    pub hanviet: ReadingValue,
    #[serde(default = "missing_reading")]
    pub kun: ReadingValue,
    #[serde(default = "missing_reading")]
    pub on: ReadingValue,
    #[serde(default = "missing_examples")]
    pub example: ExamplesValue,
    #[serde(default)]
    pub status: Option<String>,
}

impl StoredKanji {
    /// Canonical record, or `None` when the entry has no usable key.
    #[must_use]
    pub fn into_record(self) -> Option<KanjiRecord> {
        let kanji = self.kanji.trim();
        if kanji.is_empty() {
            return None;
        }

        let status = match self.status.as_deref() {
            None => KanjiStatus::Existing,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(kanji, status = raw, "unknown stored status, treating as existing");
                KanjiStatus::Existing
            }),
        };

        Some(KanjiRecord {
            kanji: kanji.to_owned(),
            hanviet: self.hanviet.normalized(),
            kun: self.kun.normalized(),
            on: self.on.normalized(),
            example: self.example.normalized(),
            status,
        })
    }

    #[must_use]
    pub fn prior_record(&self) -> PriorRecord {
        PriorRecord {
            hanviet: self.hanviet.clone(),
            kun: self.kun.clone(),
            on: self.on.clone(),
            example: self.example.clone(),
        }
    }
}

/// Decode a stored corpus, skipping entries that are not objects of the expected shape.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the value is not a JSON array.
pub fn decode_corpus(raw: &str) -> Result<Vec<StoredKanji>, StorageError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(raw).map_err(ser)?;
    let total = entries.len();
    let decoded: Vec<StoredKanji> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();
    if decoded.len() < total {
        tracing::warn!(
            skipped = total - decoded.len(),
            "ignored undecodable stored kanji entries"
        );
    }
    Ok(decoded)
}

/// Prior snapshot keyed by the stored `kanji` string, last entry winning.
#[must_use]
pub fn prior_snapshot(entries: &[StoredKanji]) -> PriorSnapshot {
    let mut snapshot = PriorSnapshot::new();
    for entry in entries {
        snapshot.insert(entry.kanji.clone(), entry.prior_record());
    }
    snapshot
}

/// Normalized corpus in stored order.
#[must_use]
pub fn corpus(entries: Vec<StoredKanji>) -> Vec<KanjiRecord> {
    entries.into_iter().filter_map(StoredKanji::into_record).collect()
}

/// Decode a JSON value, falling back to the default for an absent key.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if a present value does not match `T`.
pub fn decode_or_default<T: DeserializeOwned + Default>(
    raw: Option<&str>,
) -> Result<T, StorageError> {
    match raw {
        Some(raw) => serde_json::from_str(raw).map_err(ser),
        None => Ok(T::default()),
    }
}

/// # Errors
///
/// Returns `StorageError::Serialization` if `value` cannot be encoded.
pub fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanji_core::ingest::readings_equal;
    use kanji_core::model::ExampleEntry;

    #[test]
    fn legacy_entry_normalizes_to_canonical_record() {
        let raw = r#"[{"kanji": " 水 ", "hanviet": "THỦY", "kun": " みず ", "on": ["スイ", ""],
                      "example": [{"text": "水曜日", "phonetic": "すいようび"}, null]}]"#;
        let records = corpus(decode_corpus(raw).unwrap());
        assert_eq!(
            records,
            vec![KanjiRecord {
                kanji: "水".into(),
                hanviet: vec!["THỦY".into()],
                kun: vec!["みず".into()],
                on: vec!["スイ".into()],
                example: vec![ExampleEntry::new("水曜日", Some("すいようび".into()))],
                status: KanjiStatus::Existing,
            }]
        );
    }

    #[test]
    fn prior_keeps_stored_shapes() {
        let raw = r#"[{"kanji": "水", "kun": "みず", "on": ["スイ"], "example": "oops"}]"#;
        let entries = decode_corpus(raw).unwrap();
        let prior = entries[0].prior_record();
        assert_eq!(prior.kun, ReadingValue::Bare("みず".into()));
        assert_eq!(prior.hanviet, ReadingValue::Malformed);
        assert_eq!(prior.example, ExamplesValue::Malformed);
        assert!(!readings_equal(&prior.kun, &ReadingValue::List(vec!["みず".into()])));
    }

    #[test]
    fn unusable_entries_are_skipped() {
        let raw = r#"[42, {"kanji": ""}, {"kanji": "火", "status": "bogus"}]"#;
        let entries = decode_corpus(raw).unwrap();
        assert_eq!(entries.len(), 2);
        let records = corpus(entries);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, KanjiStatus::Existing);
    }

    #[test]
    fn non_array_corpus_is_a_serialization_error() {
        assert!(matches!(
            decode_corpus(r#"{"kanji": "水"}"#),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn last_duplicate_wins_in_snapshot() {
        let raw = r#"[{"kanji": "木", "kun": ["き"]}, {"kanji": "木", "kun": ["こ"]}]"#;
        let snapshot = prior_snapshot(&decode_corpus(raw).unwrap());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot.get("木").map(|p| p.kun.clone()),
            Some(ReadingValue::List(vec!["こ".into()]))
        );
    }
}
