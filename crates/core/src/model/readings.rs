use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Separators accepted between readings in a single cell.
pub const READING_SEPARATORS: [char; 2] = ['、', ','];

/// Split a reading cell into trimmed, non-empty tokens.
///
/// Both the full-width `、` and the ASCII `,` separate readings; a cell without any
/// separator yields at most one token.
#[must_use]
pub fn split_readings(raw: &str) -> Vec<String> {
    raw.split(READING_SEPARATORS)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Count tokens that carry non-whitespace content.
#[must_use]
pub fn count_non_blank(tokens: &[String]) -> usize {
    tokens.iter().filter(|t| !t.trim().is_empty()).count()
}

/// A reading field in the shape it was persisted.
///
/// Older corpora stored a single reading as a bare string instead of a list. Values of
/// any other shape (null, numbers, objects) decode as `Malformed` instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReadingValue {
    List(Vec<String>),
    Bare(String),
    Malformed,
}

impl<'de> Deserialize<'de> for ReadingValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            List(Vec<String>),
            Bare(String),
            Other(IgnoredAny),
        }

        Ok(match Shape::deserialize(deserializer)? {
            Shape::List(items) => Self::List(items),
            Shape::Bare(text) => Self::Bare(text),
            Shape::Other(_) => Self::Malformed,
        })
    }
}

impl ReadingValue {
    /// Canonical list form: blank tokens dropped, a bare string becomes one token.
    #[must_use]
    pub fn normalized(&self) -> Vec<String> {
        match self {
            Self::List(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(str::to_owned)
                .collect(),
            Self::Bare(text) => {
                let text = text.trim();
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![text.to_owned()]
                }
            }
            Self::Malformed => Vec::new(),
        }
    }
}

impl Default for ReadingValue {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl From<Vec<String>> for ReadingValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<&[String]> for ReadingValue {
    fn from(items: &[String]) -> Self {
        Self::List(items.to_vec())
    }
}
