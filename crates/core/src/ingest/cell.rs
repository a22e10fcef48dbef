//! Cell extraction: raw worksheet cells to `{text, phonetic}` pairs.

use regex::Regex;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use std::sync::LazyLock;

/// Minimum number of columns every extracted row carries (kanji, three readings, two examples).
pub const SHEET_COLUMNS: usize = 6;

static INLINE_RUBY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<rPh[^>]*><t[^>]*>([^<]+)</t></rPh>").expect("static ruby pattern is valid")
});

//
// ─── RAW INPUT ─────────────────────────────────────────────────────────────────
//

/// Phonetic payload of a single rich-text run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PhoneticText {
    #[serde(default)]
    pub t: Option<String>,
}

/// A rich-text run that may carry a ruby reading.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct RubyRun {
    #[serde(rename = "rPh", default)]
    pub phonetic: Option<PhoneticText>,
}

impl RubyRun {
    #[must_use]
    pub fn with_reading(reading: impl Into<String>) -> Self {
        Self {
            phonetic: Some(PhoneticText {
                t: Some(reading.into()),
            }),
        }
    }

    /// The stored reading as-is; an empty one counts as absent.
    fn reading(&self) -> Option<String> {
        let text = self.phonetic.as_ref()?.t.as_deref()?;
        (!text.is_empty()).then(|| text.to_owned())
    }
}

/// Rich-text metadata attached to a cell, decoded once at the ingestion boundary.
///
/// Producers encode ruby either as the raw rich-text markup of the cell (`Inline`), as a
/// list of runs (`Runs`) or as a single run object (`Single`). Anything else decodes to
/// `None`; decoding never fails on malformed metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RubyAnnotation {
    Inline(String),
    Runs(Vec<RubyRun>),
    Single(RubyRun),
    #[default]
    None,
}

impl RubyAnnotation {
    /// First reading found, checking the inline markup, then the runs, then the single run.
    #[must_use]
    pub fn reading(&self) -> Option<String> {
        match self {
            Self::Inline(markup) => INLINE_RUBY
                .captures(markup)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().chars().filter(|c| !c.is_whitespace()).collect::<String>()),
            Self::Runs(runs) => runs.iter().find_map(RubyRun::reading),
            Self::Single(run) => run.reading(),
            Self::None => None,
        }
    }
}

impl<'de> Deserialize<'de> for RubyAnnotation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RunSlot {
            Run(RubyRun),
            Other(IgnoredAny),
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Inline(String),
            Runs(Vec<RunSlot>),
            Single(RubyRun),
            Other(IgnoredAny),
        }

        Ok(match Shape::deserialize(deserializer)? {
            Shape::Inline(markup) => Self::Inline(markup),
            Shape::Runs(slots) => Self::Runs(
                slots
                    .into_iter()
                    .map(|slot| match slot {
                        RunSlot::Run(run) => run,
                        RunSlot::Other(_) => RubyRun::default(),
                    })
                    .collect(),
            ),
            Shape::Single(run) => Self::Single(run),
            Shape::Other(_) => Self::None,
        })
    }
}

/// A worksheet cell as delivered by the spreadsheet reader.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct RawCell {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub rich: RubyAnnotation,
}

impl RawCell {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            rich: RubyAnnotation::None,
        }
    }

    #[must_use]
    pub fn with_ruby(value: impl Into<String>, rich: RubyAnnotation) -> Self {
        Self {
            value: value.into(),
            rich,
        }
    }
}

/// Dense grid of the first worksheet; row 0 is the header. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Worksheet {
    #[serde(default)]
    pub rows: Vec<Vec<Option<RawCell>>>,
}

impl Worksheet {
    #[must_use]
    pub fn new(rows: Vec<Vec<Option<RawCell>>>) -> Self {
        Self { rows }
    }

    /// Widest row in the sheet.
    #[must_use]
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

//
// ─── EXTRACTED OUTPUT ──────────────────────────────────────────────────────────
//

/// Text of a cell plus the ruby reading recovered from its rich text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    pub text: String,
    pub phonetic: Option<String>,
}

/// Extract one cell. Absent cells become empty text without phonetic.
#[must_use]
pub fn extract_cell(raw: Option<&RawCell>) -> Cell {
    match raw {
        Some(raw) => Cell {
            text: raw.value.clone(),
            phonetic: raw.rich.reading(),
        },
        None => Cell::default(),
    }
}

/// Extract every row of the sheet, padding each row to the sheet width
/// (at least [`SHEET_COLUMNS`]).
#[must_use]
pub fn extract_grid(sheet: &Worksheet) -> Vec<Vec<Cell>> {
    let width = sheet.width().max(SHEET_COLUMNS);
    sheet
        .rows
        .iter()
        .map(|row| {
            (0..width)
                .map(|col| extract_cell(row.get(col).and_then(Option::as_ref)))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_markup_reading_has_whitespace_removed() {
        let ruby = RubyAnnotation::Inline(
            r#"<r><t>日本</t></r><rPh sb="0" eb="2"><t xml:space="preserve"> に ほん </t></rPh>"#
                .into(),
        );
        assert_eq!(ruby.reading().as_deref(), Some("にほん"));
    }

    #[test]
    fn inline_markup_without_ruby_has_no_reading() {
        let ruby = RubyAnnotation::Inline("<t>日本</t>".into());
        assert_eq!(ruby.reading(), None);
    }

    #[test]
    fn first_run_with_reading_wins() {
        let ruby = RubyAnnotation::Runs(vec![
            RubyRun::default(),
            RubyRun::with_reading(""),
            RubyRun::with_reading(" たべる "),
            RubyRun::with_reading("のむ"),
        ]);
        assert_eq!(ruby.reading().as_deref(), Some(" たべる "));
    }

    #[test]
    fn blank_inline_reading_is_empty_not_absent() {
        let ruby = RubyAnnotation::Inline(r#"<rPh sb="0" eb="1"><t xml:space="preserve"> </t></rPh>"#.into());
        assert_eq!(ruby.reading().as_deref(), Some(""));

        let single = RubyAnnotation::Single(RubyRun::with_reading(" "));
        assert_eq!(single.reading().as_deref(), Some(" "));
    }

    #[test]
    fn decodes_each_metadata_shape() {
        let inline: RubyAnnotation =
            serde_json::from_str(r#""<rPh><t>みず</t></rPh>""#).unwrap();
        assert_eq!(inline.reading().as_deref(), Some("みず"));

        let runs: RubyAnnotation =
            serde_json::from_str(r#"[null, 3, {"rPh": {"t": "ひ"}}]"#).unwrap();
        assert_eq!(runs.reading().as_deref(), Some("ひ"));

        let single: RubyAnnotation = serde_json::from_str(r#"{"rPh": {"t": "き"}}"#).unwrap();
        assert_eq!(single, RubyAnnotation::Single(RubyRun::with_reading("き")));
    }

    #[test]
    fn malformed_metadata_degrades_to_none() {
        let number: RubyAnnotation = serde_json::from_str("42").unwrap();
        assert_eq!(number, RubyAnnotation::None);

        let bad_field: RubyAnnotation = serde_json::from_str(r#"{"rPh": "oops"}"#).unwrap();
        assert_eq!(bad_field.reading(), None);

        let null: RubyAnnotation = serde_json::from_str("null").unwrap();
        assert_eq!(null, RubyAnnotation::None);
    }

    #[test]
    fn grid_rows_are_padded_to_sheet_columns() {
        let sheet = Worksheet::new(vec![
            vec![Some(RawCell::text("Kanji"))],
            vec![Some(RawCell::text("火")), None, Some(RawCell::text("ひ"))],
        ]);
        let grid = extract_grid(&sheet);
        assert_eq!(grid.len(), 2);
        assert!(grid.iter().all(|row| row.len() == SHEET_COLUMNS));
        assert_eq!(grid[1][0].text, "火");
        assert_eq!(grid[1][1], Cell::default());
        assert_eq!(grid[1][2].text, "ひ");
    }

    #[test]
    fn worksheet_decodes_from_json() {
        let sheet: Worksheet = serde_json::from_str(
            r#"{"rows": [[{"value": "漢字"}], [{"value": "食べる", "rich": {"rPh": {"t": "たべる"}}}, null]]}"#,
        )
        .unwrap();
        let grid = extract_grid(&sheet);
        assert_eq!(grid[1][0].phonetic.as_deref(), Some("たべる"));
    }
}
