use crate::ingest::cell::Cell;
use crate::model::{DraftRecord, ExampleEntry};

const COL_KANJI: usize = 0;
const COL_HANVIET: usize = 1;
const COL_KUN: usize = 2;
const COL_ON: usize = 3;
const COL_EXAMPLE_1: usize = 4;
const COL_EXAMPLE_2: usize = 5;

/// Groups extracted rows into draft records.
///
/// A row whose first column is non-blank opens a record; following rows with a blank
/// first column contribute extra examples to it. Drafts are classified in a separate
/// pass once every row has been consumed.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    drafts: Vec<DraftRecord>,
    skipped_rows: usize,
}

impl RecordBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one data row (never the header).
    pub fn push_row(&mut self, row: &[Cell]) {
        let text = |col: usize| row.get(col).map_or("", |cell| cell.text.as_str());
        let example = |col: usize| {
            row.get(col).map_or_else(ExampleEntry::default, |cell| {
                ExampleEntry::new(cell.text.clone(), cell.phonetic.clone())
            })
        };

        if let Ok(draft) = DraftRecord::from_columns(
            text(COL_KANJI),
            text(COL_HANVIET),
            text(COL_KUN),
            text(COL_ON),
            [example(COL_EXAMPLE_1), example(COL_EXAMPLE_2)],
        ) {
            self.drafts.push(draft);
            return;
        }

        let first = example(COL_EXAMPLE_1);
        let second = example(COL_EXAMPLE_2);
        match self.drafts.last_mut() {
            Some(open) if !first.text.is_empty() || !second.text.is_empty() => {
                if !first.text.is_empty() {
                    open.push_example(first);
                }
                if !second.text.is_empty() {
                    open.push_example(second);
                }
            }
            _ => self.skipped_rows += 1,
        }
    }

    /// Rows that neither opened a record nor added examples.
    #[must_use]
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    #[must_use]
    pub fn finish(self) -> Vec<DraftRecord> {
        self.drafts
    }
}

/// Build drafts from an extracted grid, skipping the header row.
#[must_use]
pub fn build_drafts(grid: &[Vec<Cell>]) -> Vec<DraftRecord> {
    let mut builder = RecordBuilder::new();
    for row in grid.iter().skip(1) {
        builder.push_row(row);
    }
    builder.finish()
}
