//! Spreadsheet ingestion: cell extraction, record building and change classification.

mod builder;
mod cell;
mod classify;

pub use builder::{build_drafts, RecordBuilder};
pub use cell::{
    extract_cell, extract_grid, Cell, PhoneticText, RawCell, RubyAnnotation, RubyRun, Worksheet,
    SHEET_COLUMNS,
};
pub use classify::{
    classify, classify_drafts, examples_equal, readings_equal, ExamplesValue, ImportStats,
    PriorRecord, PriorSnapshot,
};

use crate::model::KanjiRecord;

/// Result of running a worksheet through the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub records: Vec<KanjiRecord>,
    pub stats: ImportStats,
    pub skipped_rows: usize,
}

/// Extract, build and classify a worksheet against the prior snapshot.
///
/// Runs synchronously and touches no storage; callers persist `records` as a whole.
#[must_use]
pub fn ingest_worksheet(sheet: &Worksheet, prior: &PriorSnapshot) -> IngestOutcome {
    let grid = extract_grid(sheet);
    let mut builder = RecordBuilder::new();
    for row in grid.iter().skip(1) {
        builder.push_row(row);
    }
    let skipped_rows = builder.skipped_rows();
    let records = classify_drafts(builder.finish(), prior);
    let stats = ImportStats::from_records(&records);
    IngestOutcome {
        records,
        stats,
        skipped_rows,
    }
}
