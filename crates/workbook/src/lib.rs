//! Minimal xlsx reader: the first worksheet of a workbook as a dense cell grid.
//!
//! Only what kanji ingestion needs is decoded: cell text (shared, inline, boolean and
//! plain values) and the raw rich-text markup of strings carrying phonetic runs.

#![forbid(unsafe_code)]

mod error;
mod package;
mod shared_strings;
mod sheet;
mod xml;

pub use error::WorkbookError;
pub use kanji_core::ingest::Worksheet;
pub use package::MAX_PART_BYTES;
pub use sheet::{MAX_COLS, MAX_ROWS};

use package::Package;
use shared_strings::parse_shared_strings;
use sheet::parse_sheet;

/// Decode the first worksheet of an xlsx file.
///
/// # Errors
///
/// Returns [`WorkbookError`] when the bytes are not a zip container, a required part is
/// missing or oversized, or the sheet XML cannot be parsed.
pub fn read_first_worksheet(bytes: &[u8]) -> Result<Worksheet, WorkbookError> {
    let mut package = Package::open(bytes)?;
    let (sheet_part, shared_part) = package.locate_parts()?;
    tracing::debug!(sheet = %sheet_part, shared = ?shared_part, "located workbook parts");

    let shared = match shared_part {
        Some(part) => match package.read_part(&part)? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        },
        None => Vec::new(),
    };

    let sheet_xml = package.require_part(&sheet_part)?;
    let sheet = parse_sheet(&sheet_xml, &shared)?;
    tracing::debug!(
        rows = sheet.rows.len(),
        shared_strings = shared.len(),
        "decoded first worksheet"
    );
    Ok(sheet)
}
