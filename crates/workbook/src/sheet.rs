use quick_xml::Reader;
use quick_xml::events::Event;

use kanji_core::ingest::{RawCell, RubyAnnotation, Worksheet};

use crate::error::WorkbookError;
use crate::shared_strings::SharedString;
use crate::xml::{attr_value, read_text};

/// Rows per worksheet in the xlsx format.
pub const MAX_ROWS: usize = 1_048_576;
/// Columns per worksheet in the xlsx format (`XFD`).
pub const MAX_COLS: usize = 16_384;

/// Zero-based `(row, col)` of an A1-style reference such as `"C12"`.
pub(crate) fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }

    let mut col: usize = 0;
    for b in letters.bytes() {
        col = col
            .checked_mul(26)?
            .checked_add(usize::from(b.to_ascii_uppercase() - b'A') + 1)?;
    }
    let row: usize = digits.parse().ok()?;
    Some((row.checked_sub(1)?, col - 1))
}

fn check_bounds(row: usize, col: usize) -> Result<(), WorkbookError> {
    if row >= MAX_ROWS || col >= MAX_COLS {
        return Err(WorkbookError::Malformed {
            part: "worksheet",
            reason: format!("cell at row {} column {} is outside the sheet", row + 1, col + 1),
        });
    }
    Ok(())
}

/// Kind of a `<c>` element, from its `t` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Shared,
    Inline,
    Boolean,
    Plain,
}

impl CellKind {
    fn from_attr(t: Option<&str>) -> Self {
        match t {
            Some("s") => Self::Shared,
            Some("inlineStr") => Self::Inline,
            Some("b") => Self::Boolean,
            _ => Self::Plain,
        }
    }
}

#[derive(Debug, Default)]
struct CellBody {
    value: Option<String>,
    inline_markup: Option<String>,
}

fn read_cell_body(reader: &mut Reader<&[u8]>) -> Result<CellBody, WorkbookError> {
    let mut buf = Vec::new();
    let mut body = CellBody::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"v" => {
                body.value = Some(read_text(reader, b"v")?);
            }
            Event::Start(e) if e.local_name().as_ref() == b"is" => {
                let end = e.to_end().into_owned();
                body.inline_markup = Some(reader.read_text(end.name())?.into_owned());
            }
            Event::Start(e) => {
                let end = e.to_end().into_owned();
                reader.read_to_end(end.name())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"c" => break,
            Event::Eof => {
                return Err(WorkbookError::Malformed {
                    part: "worksheet",
                    reason: "unexpected eof inside <c>".into(),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(body)
}

fn resolve_cell(
    kind: CellKind,
    body: CellBody,
    shared: &[SharedString],
) -> Result<Option<RawCell>, WorkbookError> {
    let with_markup = |entry: SharedString| match entry.ruby_markup {
        Some(markup) => RawCell::with_ruby(entry.text, RubyAnnotation::Inline(markup)),
        None => RawCell::text(entry.text),
    };

    let cell = match (kind, body) {
        (CellKind::Inline, CellBody { inline_markup: Some(markup), .. }) => {
            Some(with_markup(SharedString::from_markup(&markup)?))
        }
        (CellKind::Shared, CellBody { value: Some(index), .. }) => {
            let entry = index
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|i| shared.get(i))
                .ok_or_else(|| WorkbookError::Malformed {
                    part: "worksheet",
                    reason: format!("shared string index {index} out of range"),
                })?;
            Some(with_markup(entry.clone()))
        }
        (CellKind::Boolean, CellBody { value: Some(v), .. }) => {
            Some(RawCell::text(if v.trim() == "1" { "TRUE" } else { "FALSE" }))
        }
        (_, CellBody { value: Some(v), .. }) => Some(RawCell::text(v)),
        _ => None,
    };
    Ok(cell)
}

/// Parse worksheet XML into a dense grid anchored at the sheet's first used row.
pub(crate) fn parse_sheet(xml: &str, shared: &[SharedString]) -> Result<Worksheet, WorkbookError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut cells: Vec<(usize, usize, RawCell)> = Vec::new();
    let mut dimension_start: Option<usize> = None;
    let mut row_idx: usize = 0;
    let mut next_col: usize = 0;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"dimension" => {
                dimension_start = attr_value(&e, b"ref")?
                    .and_then(|r| r.split(':').next().and_then(parse_cell_ref))
                    .map(|(row, _)| row);
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                if let Some(r) = attr_value(&e, b"r")?.and_then(|r| r.trim().parse::<usize>().ok())
                {
                    row_idx = r.saturating_sub(1);
                }
                next_col = 0;
            }
            Event::End(e) if e.local_name().as_ref() == b"row" => {
                row_idx = row_idx.saturating_add(1);
            }
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let (row, col) = attr_value(&e, b"r")?
                    .as_deref()
                    .and_then(parse_cell_ref)
                    .unwrap_or((row_idx, next_col));
                let kind = CellKind::from_attr(attr_value(&e, b"t")?.as_deref());
                let body = read_cell_body(&mut reader)?;
                if let Some(cell) = resolve_cell(kind, body, shared)? {
                    check_bounds(row, col)?;
                    cells.push((row, col, cell));
                }
                next_col = col.saturating_add(1);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                next_col = attr_value(&e, b"r")?
                    .as_deref()
                    .and_then(parse_cell_ref)
                    .map_or(next_col.saturating_add(1), |(_, col)| col.saturating_add(1));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(dense_grid(cells, dimension_start))
}

fn dense_grid(cells: Vec<(usize, usize, RawCell)>, start: Option<usize>) -> Worksheet {
    let Some(first_used) = cells.iter().map(|(row, _, _)| *row).min() else {
        return Worksheet::default();
    };
    let start = start.map_or(first_used, |s| s.min(first_used));
    let last = cells.iter().map(|(row, _, _)| *row).max().unwrap_or(first_used);

    let mut rows: Vec<Vec<Option<RawCell>>> = vec![Vec::new(); last - start + 1];
    for (row, col, cell) in cells {
        let slots = &mut rows[row - start];
        if slots.len() <= col {
            slots.resize(col + 1, None);
        }
        slots[col] = Some(cell);
    }
    Worksheet::new(rows)
}
