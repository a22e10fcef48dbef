use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::WorkbookError;
use crate::xml::attr_value;

/// Largest uncompressed part the reader will inflate.
pub const MAX_PART_BYTES: u64 = 64 * 1024 * 1024;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const DEFAULT_SHEET_PART: &str = "xl/worksheets/sheet1.xml";
const DEFAULT_SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    id: String,
    kind: String,
    target: String,
}

/// An opened xlsx container.
pub(crate) struct Package<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> Package<'a> {
    pub(crate) fn open(bytes: &'a [u8]) -> Result<Self, WorkbookError> {
        Ok(Self {
            archive: ZipArchive::new(Cursor::new(bytes))?,
        })
    }

    /// Read a part as UTF-8 text. Missing parts yield `None`.
    pub(crate) fn read_part(&mut self, name: &str) -> Result<Option<String>, WorkbookError> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if file.is_dir() {
            return Ok(None);
        }
        if file.size() > MAX_PART_BYTES {
            return Err(WorkbookError::PartTooLarge {
                part: name.to_owned(),
                limit: MAX_PART_BYTES,
            });
        }

        let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        (&mut file).take(MAX_PART_BYTES + 1).read_to_end(&mut bytes)?;
        if bytes.len() as u64 > MAX_PART_BYTES {
            return Err(WorkbookError::PartTooLarge {
                part: name.to_owned(),
                limit: MAX_PART_BYTES,
            });
        }

        let text = std::str::from_utf8(&bytes)?;
        Ok(Some(text.trim_start_matches('\u{feff}').to_owned()))
    }

    pub(crate) fn require_part(&mut self, name: &str) -> Result<String, WorkbookError> {
        self.read_part(name)?
            .ok_or_else(|| WorkbookError::MissingPart(name.to_owned()))
    }

    /// Part names of the first worksheet (in workbook order) and of the shared string table.
    pub(crate) fn locate_parts(&mut self) -> Result<(String, Option<String>), WorkbookError> {
        let Some(rels_xml) = self.read_part(WORKBOOK_RELS_PART)? else {
            let shared = self
                .read_part(DEFAULT_SHARED_STRINGS_PART)?
                .map(|_| DEFAULT_SHARED_STRINGS_PART.to_owned());
            return Ok((DEFAULT_SHEET_PART.to_owned(), shared));
        };
        let rels = parse_relationships(&rels_xml)?;

        let workbook_xml = self.require_part(WORKBOOK_PART)?;
        let sheet_rel_id = first_sheet_rel_id(&workbook_xml)?.ok_or(WorkbookError::NoWorksheet)?;
        let sheet = rels
            .iter()
            .find(|rel| rel.id == sheet_rel_id)
            .map(|rel| resolve_target(&rel.target))
            .ok_or_else(|| WorkbookError::Malformed {
                part: "workbook.xml.rels",
                reason: format!("no relationship for sheet {sheet_rel_id}"),
            })?;

        let shared = rels
            .iter()
            .find(|rel| rel.kind.ends_with("/sharedStrings"))
            .map(|rel| resolve_target(&rel.target));

        Ok((sheet, shared))
    }
}

/// Targets are relative to `xl/` unless rooted.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_owned(),
        None => format!("xl/{target}"),
    }
}

fn parse_relationships(xml: &str) -> Result<Vec<Relationship>, WorkbookError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut rels = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) =
                    (attr_value(&e, b"Id")?, attr_value(&e, b"Target")?)
                {
                    rels.push(Relationship {
                        id,
                        kind: attr_value(&e, b"Type")?.unwrap_or_default(),
                        target,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

fn first_sheet_rel_id(xml: &str) -> Result<Option<String>, WorkbookError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                return attr_value(&e, b"id");
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_and_rooted_targets_resolve_under_xl() {
        assert_eq!(resolve_target("worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
        assert_eq!(resolve_target("/xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
    }

    #[test]
    fn first_sheet_in_workbook_order_wins() {
        let xml = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <sheets>
                <sheet name="N3" sheetId="7" r:id="rId3"/>
                <sheet name="N2" sheetId="1" r:id="rId1"/>
            </sheets>
        </workbook>"#;
        assert_eq!(first_sheet_rel_id(xml).unwrap().as_deref(), Some("rId3"));
    }

    #[test]
    fn relationships_are_parsed() {
        let xml = r#"<Relationships>
            <Relationship Id="rId1" Type="http://x/worksheet" Target="worksheets/sheet1.xml"/>
            <Relationship Id="rId2" Type="http://x/sharedStrings" Target="sharedStrings.xml"/>
        </Relationships>"#;
        let rels = parse_relationships(xml).unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[1].id, "rId2");
        assert!(rels[1].kind.ends_with("/sharedStrings"));
    }
}
