use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::WorkbookError;

/// Value of the attribute whose local name is `key`, unescaped.
pub(crate) fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, WorkbookError> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Concatenated text content up to the end of the element with local name `end`.
pub(crate) fn read_text(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<String, WorkbookError> {
    let mut buf = Vec::new();
    let mut text = String::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(std::str::from_utf8(e.as_ref())?),
            Event::End(e) if e.local_name().as_ref() == end => break,
            Event::Eof => {
                return Err(WorkbookError::Malformed {
                    part: "xml",
                    reason: format!("unexpected eof inside <{}>", String::from_utf8_lossy(end)),
                });
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}
