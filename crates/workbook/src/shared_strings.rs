use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::WorkbookError;
use crate::xml::read_text;

/// One `<si>` entry of the shared string table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct SharedString {
    /// Displayed text: every `<t>` outside phonetic runs, concatenated.
    pub text: String,
    /// Raw inner markup, kept only when the entry carries phonetic runs.
    pub ruby_markup: Option<String>,
}

impl SharedString {
    pub(crate) fn from_markup(markup: &str) -> Result<Self, WorkbookError> {
        Ok(Self {
            text: visible_text(markup)?,
            ruby_markup: markup.contains("<rPh").then(|| markup.to_owned()),
        })
    }
}

pub(crate) fn parse_shared_strings(xml: &str) -> Result<Vec<SharedString>, WorkbookError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut items = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"si" => {
                let end = e.to_end().into_owned();
                let markup = reader.read_text(end.name())?;
                items.push(SharedString::from_markup(&markup)?);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"si" => {
                items.push(SharedString::default());
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(items)
}

/// Displayed text of a rich string body. `<t>` nodes under `<rPh>` are ruby, not content.
pub(crate) fn visible_text(markup: &str) -> Result<String, WorkbookError> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"rPh" => {
                let end = e.to_end().into_owned();
                reader.read_to_end(end.name())?;
            }
            Event::Start(e) if e.local_name().as_ref() == b"t" => {
                text.push_str(&read_text(&mut reader, b"t")?);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}
