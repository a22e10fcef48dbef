use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("missing workbook part: {0}")]
    MissingPart(String),

    #[error("workbook part {part} exceeds {limit} bytes")]
    PartTooLarge { part: String, limit: u64 },

    #[error("workbook has no worksheets")]
    NoWorksheet,

    #[error("malformed {part}: {reason}")]
    Malformed { part: &'static str, reason: String },
}
