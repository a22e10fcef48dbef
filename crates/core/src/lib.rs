#![forbid(unsafe_code)]

pub mod filter;
pub mod ingest;
pub mod model;

pub use filter::{FilterCounts, QuizFilter};
pub use ingest::{ingest_worksheet, IngestOutcome};
