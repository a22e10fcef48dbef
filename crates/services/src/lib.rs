#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod import_service;
pub mod sessions;

pub use app_services::AppServices;
pub use error::{AppServicesError, ImportError, QuizError};
pub use import_service::{DEFAULT_SHEET, ImportReport, ImportService, SheetSource};
pub use sessions::{QuizLoopService, QuizPhase, QuizPlan, QuizSession, QuizSetupView, QuizView};
