mod plan;
mod service;
mod view;
mod workflow;

// Public API of the quiz subsystem.
pub use crate::error::QuizError;
pub use plan::QuizPlan;
pub use service::{QuizPhase, QuizSession};
pub use view::{QuizSetupView, QuizView};
pub use workflow::QuizLoopService;
