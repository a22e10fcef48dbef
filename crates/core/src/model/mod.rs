pub mod daily;
mod kanji;
pub mod quiz;
pub mod readings;

pub use daily::{learned_kanji, CompletedItems, DailyPlan, DailyProgress, PlanDay, PlannedKanji};
pub use kanji::{DraftRecord, ExampleEntry, KanjiError, KanjiRecord, KanjiStatus};
pub use quiz::{
    AnswerBuffer, Correctness, DisplayMode, MarkedWords, QuizType, QuizTypeFilter, ReadingField,
    RomajiMode, SkipFields,
};
pub use readings::{split_readings, ReadingValue};
