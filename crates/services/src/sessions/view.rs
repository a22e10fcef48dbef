use kanji_core::FilterCounts;
use kanji_core::model::{
    AnswerBuffer, Correctness, DisplayMode, KanjiRecord, QuizTypeFilter, RomajiMode, SkipFields,
};

/// Presentation-agnostic snapshot of the running quiz.
///
/// This is intentionally **not** a UI view-model: no pre-formatted strings, no
/// evaluation of answers. Input widgets read `answers`, `skip` and `romaji`; the
/// result panel reads `correctness` once `show_result` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizView {
    pub record: KanjiRecord,
    pub answers: AnswerBuffer,
    pub skip: SkipFields,
    pub romaji: RomajiMode,
    pub correctness: Correctness,
    pub show_result: bool,
    pub can_go_previous: bool,
    pub is_marked: bool,
    pub history_depth: usize,
    /// 1-based position in the plan; only meaningful in order mode.
    pub position: Option<usize>,
    pub plan_len: usize,
    pub mode: DisplayMode,
}

/// What the configuration screen shows before a quiz starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSetupView {
    pub types: QuizTypeFilter,
    pub mode: DisplayMode,
    pub counts: FilterCounts,
}

impl QuizSetupView {
    /// Whether starting now would select at least one record.
    #[must_use]
    pub fn can_start(&self) -> bool {
        self.counts.matching > 0
    }
}
