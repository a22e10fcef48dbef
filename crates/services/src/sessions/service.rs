use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;

use kanji_core::model::{
    AnswerBuffer, Correctness, DisplayMode, KanjiRecord, MarkedWords, QuizType, QuizTypeFilter,
    ReadingField, RomajiMode, SkipFields,
};
use kanji_core::{FilterCounts, QuizFilter};

use super::plan::QuizPlan;
use super::view::{QuizSetupView, QuizView};
use crate::error::QuizError;

/// Macro-state of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Configuring,
    Active,
}

/// State that only exists while a quiz is running.
#[derive(Debug, Clone)]
struct ActiveQuiz {
    plan: QuizPlan,
    index: usize,
    history: Vec<KanjiRecord>,
    current: KanjiRecord,
    answers: AnswerBuffer,
    correctness: Correctness,
    show_result: bool,
}

impl ActiveQuiz {
    fn show(&mut self, record: KanjiRecord) {
        self.answers = AnswerBuffer::for_record(&record);
        self.correctness = Correctness::default();
        self.show_result = false;
        self.current = record;
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Interactive quiz over the imported corpus.
///
/// Filter, display mode, marks and answer preferences belong to the session and survive
/// going back to configuration; everything about the running quiz is dropped then.
/// Records themselves are never modified.
pub struct QuizSession {
    corpus: Vec<KanjiRecord>,
    learned: Vec<String>,
    marked: MarkedWords,
    types: QuizTypeFilter,
    mode: DisplayMode,
    skip: SkipFields,
    romaji: RomajiMode,
    rng: StdRng,
    active: Option<ActiveQuiz>,
}

impl QuizSession {
    #[must_use]
    pub fn new(corpus: Vec<KanjiRecord>, learned: Vec<String>, marked: MarkedWords) -> Self {
        Self {
            corpus,
            learned,
            marked,
            types: QuizTypeFilter::default(),
            mode: DisplayMode::default(),
            skip: SkipFields::default(),
            romaji: RomajiMode::default(),
            rng: StdRng::from_os_rng(),
            active: None,
        }
    }

    /// Use a seeded generator for random selection.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn with_preferences(mut self, skip: SkipFields, romaji: RomajiMode) -> Self {
        self.skip = skip;
        self.romaji = romaji;
        self
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        if self.is_active() {
            QuizPhase::Active
        } else {
            QuizPhase::Configuring
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn corpus(&self) -> &[KanjiRecord] {
        &self.corpus
    }

    #[must_use]
    pub fn marked(&self) -> &MarkedWords {
        &self.marked
    }

    #[must_use]
    pub fn learned(&self) -> &[String] {
        &self.learned
    }

    //
    // ─── CONFIGURATION ─────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn types(&self) -> QuizTypeFilter {
        self.types
    }

    pub fn set_types(&mut self, types: QuizTypeFilter) {
        self.types = types;
    }

    pub fn toggle_type(&mut self, ty: QuizType) {
        self.types.toggle(ty);
    }

    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Takes effect from the next quiz start.
    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
    }

    #[must_use]
    pub fn counts(&self) -> FilterCounts {
        self.filter().counts(&self.corpus)
    }

    #[must_use]
    pub fn setup_view(&self) -> QuizSetupView {
        QuizSetupView {
            types: self.types,
            mode: self.mode,
            counts: self.counts(),
        }
    }

    fn filter(&self) -> QuizFilter<'_> {
        QuizFilter::new(self.types, &self.learned, &self.marked)
    }

    //
    // ─── PREFERENCES ───────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn skip_fields(&self) -> SkipFields {
        self.skip
    }

    pub fn set_skip(&mut self, field: ReadingField, skipped: bool) {
        self.skip.set(field, skipped);
    }

    #[must_use]
    pub fn romaji_mode(&self) -> RomajiMode {
        self.romaji
    }

    /// Returns false when the field has no romaji mode.
    pub fn set_romaji(&mut self, field: ReadingField, romaji: bool) -> bool {
        self.romaji.set(field, romaji)
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Filter the corpus and show the first record.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptySelection` when nothing matches; the session then stays
    /// in configuration.
    pub fn start(&mut self) -> Result<&KanjiRecord, QuizError> {
        let plan = QuizPlan::build(&self.corpus, &self.filter(), self.mode)?;
        let first = plan.pick(0, &mut self.rng).clone();
        tracing::info!(
            records = plan.len(),
            mode = ?plan.mode(),
            first = %first.kanji,
            "quiz started"
        );

        let active = ActiveQuiz {
            plan,
            index: 0,
            history: vec![first.clone()],
            answers: AnswerBuffer::for_record(&first),
            correctness: Correctness::default(),
            show_result: false,
            current: first,
        };
        Ok(&self.active.insert(active).current)
    }

    /// Advance to the next record.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotActive` outside a running quiz.
    pub fn next(&mut self) -> Result<&KanjiRecord, QuizError> {
        let active = self.active.as_mut().ok_or(QuizError::NotActive)?;
        if active.plan.mode() == DisplayMode::Order {
            active.index += 1;
        }
        let record = active.plan.pick(active.index, &mut self.rng).clone();
        if active.history.last().map(|r| r.kanji.as_str()) != Some(record.kanji.as_str()) {
            active.history.push(record.clone());
        }
        tracing::debug!(kanji = %record.kanji, depth = active.history.len(), "next kanji");
        active.show(record);
        Ok(&active.current)
    }

    #[must_use]
    pub fn can_go_previous(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.history.len() > 1)
    }

    /// Step back to the previously shown record. Answers are not restored.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotActive` outside a running quiz and `QuizError::NoPrevious`
    /// when only one record has been shown.
    pub fn previous(&mut self) -> Result<&KanjiRecord, QuizError> {
        let active = self.active.as_mut().ok_or(QuizError::NotActive)?;
        if active.history.len() <= 1 {
            return Err(QuizError::NoPrevious);
        }
        active.history.pop();
        let record = active
            .history
            .last()
            .cloned()
            .ok_or(QuizError::NoPrevious)?;
        tracing::debug!(kanji = %record.kanji, depth = active.history.len(), "previous kanji");
        active.show(record);
        Ok(&active.current)
    }

    /// Leave the running quiz. Filter, mode, marks and preferences are kept.
    pub fn configure(&mut self) {
        if self.active.take().is_some() {
            tracing::debug!("quiz stopped");
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&KanjiRecord> {
        self.active.as_ref().map(|a| &a.current)
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.history.len())
    }

    #[must_use]
    pub fn plan(&self) -> Option<&QuizPlan> {
        self.active.as_ref().map(|a| &a.plan)
    }

    //
    // ─── MARKS ─────────────────────────────────────────────────────────────────
    //

    /// Toggle the mark on the current record. Returns whether it is now marked.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotActive` outside a running quiz.
    pub fn toggle_mark(&mut self) -> Result<bool, QuizError> {
        let active = self.active.as_ref().ok_or(QuizError::NotActive)?;
        Ok(self.marked.toggle(&active.current.kanji))
    }

    #[must_use]
    pub fn is_current_marked(&self) -> bool {
        self.current().is_some_and(|r| self.marked.contains(&r.kanji))
    }

    //
    // ─── ANSWERS ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn answers(&self) -> Option<&AnswerBuffer> {
        self.active.as_ref().map(|a| &a.answers)
    }

    /// # Errors
    ///
    /// Returns `QuizError::NotActive` outside a running quiz.
    pub fn set_hanviet_answer(&mut self, value: impl Into<String>) -> Result<(), QuizError> {
        let active = self.active.as_mut().ok_or(QuizError::NotActive)?;
        active.answers.hanviet = value.into();
        Ok(())
    }

    /// Set one answer slot. `Hanviet` has a single slot at index 0.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotActive` outside a running quiz and
    /// `QuizError::AnswerSlotOutOfRange` when `index` exceeds the field's slots.
    pub fn set_reading_answer(
        &mut self,
        field: ReadingField,
        index: usize,
        value: impl Into<String>,
    ) -> Result<(), QuizError> {
        let active = self.active.as_mut().ok_or(QuizError::NotActive)?;
        let slots = active.answers.slots(field);
        let out_of_range = QuizError::AnswerSlotOutOfRange {
            field,
            index,
            slots,
        };
        let slot = match field {
            ReadingField::Hanviet if index == 0 => &mut active.answers.hanviet,
            ReadingField::Hanviet => return Err(out_of_range),
            ReadingField::Kun => active.answers.kun.get_mut(index).ok_or(out_of_range)?,
            ReadingField::On => active.answers.on.get_mut(index).ok_or(out_of_range)?,
        };
        *slot = value.into();
        Ok(())
    }

    /// Store the evaluation of the current answers and reveal the result.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotActive` outside a running quiz.
    pub fn record_evaluation(&mut self, correctness: Correctness) -> Result<(), QuizError> {
        let active = self.active.as_mut().ok_or(QuizError::NotActive)?;
        active.correctness = correctness;
        active.show_result = true;
        Ok(())
    }

    #[must_use]
    pub fn correctness(&self) -> Option<Correctness> {
        self.active.as_ref().map(|a| a.correctness)
    }

    #[must_use]
    pub fn is_result_shown(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.show_result)
    }

    /// Snapshot of the running quiz for display.
    #[must_use]
    pub fn view(&self) -> Option<QuizView> {
        let active = self.active.as_ref()?;
        Some(QuizView {
            record: active.current.clone(),
            answers: active.answers.clone(),
            skip: self.skip,
            romaji: self.romaji,
            correctness: active.correctness,
            show_result: active.show_result,
            can_go_previous: active.history.len() > 1,
            is_marked: self.marked.contains(&active.current.kanji),
            history_depth: active.history.len(),
            position: (active.plan.mode() == DisplayMode::Order)
                .then(|| active.index % active.plan.len() + 1),
            plan_len: active.plan.len(),
            mode: active.plan.mode(),
        })
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("corpus_len", &self.corpus.len())
            .field("learned_len", &self.learned.len())
            .field("marked_len", &self.marked.len())
            .field("types", &self.types)
            .field("mode", &self.mode)
            .field("phase", &self.phase())
            .field("history_len", &self.history_len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use kanji_core::model::KanjiStatus;

    fn record(kanji: &str, kun: &[&str], on: &[&str], status: KanjiStatus) -> KanjiRecord {
        KanjiRecord {
            kanji: kanji.into(),
            hanviet: vec!["HV".into()],
            kun: kun.iter().map(|s| (*s).to_owned()).collect(),
            on: on.iter().map(|s| (*s).to_owned()).collect(),
            example: vec![],
            status,
        }
    }

    fn corpus() -> Vec<KanjiRecord> {
        vec![
            record("一", &["ひと"], &["イチ", "イツ"], KanjiStatus::Existing),
            record("二", &["ふた"], &["ニ"], KanjiStatus::Updated),
            record("三", &["み", "みっ"], &["サン"], KanjiStatus::New),
            record("四", &["よ"], &["シ"], KanjiStatus::New),
        ]
    }

    fn ordered_session() -> QuizSession {
        let mut session = QuizSession::new(corpus(), vec![], MarkedWords::new()).with_seed(1);
        session.set_mode(DisplayMode::Order);
        session
    }

    fn current_kanji(session: &QuizSession) -> String {
        session.current().map(|r| r.kanji.clone()).unwrap_or_default()
    }

    #[test]
    fn start_shows_first_record_and_records_history() {
        let mut session = ordered_session();
        assert_eq!(session.phase(), QuizPhase::Configuring);

        let first = session.start().unwrap().kanji.clone();
        assert_eq!(first, "一");
        assert_eq!(session.phase(), QuizPhase::Active);
        assert_eq!(session.history_len(), 1);
        assert!(!session.can_go_previous());
    }

    #[test]
    fn empty_selection_keeps_configuring() {
        let mut session = ordered_session();
        session.set_types(QuizTypeFilter::none());
        assert!(matches!(session.start(), Err(QuizError::EmptySelection)));
        assert_eq!(session.phase(), QuizPhase::Configuring);
    }

    #[test]
    fn previous_walks_back_through_history() {
        let mut session = ordered_session();
        session.start().unwrap();
        let first_next = session.next().unwrap().kanji.clone();
        session.next().unwrap();
        session.next().unwrap();

        session.previous().unwrap();
        let back = session.previous().unwrap().kanji.clone();
        assert_eq!(back, first_next);
    }

    #[test]
    fn previous_requires_two_entries() {
        let mut session = ordered_session();
        assert!(matches!(session.previous(), Err(QuizError::NotActive)));
        session.start().unwrap();
        assert!(matches!(session.previous(), Err(QuizError::NoPrevious)));
    }

    #[test]
    fn order_mode_wraps_and_history_skips_repeats() {
        let mut session = QuizSession::new(
            vec![record("一", &[], &[], KanjiStatus::New)],
            vec![],
            MarkedWords::new(),
        );
        session.set_mode(DisplayMode::Order);
        session.start().unwrap();
        session.next().unwrap();
        session.next().unwrap();
        assert_eq!(session.history_len(), 1);
        assert_eq!(current_kanji(&session), "一");
    }

    #[test]
    fn random_mode_history_never_repeats_consecutively() {
        let mut session = QuizSession::new(corpus(), vec![], MarkedWords::new()).with_seed(42);
        session.start().unwrap();
        for _ in 0..40 {
            session.next().unwrap();
        }
        let view = session.view().unwrap();
        assert!(view.history_depth >= 1);
        let active = session.active.as_ref().unwrap();
        assert!(active.history.windows(2).all(|w| w[0].kanji != w[1].kanji));
        assert_eq!(active.index, 0);
    }

    #[test]
    fn selection_resets_answers_to_reading_counts() {
        let mut session = ordered_session();
        session.start().unwrap();
        session.set_hanviet_answer("NHẤT").unwrap();
        session.set_reading_answer(ReadingField::On, 1, "イツ").unwrap();
        session
            .record_evaluation(Correctness {
                hanviet: true,
                kun: false,
                on: true,
            })
            .unwrap();
        assert!(session.is_result_shown());

        session.next().unwrap();
        let answers = session.answers().unwrap();
        assert!(answers.hanviet.is_empty());
        assert_eq!(answers.kun.len(), 1);
        assert_eq!(answers.on.len(), 1);
        assert_eq!(session.correctness(), Some(Correctness::default()));
        assert!(!session.is_result_shown());
    }

    #[test]
    fn answer_slots_are_bounded() {
        let mut session = ordered_session();
        session.start().unwrap();
        assert!(matches!(
            session.set_reading_answer(ReadingField::Kun, 1, "x"),
            Err(QuizError::AnswerSlotOutOfRange { slots: 1, .. })
        ));
        assert!(matches!(
            session.set_reading_answer(ReadingField::Hanviet, 1, "x"),
            Err(QuizError::AnswerSlotOutOfRange { .. })
        ));
        session.set_reading_answer(ReadingField::Hanviet, 0, "NHẤT").unwrap();
        assert_eq!(session.answers().unwrap().hanviet, "NHẤT");
    }

    #[test]
    fn toggle_mark_keeps_history_and_answers() {
        let mut session = ordered_session();
        session.start().unwrap();
        session.next().unwrap();
        session.set_hanviet_answer("NHỊ").unwrap();

        assert!(session.toggle_mark().unwrap());
        assert!(session.is_current_marked());
        assert_eq!(session.history_len(), 2);
        assert_eq!(session.answers().unwrap().hanviet, "NHỊ");

        assert!(!session.toggle_mark().unwrap());
        assert!(session.marked().is_empty());
    }

    #[test]
    fn configure_discards_quiz_but_keeps_settings() {
        let mut session = ordered_session();
        session.toggle_type(QuizType::New);
        session.set_skip(ReadingField::Kun, true);
        session.start().unwrap();
        session.toggle_mark().unwrap();

        session.configure();
        assert_eq!(session.phase(), QuizPhase::Configuring);
        assert!(session.current().is_none());
        assert!(!session.types().new);
        assert_eq!(session.mode(), DisplayMode::Order);
        assert!(session.skip_fields().kun);
        assert_eq!(session.marked().len(), 1);
    }

    #[test]
    fn preferences_survive_selection() {
        let mut session = ordered_session();
        session.start().unwrap();
        session.set_skip(ReadingField::Hanviet, true);
        assert!(session.set_romaji(ReadingField::On, true));
        assert!(!session.set_romaji(ReadingField::Hanviet, true));
        session.next().unwrap();

        let view = session.view().unwrap();
        assert!(view.skip.hanviet);
        assert!(view.romaji.on);
        assert!(!view.romaji.kun);
    }

    #[test]
    fn mutations_outside_quiz_are_rejected() {
        let mut session = ordered_session();
        assert!(matches!(session.next(), Err(QuizError::NotActive)));
        assert!(matches!(session.toggle_mark(), Err(QuizError::NotActive)));
        assert!(matches!(
            session.set_hanviet_answer("x"),
            Err(QuizError::NotActive)
        ));
        assert!(matches!(
            session.record_evaluation(Correctness::default()),
            Err(QuizError::NotActive)
        ));
        assert!(session.view().is_none());
    }
}
