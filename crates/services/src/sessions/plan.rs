use rand::Rng;

use kanji_core::QuizFilter;
use kanji_core::model::{DisplayMode, KanjiRecord};

use crate::error::QuizError;

/// Working subset of the corpus for one quiz, fixed when the quiz starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizPlan {
    records: Vec<KanjiRecord>,
    mode: DisplayMode,
}

impl QuizPlan {
    /// Filter `corpus` in order.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptySelection` when no record passes the filter.
    pub fn build(
        corpus: &[KanjiRecord],
        filter: &QuizFilter<'_>,
        mode: DisplayMode,
    ) -> Result<Self, QuizError> {
        let records = filter.apply(corpus);
        if records.is_empty() {
            return Err(QuizError::EmptySelection);
        }
        Ok(Self { records, mode })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    #[must_use]
    pub fn records(&self) -> &[KanjiRecord] {
        &self.records
    }

    /// Record to show at `index`: uniform with replacement in random mode, the
    /// index wrapped around the plan in order mode.
    pub(crate) fn pick<R: Rng>(&self, index: usize, rng: &mut R) -> &KanjiRecord {
        let slot = match self.mode {
            DisplayMode::Random => rng.random_range(0..self.records.len()),
            DisplayMode::Order => index % self.records.len(),
        };
        &self.records[slot]
    }
}
