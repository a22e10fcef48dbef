use std::collections::HashSet;

use crate::model::{KanjiRecord, KanjiStatus, MarkedWords, QuizTypeFilter};

/// Derives the working subset of the corpus for a quiz session.
///
/// Marked and learned membership take precedence over the status toggles: a marked record
/// is included whenever `marked` is enabled, whatever its status, and status toggles only
/// admit records that are neither learned nor marked.
#[derive(Debug, Clone)]
pub struct QuizFilter<'a> {
    types: QuizTypeFilter,
    learned: HashSet<&'a str>,
    marked: &'a MarkedWords,
}

impl<'a> QuizFilter<'a> {
    #[must_use]
    pub fn new(types: QuizTypeFilter, learned: &'a [String], marked: &'a MarkedWords) -> Self {
        Self {
            types,
            learned: learned.iter().map(String::as_str).collect(),
            marked,
        }
    }

    #[must_use]
    pub fn is_learned(&self, kanji: &str) -> bool {
        self.learned.contains(kanji)
    }

    #[must_use]
    pub fn is_marked(&self, kanji: &str) -> bool {
        self.marked.contains(kanji)
    }

    #[must_use]
    pub fn passes(&self, record: &KanjiRecord) -> bool {
        let learned = self.is_learned(&record.kanji);
        let marked = self.is_marked(&record.kanji);

        if self.types.marked && marked {
            return true;
        }
        if self.types.learned && learned {
            return true;
        }
        self.types.allows_status(record.status) && !learned && !marked
    }

    /// Records passing the filter, in corpus order.
    #[must_use]
    pub fn apply(&self, corpus: &[KanjiRecord]) -> Vec<KanjiRecord> {
        corpus
            .iter()
            .filter(|record| self.passes(record))
            .cloned()
            .collect()
    }

    /// Per-criterion counts shown while configuring a quiz.
    #[must_use]
    pub fn counts(&self, corpus: &[KanjiRecord]) -> FilterCounts {
        let by_status =
            |status: KanjiStatus| corpus.iter().filter(|r| r.status == status).count();
        FilterCounts {
            existing: by_status(KanjiStatus::Existing),
            updated: by_status(KanjiStatus::Updated),
            new: by_status(KanjiStatus::New),
            learned: self.learned.len(),
            marked: self.marked.len(),
            matching: corpus.iter().filter(|record| self.passes(record)).count(),
            total: corpus.len(),
        }
    }
}

/// Counts backing the quiz configuration screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterCounts {
    pub existing: usize,
    pub updated: usize,
    pub new: usize,
    pub learned: usize,
    pub marked: usize,
    pub matching: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuizType;

    fn record(kanji: &str, status: KanjiStatus) -> KanjiRecord {
        KanjiRecord {
            kanji: kanji.into(),
            hanviet: vec![],
            kun: vec![],
            on: vec![],
            example: vec![],
            status,
        }
    }

    fn corpus() -> Vec<KanjiRecord> {
        vec![
            record("一", KanjiStatus::Existing),
            record("二", KanjiStatus::Updated),
            record("三", KanjiStatus::New),
            record("四", KanjiStatus::New),
        ]
    }

    fn kanji(records: &[KanjiRecord]) -> Vec<&str> {
        records.iter().map(|r| r.kanji.as_str()).collect()
    }

    #[test]
    fn default_filter_keeps_everything_in_order() {
        let marked = MarkedWords::new();
        let filter = QuizFilter::new(QuizTypeFilter::default(), &[], &marked);
        assert_eq!(kanji(&filter.apply(&corpus())), vec!["一", "二", "三", "四"]);
    }

    #[test]
    fn marked_toggle_overrides_disabled_status() {
        let marked: MarkedWords = ["三".to_owned()].into_iter().collect();
        let types = QuizTypeFilter::only(&[QuizType::Marked]);
        let filter = QuizFilter::new(types, &[], &marked);
        assert_eq!(kanji(&filter.apply(&corpus())), vec!["三"]);
    }

    #[test]
    fn learned_toggle_overrides_disabled_status() {
        let marked = MarkedWords::new();
        let learned = vec!["二".to_owned()];
        let types = QuizTypeFilter::only(&[QuizType::Learned, QuizType::Existing]);
        let filter = QuizFilter::new(types, &learned, &marked);
        assert_eq!(kanji(&filter.apply(&corpus())), vec!["一", "二"]);
    }

    #[test]
    fn status_toggle_excludes_learned_and_marked_records() {
        let marked: MarkedWords = ["四".to_owned()].into_iter().collect();
        let learned = vec!["三".to_owned()];
        let types = QuizTypeFilter::only(&[QuizType::New]);
        let filter = QuizFilter::new(types, &learned, &marked);
        assert!(filter.apply(&corpus()).is_empty());
    }

    #[test]
    fn no_criteria_selects_nothing() {
        let marked = MarkedWords::new();
        let filter = QuizFilter::new(QuizTypeFilter::none(), &[], &marked);
        assert!(filter.apply(&corpus()).is_empty());
    }

    #[test]
    fn counts_reflect_corpus_and_sets() {
        let marked: MarkedWords = ["一".to_owned(), "外".to_owned()].into_iter().collect();
        let learned = vec!["二".to_owned()];
        let types = QuizTypeFilter::only(&[QuizType::New]);
        let counts = QuizFilter::new(types, &learned, &marked).counts(&corpus());
        assert_eq!(
            counts,
            FilterCounts {
                existing: 1,
                updated: 1,
                new: 2,
                learned: 1,
                marked: 2,
                matching: 2,
                total: 4,
            }
        );
    }
}
