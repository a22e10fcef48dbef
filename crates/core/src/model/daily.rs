//! Read-only view of the daily learning plan.
//!
//! The plan and its progress are owned by the daily-learning scheduler; the quiz only
//! derives which kanji count as "learned" from them.

use serde::Deserialize;
use serde::de::IgnoredAny;
use std::collections::{BTreeMap, HashSet};

/// One kanji slot of a planned day. Other fields of the stored entry are ignored.
///
/// An entry that is not an object with a string `kanji` still occupies its slot but
/// names no kanji.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "PlannedKanjiRepr")]
pub struct PlannedKanji {
    pub kanji: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlannedKanjiRepr {
    Entry { kanji: String },
    Other(IgnoredAny),
}

impl From<PlannedKanjiRepr> for PlannedKanji {
    fn from(repr: PlannedKanjiRepr) -> Self {
        match repr {
            PlannedKanjiRepr::Entry { kanji } => Self { kanji: Some(kanji) },
            PlannedKanjiRepr::Other(_) => Self::default(),
        }
    }
}

/// A single planned study day. `kanji` is `None` when the stored day has no readable
/// kanji list; such a day can never be completed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "PlanDayRepr")]
pub struct PlanDay {
    pub kanji: Option<Vec<PlannedKanji>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanDayRepr {
    Day {
        #[serde(default)]
        kanji: Option<Vec<PlannedKanji>>,
    },
    Other(IgnoredAny),
}

impl From<PlanDayRepr> for PlanDay {
    fn from(repr: PlanDayRepr) -> Self {
        match repr {
            PlanDayRepr::Day { kanji } => Self { kanji },
            PlanDayRepr::Other(_) => Self::default(),
        }
    }
}

/// The full plan, day 1 first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct DailyPlan(pub Vec<PlanDay>);

/// Number of completed items of one day. Only the length of the stored index list
/// matters; `null` counts as an empty list and any other non-list as unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "CompletedRepr")]
pub struct CompletedItems(pub Option<usize>);

#[derive(Deserialize)]
#[serde(untagged)]
enum CompletedRepr {
    Items(Vec<IgnoredAny>),
    Null(()),
    Other(IgnoredAny),
}

impl From<CompletedRepr> for CompletedItems {
    fn from(repr: CompletedRepr) -> Self {
        match repr {
            CompletedRepr::Items(items) => Self(Some(items.len())),
            CompletedRepr::Null(()) => Self(Some(0)),
            CompletedRepr::Other(_) => Self(None),
        }
    }
}

/// Completed item indices per day, keyed `day<N>` with `N` starting at 1.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct DailyProgress(pub BTreeMap<String, CompletedItems>);

impl DailyProgress {
    /// Parse a `day<N>` key into its 1-based day number.
    fn day_number(key: &str) -> Option<usize> {
        key.strip_prefix("day")?.trim().parse().ok()
    }
}

/// Kanji whose plan day was completed in full, each listed once in first-seen order.
#[must_use]
pub fn learned_kanji(progress: &DailyProgress, plan: &DailyPlan) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut learned = Vec::new();

    let mut days: Vec<(usize, CompletedItems)> = progress
        .0
        .iter()
        .filter_map(|(key, done)| DailyProgress::day_number(key).map(|n| (n, *done)))
        .collect();
    days.sort_by_key(|(n, _)| *n);

    for (day, completed) in days {
        let Some(entries) = day
            .checked_sub(1)
            .and_then(|idx| plan.0.get(idx))
            .and_then(|plan_day| plan_day.kanji.as_ref())
        else {
            continue;
        };
        if completed.0 != Some(entries.len()) {
            continue;
        }
        for kanji in entries.iter().filter_map(|entry| entry.kanji.as_deref()) {
            if seen.insert(kanji) {
                learned.push(kanji.to_owned());
            }
        }
    }

    learned
}
