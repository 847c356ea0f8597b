//! Cross-participant statistics derived from a selection snapshot.
//!
//! Everything here is a pure function of a `SelectionState`. Nothing is cached or
//! stored; callers re-read after each mutation.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::date_key::{DateKey, YearMonth};
use crate::participant::ParticipantName;
use crate::selection::SelectionState;

/// How many dates the overview ranks by default.
pub const DEFAULT_TOP_N: usize = 3;

/// One date with the participants who picked it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateStat {
    pub date: DateKey,
    pub count: usize,
    /// Sorted by name.
    pub participants: Vec<ParticipantName>,
}

pub fn counts_by_date(state: &SelectionState) -> BTreeMap<DateKey, usize> {
    let mut counts = BTreeMap::new();
    for (_, dates) in state.iter() {
        for date in dates {
            *counts.entry(*date).or_insert(0) += 1;
        }
    }
    counts
}

/// One entry per day of `month`, including days nobody picked.
pub fn month_stats(state: &SelectionState, month: YearMonth) -> Vec<DateStat> {
    let mut by_date = participants_by_date(state);
    month
        .dates()
        .map(|date| {
            let participants = by_date.remove(&date).unwrap_or_default();
            DateStat {
                date,
                count: participants.len(),
                participants,
            }
        })
        .collect()
}

/// Dates ranked by how many participants picked them, most popular first.
///
/// Ties go to the earlier date, so the ranking is stable across runs.
pub fn top_preferred_dates(state: &SelectionState, n: usize) -> Vec<(DateKey, usize)> {
    let mut ranked: Vec<_> = counts_by_date(state).into_iter().collect();
    ranked.sort_by_key(|&(date, count)| (Reverse(count), date));
    ranked.truncate(n);
    ranked
}

/// Denominator for display shading. Zero when nothing is selected.
pub fn max_participants_on_any_date(state: &SelectionState) -> usize {
    counts_by_date(state).into_values().max().unwrap_or(0)
}

/// Shading ratio in `[0, 1]` for a date picked by `count` of at most `max` participants.
pub fn intensity(count: usize, max: usize) -> f64 {
    if max == 0 {
        return 0.0;
    }
    (count.min(max) as f64) / (max as f64)
}

/// Participants with their number of picked dates, busiest first, then by name.
pub fn participants_by_selection_count(state: &SelectionState) -> Vec<(ParticipantName, usize)> {
    let mut participants: Vec<_> = state
        .iter()
        .map(|(name, dates)| (name.clone(), dates.len()))
        .collect();
    participants.sort_by(|(a_name, a_count), (b_name, b_count)| {
        b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
    });
    participants
}

fn participants_by_date(state: &SelectionState) -> BTreeMap<DateKey, Vec<ParticipantName>> {
    let mut by_date: BTreeMap<DateKey, Vec<ParticipantName>> = BTreeMap::new();
    // state iterates in name order, so each list comes out sorted
    for (name, dates) in state.iter() {
        for date in dates {
            by_date.entry(*date).or_default().push(name.clone());
        }
    }
    by_date
}
