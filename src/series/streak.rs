//! Streak Computer
//!
//! Counts consecutive calendar days with a qualifying answer.
//! The current streak must include today: a gap today resets it to zero
//! even if yesterday was logged.

use std::collections::HashSet;

use super::types::{BooleanResponse, CalendarDay, DayBoundary, RawResponse, Streak};

/// Days with at least one numeric answer
pub fn numeric_presence<B: DayBoundary + ?Sized>(
    responses: &[RawResponse],
    boundary: &B,
) -> HashSet<CalendarDay> {
    responses
        .iter()
        .filter(|r| r.numeric_value.is_some())
        .map(|r| boundary.day_of(r.timestamp))
        .collect()
}

/// Days with at least one `true` answer; `false`-only days are absent
pub fn boolean_presence<B: DayBoundary + ?Sized>(
    responses: &[BooleanResponse],
    boundary: &B,
) -> HashSet<CalendarDay> {
    responses
        .iter()
        .filter(|r| r.bool_value == Some(true))
        .map(|r| boundary.day_of(r.timestamp))
        .collect()
}

/// Consecutive present days walking backward from `today` (inclusive)
pub fn current_streak(present_days: &HashSet<CalendarDay>, today: CalendarDay) -> u32 {
    let mut count = 0;
    let mut cursor = Some(today);

    while let Some(day) = cursor {
        if !present_days.contains(&day) {
            break;
        }
        count += 1;
        cursor = day.pred_opt();
    }

    count
}

/// Longest run of consecutive present days anywhere in the history
pub fn best_streak(present_days: &HashSet<CalendarDay>) -> u32 {
    let mut days: Vec<CalendarDay> = present_days.iter().copied().collect();
    days.sort_unstable();

    let mut best = 0;
    let mut run = 0;
    let mut previous: Option<CalendarDay> = None;

    for day in days {
        run = match previous.and_then(|p| p.succ_opt()) {
            Some(next) if next == day => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(day);
    }

    best
}

impl Streak {
    /// Compute both streak lengths over one presence set
    pub fn compute(present_days: &HashSet<CalendarDay>, today: CalendarDay) -> Self {
        Self {
            current_length: current_streak(present_days, today),
            best_length: best_streak(present_days),
        }
    }
}
