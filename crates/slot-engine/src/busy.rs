//! Merge busy sources into one sorted timeline.
//!
//! External calendar intervals and the owner's confirmed bookings are flattened,
//! clipped to the resolution window, sorted and merged into non-overlapping
//! periods. Overlap queries against the merged timeline give the same answer as
//! [`crate::conflict::has_conflict`] over the raw inputs, for any candidate inside
//! the window.

use chrono::{DateTime, Utc};

use crate::model::{Booking, BusyInterval};

/// Sorted, non-overlapping busy periods within a window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusyTimeline {
    periods: Vec<(DateTime<Utc>, DateTime<Utc>)>,
}

impl BusyTimeline {
    /// Build from calendar intervals and confirmed bookings, clipped to
    /// `[window_start, window_end)`.
    pub fn build(
        calendar: &[BusyInterval],
        bookings: &[Booking],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Self {
        let raw = calendar
            .iter()
            .filter_map(BusyInterval::bounds)
            .chain(bookings.iter().map(|b| (b.start, b.end)));
        Self {
            periods: merge_busy_periods(raw, window_start, window_end),
        }
    }

    pub fn periods(&self) -> &[(DateTime<Utc>, DateTime<Utc>)] {
        &self.periods
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// True if `[start, end)` overlaps any merged period.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        // First period whose end is after `start`; earlier ones end at or before it.
        let idx = self.periods.partition_point(|&(_, period_end)| period_end <= start);
        self.periods
            .get(idx)
            .is_some_and(|&(period_start, _)| period_start < end)
    }
}

/// Merge overlapping or adjacent busy periods, clipped to the given window.
///
/// Empty and inverted intervals are dropped. Returns a sorted, non-overlapping list.
fn merge_busy_periods(
    intervals: impl IntoIterator<Item = (DateTime<Utc>, DateTime<Utc>)>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut clipped: Vec<(DateTime<Utc>, DateTime<Utc>)> = intervals
        .into_iter()
        .filter(|&(start, end)| start < end && start < window_end && end > window_start)
        .map(|(start, end)| (start.max(window_start), end.min(window_end)))
        .collect();

    if clipped.is_empty() {
        return Vec::new();
    }

    clipped.sort_by_key(|&(start, end)| (start, end));

    let mut merged: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
    for (start, end) in clipped {
        if let Some(last) = merged.last_mut() {
            if start <= last.1 {
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }

    merged
}
