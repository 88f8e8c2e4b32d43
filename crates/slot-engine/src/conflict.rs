//! Detect overlaps between a candidate slot and busy calendar intervals.
//!
//! Uses the half-open rule: `[s1, e1)` and `[s2, e2)` overlap iff `s1 < e2 && e1 > s2`.
//! A slot ending exactly when a busy interval starts is NOT a conflict.

use chrono::{DateTime, Utc};

use crate::model::BusyInterval;

/// True if `[candidate_start, candidate_end)` overlaps any busy interval.
///
/// Intervals missing a start or an end are skipped, since external calendar data
/// can be partially malformed.
pub fn has_conflict(
    candidate_start: DateTime<Utc>,
    candidate_end: DateTime<Utc>,
    busy: &[BusyInterval],
) -> bool {
    busy.iter()
        .filter_map(BusyInterval::bounds)
        .any(|(start, end)| candidate_start < end && candidate_end > start)
}

/// Overlap in whole minutes between `[a_start, a_end)` and `[b_start, b_end)`,
/// or `None` if they do not overlap.
pub fn overlap_minutes(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> Option<i64> {
    if a_start < b_end && b_start < a_end {
        Some((a_end.min(b_end) - a_start.max(b_start)).num_minutes())
    } else {
        None
    }
}
