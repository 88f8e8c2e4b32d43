//! Detect overlapping weekly availability windows.
//!
//! Windows are grouped by day and compared pairwise. Two windows overlap when
//! `a.start < b.end && a.end > b.start`, so windows that only touch at a boundary
//! (09:00-12:00 and 12:00-15:00) are NOT conflicts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{WeeklyAvailabilityWindow, WindowInput};
use crate::time::DayOfWeek;

/// One window involved in an overlap, identified by its position in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictingWindow {
    pub index: usize,
    pub start: String,
    pub end: String,
}

/// All overlapping windows found on a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapConflict {
    pub day: DayOfWeek,
    pub windows: Vec<ConflictingWindow>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapReport {
    pub conflicts: Vec<OverlapConflict>,
}

impl OverlapReport {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

struct Entry<'a> {
    index: usize,
    start: u16,
    end: u16,
    start_text: &'a str,
    end_text: &'a str,
}

/// Find overlapping windows in an already-parsed schedule.
pub fn detect_overlaps(windows: &[WeeklyAvailabilityWindow]) -> OverlapReport {
    let texts: Vec<(String, String)> = windows
        .iter()
        .map(|w| (w.start.to_string(), w.end.to_string()))
        .collect();
    let entries = windows.iter().zip(&texts).enumerate().map(|(index, (w, (s, e)))| {
        (
            w.day,
            Entry {
                index,
                start: w.start.minutes(),
                end: w.end.minutes(),
                start_text: s,
                end_text: e,
            },
        )
    });
    report(entries)
}

/// Find overlapping windows in raw owner input.
///
/// # Errors
/// Any malformed time string fails the whole detection with `InvalidFormat`.
pub fn detect_overlaps_in(windows: &[WindowInput]) -> Result<OverlapReport> {
    let mut entries = Vec::with_capacity(windows.len());
    for (index, window) in windows.iter().enumerate() {
        let (start, end) = window.parse()?;
        entries.push((
            window.day,
            Entry {
                index,
                start,
                end,
                start_text: &window.start,
                end_text: &window.end,
            },
        ));
    }
    Ok(report(entries))
}

/// Non-blocking variant for interactive editing.
///
/// Malformed input is reported as "no conflicts" so a half-typed form does not
/// flash warnings. Never use this on a save or reservation path.
pub fn overlap_warnings(windows: &[WindowInput]) -> OverlapReport {
    detect_overlaps_in(windows).unwrap_or_else(|err| {
        tracing::debug!(error = %err, "skipping overlap warnings for malformed input");
        OverlapReport::default()
    })
}

fn report<'a>(entries: impl IntoIterator<Item = (DayOfWeek, Entry<'a>)>) -> OverlapReport {
    let mut by_day: BTreeMap<DayOfWeek, Vec<Entry<'a>>> = BTreeMap::new();
    for (day, entry) in entries {
        by_day.entry(day).or_default().push(entry);
    }

    let mut conflicts = Vec::new();
    for (day, slots) in by_day {
        let mut conflicting = vec![false; slots.len()];
        for i in 0..slots.len() {
            for j in (i + 1)..slots.len() {
                let (a, b) = (&slots[i], &slots[j]);
                if a.start < b.end && a.end > b.start {
                    conflicting[i] = true;
                    conflicting[j] = true;
                }
            }
        }

        let windows: Vec<ConflictingWindow> = slots
            .iter()
            .zip(&conflicting)
            .filter(|(_, hit)| **hit)
            .map(|(slot, _)| ConflictingWindow {
                index: slot.index,
                start: slot.start_text.to_string(),
                end: slot.end_text.to_string(),
            })
            .collect();

        if !windows.is_empty() {
            conflicts.push(OverlapConflict {
                day,
                windows,
                message: format!(
                    "Time slots overlap on {}. Please adjust the times to avoid conflicts.",
                    day.display_name()
                ),
            });
        }
    }

    OverlapReport { conflicts }
}
