//! Saving and loading an owner's weekly schedule.
//!
//! A save replaces every window at once. Input is validated in order: timezone,
//! time formats, window spans, then pairwise overlaps. Nothing reaches the store
//! unless all checks pass.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SlotError};
use crate::model::{Schedule, WeeklyAvailabilityWindow, WindowInput};
use crate::overlap::detect_overlaps_in;
use crate::ports::ScheduleStore;
use crate::time::{parse_timezone, DayOfWeek};

/// A schedule as submitted by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePayload {
    pub timezone: String,
    pub windows: Vec<WindowInput>,
}

pub struct ScheduleService {
    store: Arc<dyn ScheduleStore>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    /// The owner's schedule, `None` if never saved.
    pub async fn get(&self, owner_id: &str) -> Result<Option<Schedule>> {
        self.store.get_schedule(owner_id).await
    }

    /// Validate `payload` and replace the owner's schedule with it.
    ///
    /// # Errors
    /// - `InvalidTimezone` for an unknown zone.
    /// - `InvalidFormat` for a malformed `HH:MM`.
    /// - `InvalidWindow` for an empty window list or a window with `start >= end`.
    /// - `ScheduleConflict` if windows on the same day overlap.
    pub async fn save(&self, owner_id: &str, payload: &SchedulePayload) -> Result<Schedule> {
        let schedule = validate(owner_id, payload)?;
        let saved = self.store.replace_schedule(schedule).await?;
        info!(
            owner_id,
            timezone = %saved.timezone,
            windows = saved.windows.len(),
            "schedule saved"
        );
        Ok(saved)
    }
}

/// Run every save-time check and build the schedule, without touching storage.
pub fn validate(owner_id: &str, payload: &SchedulePayload) -> Result<Schedule> {
    let timezone = parse_timezone(&payload.timezone)?;
    if payload.windows.is_empty() {
        return Err(SlotError::InvalidWindow(
            "at least one availability window is required".to_string(),
        ));
    }

    let windows = payload
        .windows
        .iter()
        .map(WindowInput::to_window)
        .collect::<Result<Vec<_>>>()?;

    let report = detect_overlaps_in(&payload.windows)?;
    if report.has_conflicts() {
        return Err(SlotError::ScheduleConflict(report.conflicts));
    }

    Ok(Schedule {
        owner_id: owner_id.to_string(),
        timezone,
        windows,
    })
}

/// Windows that apply on `date`, sorted by start time.
pub fn windows_for_date(schedule: &Schedule, date: NaiveDate) -> Vec<WeeklyAvailabilityWindow> {
    let day = DayOfWeek::from(date.weekday());
    let mut windows: Vec<WeeklyAvailabilityWindow> = schedule.windows_on(day).copied().collect();
    windows.sort_by_key(|w| (w.start, w.end));
    windows
}
