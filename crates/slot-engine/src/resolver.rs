//! Decide whether a candidate meeting fits inside an owner's weekly schedule.
//!
//! The candidate's whole span must fit a single window. Its end time-of-day is
//! derived from `start + duration` in instant space, so a meeting that crosses
//! local midnight wraps to a small end minute and fits no window.

use chrono::{DateTime, Duration, Utc};

use crate::model::Schedule;
use crate::time::{day_of_week, time_of_day_minutes, MINUTES_PER_DAY};

/// True if `[candidate_start, candidate_start + duration)` lies inside one window
/// of `schedule`. An absent schedule means zero availability.
pub fn is_in_availability(
    candidate_start: DateTime<Utc>,
    duration_minutes: u32,
    schedule: Option<&Schedule>,
) -> bool {
    let Some(schedule) = schedule else {
        return false;
    };
    // A day or longer wraps the end minute back into the window.
    if duration_minutes == 0 || duration_minutes >= u32::from(MINUTES_PER_DAY) {
        return false;
    }
    let tz = schedule.timezone;

    let day = day_of_week(candidate_start, tz);
    let start_min = time_of_day_minutes(candidate_start, tz);
    let candidate_end = candidate_start + Duration::minutes(i64::from(duration_minutes));
    let end_min = time_of_day_minutes(candidate_end, tz);

    schedule
        .windows_on(day)
        .any(|window| window.contains(start_min, end_min))
}
