//! DST transition policies for wall-clock slot candidates.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Longest DST gap searched when shifting forward.
const MAX_GAP_MINUTES: i64 = 180;

/// Policy for candidates that fall in a DST gap (e.g. 02:30 during spring forward).
///
/// Ambiguous wall-clock times (fall back) always resolve to the earlier instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Drop candidates that do not exist on the local clock.
    #[default]
    Skip,
    /// Move to the first wall-clock minute after the gap.
    ShiftForward,
}

/// Convert a wall-clock time in `timezone` to a UTC instant.
///
/// Returns `None` only for a gap time under [`DstPolicy::Skip`].
pub fn localize(local: NaiveDateTime, timezone: Tz, policy: DstPolicy) -> Option<DateTime<Utc>> {
    if let Some(instant) = resolve(local, timezone) {
        return Some(instant);
    }
    match policy {
        DstPolicy::Skip => None,
        DstPolicy::ShiftForward => (1..=MAX_GAP_MINUTES)
            .find_map(|offset| resolve(local + Duration::minutes(offset), timezone)),
    }
}

fn resolve(local: NaiveDateTime, timezone: Tz) -> Option<DateTime<Utc>> {
    match timezone.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}
