//! Time utilities: weekdays, wall-clock time-of-day, date/zone parsing and the
//! candidate slot grid.
//!
//! Time-of-day values are naive (no date, no zone). They only gain meaning when
//! combined with a calendar date and the schedule's timezone.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dst::{self, DstPolicy};
use crate::error::{Result, SlotError};

/// Minutes in one wall-clock day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A day of the week, serialized lowercase (`"monday"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Sunday,
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
    ];

    /// Lowercase name, as stored and serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Sunday => "sunday",
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
        }
    }

    /// Capitalized name for messages shown to people.
    pub fn display_name(self) -> &'static str {
        match self {
            DayOfWeek::Sunday => "Sunday",
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => DayOfWeek::Sunday,
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self> {
        DayOfWeek::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SlotError::InvalidFormat(format!("unknown day of week '{}'", s)))
    }
}

/// A naive wall-clock time of day, stored as minutes since midnight in `[0, 1440)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(TimeOfDay(minutes))
    }

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(TimeOfDay(hour * 60 + minute))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self> {
        parse_time_of_day(s)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse a 24-hour `HH:MM` string. A single-digit hour is accepted (`"9:00"`).
///
/// # Errors
/// Returns `SlotError::InvalidFormat` unless hours are 0–23 and minutes are two
/// digits in 0–59.
pub fn parse_time_of_day(input: &str) -> Result<TimeOfDay> {
    let invalid = || SlotError::InvalidFormat(format!("time must be HH:MM (24-hour), got '{}'", input));

    let (hours, minutes) = input.split_once(':').ok_or_else(invalid)?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !(1..=2).contains(&hours.len()) || minutes.len() != 2 || !all_digits(hours) || !all_digits(minutes) {
        return Err(invalid());
    }

    let hour: u16 = hours.parse().map_err(|_| invalid())?;
    let minute: u16 = minutes.parse().map_err(|_| invalid())?;
    TimeOfDay::from_hm(hour, minute).ok_or_else(invalid)
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    if input.len() != 10 {
        return Err(SlotError::InvalidFormat(format!("date must be YYYY-MM-DD, got '{}'", input)));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| SlotError::InvalidFormat(format!("date must be YYYY-MM-DD, got '{}'", input)))
}

/// Parse an IANA timezone identifier (e.g. "America/New_York").
pub fn parse_timezone(input: &str) -> Result<Tz> {
    input
        .parse()
        .map_err(|_| SlotError::InvalidTimezone(input.to_string()))
}

/// Minutes since local midnight of `instant` in `timezone`, in `[0, 1440)`.
pub fn time_of_day_minutes(instant: DateTime<Utc>, timezone: Tz) -> u16 {
    let local = instant.with_timezone(&timezone);
    (local.hour() * 60 + local.minute()) as u16
}

/// Local weekday of `instant` in `timezone`.
pub fn day_of_week(instant: DateTime<Utc>, timezone: Tz) -> DayOfWeek {
    instant.with_timezone(&timezone).weekday().into()
}

/// Format `instant` as `HH:MM` wall-clock time in `timezone`.
pub fn format_time_of_day(instant: DateTime<Utc>, timezone: Tz) -> String {
    instant.with_timezone(&timezone).format("%H:%M").to_string()
}

/// The bookable-hours grid: candidate start times every `interval_minutes`
/// from `from_hour:00` through `to_hour:00` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotGrid {
    pub interval_minutes: u32,
    pub from_hour: u32,
    pub to_hour: u32,
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self {
            interval_minutes: 15,
            from_hour: 6,
            to_hour: 23,
        }
    }
}

/// Generate the wall-clock candidate start times for one calendar day.
///
/// Both bounds are inclusive, so the default grid yields 06:00, 06:15, ..., 23:00.
/// A zero interval or an out-of-range hour produces an empty grid.
pub fn generate_slot_grid(day: NaiveDate, grid: &SlotGrid) -> Vec<NaiveDateTime> {
    if grid.interval_minutes == 0 || grid.from_hour > grid.to_hour {
        return Vec::new();
    }
    let (Some(first), Some(last)) = (
        day.and_hms_opt(grid.from_hour, 0, 0),
        day.and_hms_opt(grid.to_hour, 0, 0),
    ) else {
        return Vec::new();
    };

    let step = Duration::minutes(i64::from(grid.interval_minutes));
    let mut slots = Vec::new();
    let mut current = first;
    while current <= last {
        slots.push(current);
        current += step;
    }
    slots
}

/// Generate the grid for `day` as wall-clock times in `timezone` and convert each
/// to a UTC instant, resolving DST gaps with `policy`.
pub fn zoned_slot_grid(
    day: NaiveDate,
    timezone: Tz,
    grid: &SlotGrid,
    policy: DstPolicy,
) -> Vec<DateTime<Utc>> {
    generate_slot_grid(day, grid)
        .into_iter()
        .filter_map(|local| dst::localize(local, timezone, policy))
        .collect()
}
