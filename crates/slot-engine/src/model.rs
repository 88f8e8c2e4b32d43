//! Core records: weekly windows, schedules, event types, busy intervals and bookings.

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SlotError};
use crate::time::{parse_time_of_day, DayOfWeek, TimeOfDay};

/// Shortest bookable event, in minutes.
pub const MIN_EVENT_DURATION_MINUTES: u32 = 15;
/// Longest bookable event, in minutes.
pub const MAX_EVENT_DURATION_MINUTES: u32 = 720;

/// A recurring weekly open interval, `[start, end)` on `day` in the schedule's zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAvailabilityWindow {
    pub day: DayOfWeek,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl WeeklyAvailabilityWindow {
    /// Build a window, rejecting zero-length, negative and overnight spans.
    pub fn new(day: DayOfWeek, start: TimeOfDay, end: TimeOfDay) -> Result<Self> {
        if start >= end {
            return Err(SlotError::InvalidWindow(format!(
                "{} {}-{}: end time must be after start time",
                day, start, end
            )));
        }
        Ok(Self { day, start, end })
    }

    /// True if `[start_min, end_min)` lies entirely inside this window.
    pub fn contains(&self, start_min: u16, end_min: u16) -> bool {
        start_min >= self.start.minutes() && end_min <= self.end.minutes() && start_min < end_min
    }
}

/// A window as submitted by an owner, before its times are parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInput {
    pub day: DayOfWeek,
    pub start: String,
    pub end: String,
}

impl WindowInput {
    pub fn new(day: DayOfWeek, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            day,
            start: start.into(),
            end: end.into(),
        }
    }

    /// Parse both times. Fails with `InvalidFormat` on a malformed string.
    pub fn parse(&self) -> Result<(u16, u16)> {
        let start = parse_time_of_day(&self.start)?;
        let end = parse_time_of_day(&self.end)?;
        Ok((start.minutes(), end.minutes()))
    }

    /// Parse and validate into a [`WeeklyAvailabilityWindow`].
    pub fn to_window(&self) -> Result<WeeklyAvailabilityWindow> {
        let start = parse_time_of_day(&self.start)?;
        let end = parse_time_of_day(&self.end)?;
        WeeklyAvailabilityWindow::new(self.day, start, end)
    }
}

/// An owner's weekly availability. One per owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub owner_id: String,
    pub timezone: Tz,
    pub windows: Vec<WeeklyAvailabilityWindow>,
}

impl Schedule {
    /// Windows on `day`, in stored order.
    pub fn windows_on(&self, day: DayOfWeek) -> impl Iterator<Item = &WeeklyAvailabilityWindow> {
        self.windows.iter().filter(move |w| w.day == day)
    }
}

/// A bookable meeting definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventType {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub duration_minutes: u32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
}

fn default_active() -> bool {
    true
}

impl EventType {
    /// Create an active event type with a fresh id.
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        duration_minutes: u32,
    ) -> Result<Self> {
        let event_type = Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            title: title.into(),
            duration_minutes,
            active: true,
            location: None,
            meeting_link: None,
        };
        event_type.validate()?;
        Ok(event_type)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_EVENT_DURATION_MINUTES..=MAX_EVENT_DURATION_MINUTES).contains(&self.duration_minutes) {
            return Err(SlotError::InvalidDuration(format!(
                "duration must be between {} and {} minutes, got {}",
                MIN_EVENT_DURATION_MINUTES, MAX_EVENT_DURATION_MINUTES, self.duration_minutes
            )));
        }
        Ok(())
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// A busy period from the external calendar. Either bound may be missing when
/// the provider returns partial data; such intervals never block a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BusyInterval {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Both bounds, if present.
    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.start?, self.end?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// `confirmed` may move to `cancelled` or `completed`; both are terminal.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Confirmed, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        })
    }
}

/// The visitor making a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booker {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn is_dotted_domain(domain: &str) -> bool {
    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

impl Booker {
    /// Validate field lengths and normalize blank notes to `None`.
    ///
    /// The email must be `local@domain` with a dotted domain, so
    /// `ada@localhost` is rejected.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        notes: Option<String>,
    ) -> Result<Self> {
        let name = name.into().trim().to_string();
        let email = email.into().trim().to_string();
        let notes = notes.filter(|n| !n.trim().is_empty());

        if name.is_empty() || name.chars().count() > 100 {
            return Err(SlotError::InvalidBooker(
                "name must be between 1 and 100 characters".to_string(),
            ));
        }
        let valid_email = email.len() <= 255
            && email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && is_dotted_domain(domain));
        if !valid_email {
            return Err(SlotError::InvalidBooker(format!("invalid email address '{}'", email)));
        }
        if notes.as_ref().is_some_and(|n| n.chars().count() > 500) {
            return Err(SlotError::InvalidBooker(
                "notes must be less than 500 characters".to_string(),
            ));
        }
        Ok(Self { name, email, notes })
    }
}

/// A booking about to be written. Always inserted as `confirmed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub event_type_id: Uuid,
    pub owner_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub booker: Booker,
}

/// The authoritative record of a committed reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub event_type_id: Uuid,
    pub owner_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: BookingStatus,
    pub booker: Booker,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Materialize a new confirmed booking.
    pub fn confirmed(new: NewBooking, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type_id: new.event_type_id,
            owner_id: new.owner_id,
            start: new.start,
            end: new.end,
            status: BookingStatus::Confirmed,
            booker: new.booker,
            created_at,
        }
    }

    /// Half-open overlap with `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }

    /// Apply a status transition, enforcing the booking state machine.
    pub fn transition(&mut self, next: BookingStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(SlotError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}
