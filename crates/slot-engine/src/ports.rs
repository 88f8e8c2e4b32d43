//! Collaborator interfaces consumed by the engine.
//!
//! The engine never talks to a database or calendar API directly. Hosts supply
//! implementations of these traits; [`crate::memory`] provides in-process ones.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::error::Result;
use crate::model::{Booking, BookingStatus, BusyInterval, NewBooking, Schedule};

/// Page size used by the external calendar contract.
pub const DEFAULT_CALENDAR_PAGE_SIZE: usize = 250;

/// Schedule persistence.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// The owner's schedule, or `None` if they never saved one.
    async fn get_schedule(&self, owner_id: &str) -> Result<Option<Schedule>>;

    /// Create or wholesale replace the owner's schedule.
    ///
    /// Implementations must delete the old windows and insert the new ones in a
    /// single transaction so readers never observe an empty schedule mid-update.
    async fn replace_schedule(&self, schedule: Schedule) -> Result<Schedule>;
}

/// Booking persistence.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// The owner's confirmed bookings overlapping `[start, end)`.
    async fn confirmed_overlapping(
        &self,
        owner_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>>;

    /// Insert a confirmed booking.
    ///
    /// Must fail with `SlotError::SlotNoLongerAvailable` if another confirmed
    /// booking of the same owner overlaps, checked atomically with the insert.
    /// On PostgreSQL this is an exclusion constraint such as
    /// `EXCLUDE USING gist (owner_id WITH =, tstzrange(start_time, end_time) WITH &&)
    /// WHERE (status = 'confirmed')`, or a serializable transaction.
    async fn insert_confirmed(&self, booking: NewBooking) -> Result<Booking>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>>;

    /// Move a booking from `from` to `to`.
    ///
    /// Must fail with `SlotError::InvalidTransition` if the stored status is no
    /// longer `from`, checked atomically with the write. On PostgreSQL this is
    /// `UPDATE ... SET status = $to WHERE id = $id AND status = $from`.
    async fn update_status(&self, id: Uuid, from: BookingStatus, to: BookingStatus) -> Result<Booking>;

    /// Bookings of an owner, optionally of one event type, newest start first.
    async fn bookings_for_owner(
        &self,
        owner_id: &str,
        event_type_id: Option<Uuid>,
    ) -> Result<Vec<Booking>>;
}

/// A request for one page of busy intervals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusyQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub max_results: usize,
    pub page_token: Option<String>,
}

/// One page of busy intervals, with a token if more remain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusyPage {
    pub intervals: Vec<BusyInterval>,
    pub next_page_token: Option<String>,
}

/// The owner's external calendar.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Busy intervals overlapping `[query.start, query.end)`.
    async fn list_busy_intervals(&self, owner_id: &str, query: &BusyQuery) -> Result<BusyPage>;
}

/// Source of "today", used to drop past dates.
pub trait Clock: Send + Sync {
    fn today(&self, timezone: Tz) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self, timezone: Tz) -> NaiveDate {
        Utc::now().with_timezone(&timezone).date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self, _timezone: Tz) -> NaiveDate {
        self.0
    }
}
