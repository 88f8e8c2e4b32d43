//! The final gate before a booking is written.
//!
//! Slot enumeration is advisory and may be stale by the time a visitor submits.
//! The guard re-checks the owner's confirmed bookings, then relies on the store's
//! atomic [`BookingStore::insert_confirmed`] to close the race between two visitors
//! submitting the same slot. Conflicts are never retried here; the visitor picks
//! another time.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::conflict::overlap_minutes;
use crate::dst::{self, DstPolicy};
use crate::error::{Result, SlotError};
use crate::model::{Booker, Booking, BookingStatus, EventType, NewBooking};
use crate::ports::{BookingStore, Clock, SystemClock};
use crate::time::{parse_date, parse_time_of_day, parse_timezone};

pub struct ReservationGuard {
    bookings: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
}

impl ReservationGuard {
    pub fn new(bookings: Arc<dyn BookingStore>) -> Self {
        Self {
            bookings,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Reserve `[candidate_start, candidate_end)` for `event_type`'s owner.
    ///
    /// # Errors
    /// - `InvalidDuration` if the event type's duration is out of range, or the
    ///   span is empty or inverted.
    /// - `EventTypeInactive` if the event type is switched off.
    /// - `SlotNoLongerAvailable` if a confirmed booking of the owner overlaps,
    ///   whether found by the pre-check or by the store's exclusion.
    pub async fn reserve(
        &self,
        event_type: &EventType,
        candidate_start: DateTime<Utc>,
        candidate_end: DateTime<Utc>,
        booker: Booker,
    ) -> Result<Booking> {
        event_type.validate()?;
        if !event_type.active {
            return Err(SlotError::EventTypeInactive(event_type.id.to_string()));
        }
        if candidate_start >= candidate_end {
            return Err(SlotError::InvalidDuration(format!(
                "booking must end after it starts ({} >= {})",
                candidate_start, candidate_end
            )));
        }

        let owner_id = event_type.owner_id.as_str();
        let existing = self
            .bookings
            .confirmed_overlapping(owner_id, candidate_start, candidate_end)
            .await?;
        if let Some(clash) = existing.first() {
            warn!(
                owner_id,
                existing_booking = %clash.id,
                overlap_minutes = overlap_minutes(candidate_start, candidate_end, clash.start, clash.end),
                "requested slot overlaps a confirmed booking"
            );
            return Err(SlotError::SlotNoLongerAvailable);
        }

        let booking = self
            .bookings
            .insert_confirmed(NewBooking {
                event_type_id: event_type.id,
                owner_id: owner_id.to_string(),
                start: candidate_start,
                end: candidate_end,
                booker,
            })
            .await
            .inspect_err(|err| {
                if matches!(err, SlotError::SlotNoLongerAvailable) {
                    warn!(owner_id, "concurrent booking took the slot before insert");
                }
            })?;

        info!(
            booking_id = %booking.id,
            owner_id,
            start = %booking.start,
            end = %booking.end,
            "booking confirmed"
        );
        Ok(booking)
    }

    /// Reserve from the visitor's wall-clock choice: `date` as `YYYY-MM-DD`,
    /// `time` as `HH:MM`, both in `timezone`. The end is start + event duration.
    ///
    /// # Errors
    /// `InvalidFormat` / `InvalidTimezone` for malformed input, `PastDate` for a
    /// date before today, and everything [`ReservationGuard::reserve`] returns.
    pub async fn reserve_local(
        &self,
        event_type: &EventType,
        date: &str,
        time: &str,
        timezone: &str,
        booker: Booker,
    ) -> Result<Booking> {
        let tz = parse_timezone(timezone)?;
        let date = parse_date(date)?;
        let time = parse_time_of_day(time)?;

        if date < self.clock.today(tz) {
            return Err(SlotError::PastDate(date.to_string()));
        }

        let local = date
            .and_hms_opt(u32::from(time.hour()), u32::from(time.minute()), 0)
            .ok_or_else(|| SlotError::InvalidFormat(format!("{} {}", date, time)))?;
        let start = dst::localize(local, tz, DstPolicy::Skip).ok_or_else(|| {
            SlotError::InvalidFormat(format!("{} {} does not exist in {}", date, time, tz))
        })?;

        self.reserve(event_type, start, start + event_type.duration(), booker)
            .await
    }

    pub async fn cancel(&self, booking_id: Uuid) -> Result<Booking> {
        self.transition(booking_id, BookingStatus::Cancelled).await
    }

    pub async fn complete(&self, booking_id: Uuid) -> Result<Booking> {
        self.transition(booking_id, BookingStatus::Completed).await
    }

    /// Bookings of an owner, newest first. `event_type_id` narrows the list to
    /// one event type.
    pub async fn bookings_for_owner(
        &self,
        owner_id: &str,
        event_type_id: Option<Uuid>,
    ) -> Result<Vec<Booking>> {
        self.bookings.bookings_for_owner(owner_id, event_type_id).await
    }

    /// The stored status must still be the one read here when the write lands;
    /// a concurrent change surfaces as `InvalidTransition`.
    async fn transition(&self, booking_id: Uuid, next: BookingStatus) -> Result<Booking> {
        let mut booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| SlotError::BookingNotFound(booking_id.to_string()))?;
        let current = booking.status;
        booking.transition(next)?;

        let updated = self.bookings.update_status(booking_id, current, next).await?;
        info!(booking_id = %booking_id, status = %next, "booking status changed");
        Ok(updated)
    }
}
