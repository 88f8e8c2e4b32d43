//! In-process implementations of the collaborator ports.
//!
//! `InMemoryStore` keeps schedules and bookings behind async mutexes; the
//! overlap check and the insert of a confirmed booking happen under one lock, which
//! is the in-process equivalent of a storage-level exclusion constraint.
//! `StaticCalendar` serves a fixed set of busy intervals with offset paging.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Result, SlotError};
use crate::model::{Booking, BookingStatus, BusyInterval, NewBooking, Schedule};
use crate::ports::{BookingStore, BusyPage, BusyQuery, CalendarProvider, ScheduleStore};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    schedules: Mutex<HashMap<String, Schedule>>,
    bookings: Mutex<Vec<Booking>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing records. Bookings are taken as-is, without overlap checks.
    pub fn with_records(schedules: Vec<Schedule>, bookings: Vec<Booking>) -> Self {
        Self {
            schedules: Mutex::new(
                schedules
                    .into_iter()
                    .map(|s| (s.owner_id.clone(), s))
                    .collect(),
            ),
            bookings: Mutex::new(bookings),
        }
    }
}

#[async_trait]
impl ScheduleStore for InMemoryStore {
    async fn get_schedule(&self, owner_id: &str) -> Result<Option<Schedule>> {
        Ok(self.schedules.lock().await.get(owner_id).cloned())
    }

    async fn replace_schedule(&self, schedule: Schedule) -> Result<Schedule> {
        self.schedules
            .lock()
            .await
            .insert(schedule.owner_id.clone(), schedule.clone());
        Ok(schedule)
    }
}

fn is_confirmed_overlap(b: &Booking, owner_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    b.owner_id == owner_id && b.status == BookingStatus::Confirmed && b.overlaps(start, end)
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn confirmed_overlapping(
        &self,
        owner_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        Ok(self
            .bookings
            .lock()
            .await
            .iter()
            .filter(|b| is_confirmed_overlap(b, owner_id, start, end))
            .cloned()
            .collect())
    }

    async fn insert_confirmed(&self, booking: NewBooking) -> Result<Booking> {
        let mut bookings = self.bookings.lock().await;
        if bookings
            .iter()
            .any(|b| is_confirmed_overlap(b, &booking.owner_id, booking.start, booking.end))
        {
            return Err(SlotError::SlotNoLongerAvailable);
        }
        let booking = Booking::confirmed(booking, Utc::now());
        bookings.push(booking.clone());
        Ok(booking)
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        Ok(self.bookings.lock().await.iter().find(|b| b.id == id).cloned())
    }

    async fn update_status(&self, id: Uuid, from: BookingStatus, to: BookingStatus) -> Result<Booking> {
        let mut bookings = self.bookings.lock().await;
        let booking = bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| SlotError::BookingNotFound(id.to_string()))?;
        if booking.status != from {
            return Err(SlotError::InvalidTransition {
                from: booking.status.to_string(),
                to: to.to_string(),
            });
        }
        booking.transition(to)?;
        Ok(booking.clone())
    }

    async fn bookings_for_owner(
        &self,
        owner_id: &str,
        event_type_id: Option<Uuid>,
    ) -> Result<Vec<Booking>> {
        let mut owned: Vec<Booking> = self
            .bookings
            .lock()
            .await
            .iter()
            .filter(|b| b.owner_id == owner_id)
            .filter(|b| event_type_id.is_none_or(|id| b.event_type_id == id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.start.cmp(&a.start));
        Ok(owned)
    }
}

/// A calendar with a fixed set of busy intervals per owner.
#[derive(Debug, Default)]
pub struct StaticCalendar {
    busy: HashMap<String, Vec<BusyInterval>>,
    calls: AtomicUsize,
}

impl StaticCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_busy(mut self, owner_id: impl Into<String>, intervals: Vec<BusyInterval>) -> Self {
        self.busy.entry(owner_id.into()).or_default().extend(intervals);
        self
    }

    /// Number of page requests served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarProvider for StaticCalendar {
    async fn list_busy_intervals(&self, owner_id: &str, query: &BusyQuery) -> Result<BusyPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let offset = match &query.page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| SlotError::ExternalCalendarUnavailable(format!("bad page token '{}'", token)))?,
            None => 0,
        };

        // Partial intervals are passed through; the engine decides what to do with them.
        let matching: Vec<BusyInterval> = self
            .busy
            .get(owner_id)
            .map(|intervals| {
                intervals
                    .iter()
                    .filter(|i| match i.bounds() {
                        Some((start, end)) => start < query.end && end > query.start,
                        None => true,
                    })
                    .copied()
                    .collect()
            })
            .unwrap_or_default();

        let page_size = query.max_results.max(1);
        let page: Vec<BusyInterval> = matching.iter().skip(offset).take(page_size).copied().collect();
        let next = offset + page.len();
        Ok(BusyPage {
            intervals: page,
            next_page_token: (next < matching.len()).then(|| next.to_string()),
        })
    }
}
