//! Tests for the booking reservation guard.

mod support;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slot_engine::memory::InMemoryStore;
use slot_engine::model::NewBooking;
use slot_engine::ports::{BookingStore, FixedClock};
use slot_engine::{Booking, BookingStatus, ReservationGuard, Result, SlotError};
use support::*;
use uuid::Uuid;

fn guard(store: Arc<InMemoryStore>) -> ReservationGuard {
    ReservationGuard::new(store).with_clock(Arc::new(FixedClock(date(2026, 3, 1))))
}

#[tokio::test]
async fn free_slot_is_booked_as_confirmed() {
    let store = Arc::new(InMemoryStore::new());
    let guard = guard(store.clone());
    let event = event_type(30);

    let booking = guard
        .reserve(
            &event,
            utc(2026, 3, 16, 10, 0),
            utc(2026, 3, 16, 10, 30),
            booker("Ada"),
        )
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.owner_id, OWNER);
    assert_eq!(booking.event_type_id, event.id);
    assert_eq!(store.get_booking(booking.id).await.unwrap(), Some(booking));
}

#[tokio::test]
async fn overlapping_confirmed_booking_rejects_reservation() {
    let guard = guard(Arc::new(InMemoryStore::new()));
    let event = event_type(30);
    guard
        .reserve(&event, utc(2026, 3, 16, 10, 0), utc(2026, 3, 16, 10, 30), booker("Ada"))
        .await
        .unwrap();

    let result = guard
        .reserve(&event, utc(2026, 3, 16, 10, 15), utc(2026, 3, 16, 10, 45), booker("Bob"))
        .await;

    assert_eq!(result, Err(SlotError::SlotNoLongerAvailable));
}

#[tokio::test]
async fn back_to_back_bookings_are_allowed() {
    let guard = guard(Arc::new(InMemoryStore::new()));
    let event = event_type(30);
    guard
        .reserve(&event, utc(2026, 3, 16, 10, 0), utc(2026, 3, 16, 10, 30), booker("Ada"))
        .await
        .unwrap();

    let next = guard
        .reserve(&event, utc(2026, 3, 16, 10, 30), utc(2026, 3, 16, 11, 0), booker("Bob"))
        .await;

    assert!(next.is_ok());
}

#[tokio::test]
async fn cancelled_booking_frees_its_slot() {
    let guard = guard(Arc::new(InMemoryStore::new()));
    let event = event_type(30);
    let first = guard
        .reserve(&event, utc(2026, 3, 16, 10, 0), utc(2026, 3, 16, 10, 30), booker("Ada"))
        .await
        .unwrap();
    guard.cancel(first.id).await.unwrap();

    let again = guard
        .reserve(&event, utc(2026, 3, 16, 10, 0), utc(2026, 3, 16, 10, 30), booker("Bob"))
        .await;

    assert!(again.is_ok());
}

#[tokio::test]
async fn other_owners_bookings_do_not_block() {
    let guard = guard(Arc::new(InMemoryStore::new()));
    let mine = event_type(30);
    let mut theirs = event_type(30);
    theirs.owner_id = "user_other".to_string();

    guard
        .reserve(&theirs, utc(2026, 3, 16, 10, 0), utc(2026, 3, 16, 10, 30), booker("Ada"))
        .await
        .unwrap();

    assert!(guard
        .reserve(&mine, utc(2026, 3, 16, 10, 0), utc(2026, 3, 16, 10, 30), booker("Bob"))
        .await
        .is_ok());
}

#[tokio::test]
async fn inactive_event_type_cannot_be_booked() {
    let guard = guard(Arc::new(InMemoryStore::new()));
    let mut event = event_type(30);
    event.active = false;

    let result = guard
        .reserve(&event, utc(2026, 3, 16, 10, 0), utc(2026, 3, 16, 10, 30), booker("Ada"))
        .await;

    assert!(matches!(result, Err(SlotError::EventTypeInactive(_))));
}

#[tokio::test]
async fn out_of_range_duration_cannot_be_booked() {
    let guard = guard(Arc::new(InMemoryStore::new()));

    let mut one_minute = event_type(30);
    one_minute.duration_minutes = 1;
    let result = guard
        .reserve(&one_minute, utc(2026, 3, 16, 9, 0), utc(2026, 3, 16, 9, 1), booker("Ada"))
        .await;
    assert!(matches!(result, Err(SlotError::InvalidDuration(_))));

    let mut over_a_day = event_type(30);
    over_a_day.duration_minutes = 1445;
    let result = guard
        .reserve_local(&over_a_day, "2026-03-16", "09:00", "UTC", booker("Ada"))
        .await;
    assert!(matches!(result, Err(SlotError::InvalidDuration(_))));
}

#[tokio::test]
async fn empty_span_is_rejected() {
    let guard = guard(Arc::new(InMemoryStore::new()));

    let result = guard
        .reserve(
            &event_type(30),
            utc(2026, 3, 16, 10, 0),
            utc(2026, 3, 16, 10, 0),
            booker("Ada"),
        )
        .await;

    assert!(matches!(result, Err(SlotError::InvalidDuration(_))));
}

// ── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reservations_of_one_slot_admit_exactly_one() {
    let guard = Arc::new(guard(Arc::new(InMemoryStore::new())));
    let event = event_type(30);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let guard = guard.clone();
            let event = event.clone();
            tokio::spawn(async move {
                guard
                    .reserve(
                        &event,
                        utc(2026, 3, 16, 10, 0),
                        utc(2026, 3, 16, 10, 30),
                        booker(&format!("Visitor{}", i)),
                    )
                    .await
            })
        })
        .collect();

    let mut successes = 0;
    let mut rejections = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(SlotError::SlotNoLongerAvailable) => rejections += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(rejections, 7);
}

/// A store whose pre-check never sees existing bookings, as when two requests
/// both read before either writes.
struct StaleReads(InMemoryStore);

#[async_trait]
impl BookingStore for StaleReads {
    async fn confirmed_overlapping(
        &self,
        _owner_id: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        Ok(Vec::new())
    }

    async fn insert_confirmed(&self, booking: NewBooking) -> Result<Booking> {
        self.0.insert_confirmed(booking).await
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        self.0.get_booking(id).await
    }

    async fn update_status(&self, id: Uuid, from: BookingStatus, to: BookingStatus) -> Result<Booking> {
        self.0.update_status(id, from, to).await
    }

    async fn bookings_for_owner(
        &self,
        owner_id: &str,
        event_type_id: Option<Uuid>,
    ) -> Result<Vec<Booking>> {
        self.0.bookings_for_owner(owner_id, event_type_id).await
    }
}

#[tokio::test]
async fn store_exclusion_catches_what_the_precheck_missed() {
    let guard = ReservationGuard::new(Arc::new(StaleReads(InMemoryStore::new())));
    let event = event_type(30);

    guard
        .reserve(&event, utc(2026, 3, 16, 10, 0), utc(2026, 3, 16, 10, 30), booker("Ada"))
        .await
        .unwrap();
    let second = guard
        .reserve(&event, utc(2026, 3, 16, 10, 0), utc(2026, 3, 16, 10, 30), booker("Bob"))
        .await;

    assert_eq!(second, Err(SlotError::SlotNoLongerAvailable));
}

/// A store that is down.
struct Unreachable;

#[async_trait]
impl BookingStore for Unreachable {
    async fn confirmed_overlapping(
        &self,
        _owner_id: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        Err(SlotError::Storage("connection refused".to_string()))
    }

    async fn insert_confirmed(&self, _booking: NewBooking) -> Result<Booking> {
        Err(SlotError::Storage("connection refused".to_string()))
    }

    async fn get_booking(&self, _id: Uuid) -> Result<Option<Booking>> {
        Err(SlotError::Storage("connection refused".to_string()))
    }

    async fn update_status(
        &self,
        _id: Uuid,
        _from: BookingStatus,
        _to: BookingStatus,
    ) -> Result<Booking> {
        Err(SlotError::Storage("connection refused".to_string()))
    }

    async fn bookings_for_owner(
        &self,
        _owner_id: &str,
        _event_type_id: Option<Uuid>,
    ) -> Result<Vec<Booking>> {
        Err(SlotError::Storage("connection refused".to_string()))
    }
}

#[tokio::test]
async fn storage_failures_surface_unchanged() {
    let guard = ReservationGuard::new(Arc::new(Unreachable));

    let reserve = guard
        .reserve(&event_type(30), utc(2026, 3, 16, 10, 0), utc(2026, 3, 16, 10, 30), booker("Ada"))
        .await;
    assert!(matches!(reserve, Err(SlotError::Storage(_))));

    let cancel = guard.cancel(Uuid::new_v4()).await;
    assert!(matches!(cancel, Err(SlotError::Storage(_))));
}

// ── Local wall-clock input ──────────────────────────────────────────────────

#[tokio::test]
async fn local_choice_is_converted_to_utc() {
    let guard = guard(Arc::new(InMemoryStore::new()));
    let event = event_type(45);

    let booking = guard
        .reserve_local(&event, "2026-03-16", "9:30", "America/New_York", booker("Ada"))
        .await
        .unwrap();

    // 09:30 EDT == 13:30 UTC
    assert_eq!(booking.start, utc(2026, 3, 16, 13, 30));
    assert_eq!(booking.end, utc(2026, 3, 16, 14, 15));
}

#[tokio::test]
async fn local_choice_validates_input() {
    let guard = guard(Arc::new(InMemoryStore::new()));
    let event = event_type(30);

    let bad_time = guard
        .reserve_local(&event, "2026-03-16", "25:00", "UTC", booker("Ada"))
        .await;
    assert!(matches!(bad_time, Err(SlotError::InvalidFormat(_))));

    let bad_date = guard
        .reserve_local(&event, "16.03.2026", "10:00", "UTC", booker("Ada"))
        .await;
    assert!(matches!(bad_date, Err(SlotError::InvalidFormat(_))));

    let bad_zone = guard
        .reserve_local(&event, "2026-03-16", "10:00", "Nowhere/City", booker("Ada"))
        .await;
    assert!(matches!(bad_zone, Err(SlotError::InvalidTimezone(_))));

    let past = guard
        .reserve_local(&event, "2026-02-27", "10:00", "UTC", booker("Ada"))
        .await;
    assert!(matches!(past, Err(SlotError::PastDate(_))));
}

#[tokio::test]
async fn local_choice_inside_dst_gap_is_rejected() {
    let guard = guard(Arc::new(InMemoryStore::new()));

    let result = guard
        .reserve_local(
            &event_type(30),
            "2026-03-08",
            "02:30",
            "America/New_York",
            booker("Ada"),
        )
        .await;

    assert!(matches!(result, Err(SlotError::InvalidFormat(_))));
}

// ── Status changes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn confirmed_booking_can_be_completed_once() {
    let guard = guard(Arc::new(InMemoryStore::new()));
    let booking = guard
        .reserve(&event_type(30), utc(2026, 3, 16, 10, 0), utc(2026, 3, 16, 10, 30), booker("Ada"))
        .await
        .unwrap();

    let completed = guard.complete(booking.id).await.unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    let again = guard.cancel(booking.id).await;
    assert_eq!(
        again,
        Err(SlotError::InvalidTransition {
            from: "completed".to_string(),
            to: "cancelled".to_string(),
        })
    );
}

#[tokio::test]
async fn unknown_booking_cannot_change_status() {
    let guard = guard(Arc::new(InMemoryStore::new()));
    let result = guard.cancel(Uuid::new_v4()).await;
    assert!(matches!(result, Err(SlotError::BookingNotFound(_))));
}

#[tokio::test]
async fn owner_bookings_are_listed_newest_first() {
    let guard = guard(Arc::new(InMemoryStore::new()));
    let event = event_type(30);
    for hour in [9, 14, 11] {
        guard
            .reserve(&event, utc(2026, 3, 16, hour, 0), utc(2026, 3, 16, hour, 30), booker("Ada"))
            .await
            .unwrap();
    }

    let starts: Vec<DateTime<Utc>> = guard
        .bookings_for_owner(OWNER, None)
        .await
        .unwrap()
        .iter()
        .map(|b| b.start)
        .collect();

    assert_eq!(
        starts,
        vec![
            utc(2026, 3, 16, 14, 0),
            utc(2026, 3, 16, 11, 0),
            utc(2026, 3, 16, 9, 0)
        ]
    );
}

#[tokio::test]
async fn owner_bookings_can_be_narrowed_to_one_event_type() {
    let guard = guard(Arc::new(InMemoryStore::new()));
    let intro = event_type(30);
    let review = event_type(60);
    guard
        .reserve(&intro, utc(2026, 3, 16, 9, 0), utc(2026, 3, 16, 9, 30), booker("Ada"))
        .await
        .unwrap();
    guard
        .reserve(&review, utc(2026, 3, 16, 10, 0), utc(2026, 3, 16, 11, 0), booker("Bob"))
        .await
        .unwrap();
    guard
        .reserve(&intro, utc(2026, 3, 16, 13, 0), utc(2026, 3, 16, 13, 30), booker("Cy"))
        .await
        .unwrap();

    let intros = guard.bookings_for_owner(OWNER, Some(intro.id)).await.unwrap();
    assert_eq!(intros.len(), 2);
    assert!(intros.iter().all(|b| b.event_type_id == intro.id));
    assert_eq!(intros[0].start, utc(2026, 3, 16, 13, 0));

    let reviews = guard.bookings_for_owner(OWNER, Some(review.id)).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].booker.name, "Bob");

    let none = guard.bookings_for_owner(OWNER, Some(Uuid::new_v4())).await.unwrap();
    assert!(none.is_empty());
    assert_eq!(guard.bookings_for_owner(OWNER, None).await.unwrap().len(), 3);
}

/// A store whose reads still show every booking as confirmed, as when a second
/// request read the booking before the first changed it.
struct StaleStatus(InMemoryStore);

#[async_trait]
impl BookingStore for StaleStatus {
    async fn confirmed_overlapping(
        &self,
        owner_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        self.0.confirmed_overlapping(owner_id, start, end).await
    }

    async fn insert_confirmed(&self, booking: NewBooking) -> Result<Booking> {
        self.0.insert_confirmed(booking).await
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        Ok(self.0.get_booking(id).await?.map(|mut booking| {
            booking.status = BookingStatus::Confirmed;
            booking
        }))
    }

    async fn update_status(&self, id: Uuid, from: BookingStatus, to: BookingStatus) -> Result<Booking> {
        self.0.update_status(id, from, to).await
    }

    async fn bookings_for_owner(
        &self,
        owner_id: &str,
        event_type_id: Option<Uuid>,
    ) -> Result<Vec<Booking>> {
        self.0.bookings_for_owner(owner_id, event_type_id).await
    }
}

#[tokio::test]
async fn racing_status_changes_commit_only_once() {
    let store = Arc::new(StaleStatus(InMemoryStore::new()));
    let guard = ReservationGuard::new(store.clone());
    let booking = guard
        .reserve(&event_type(30), utc(2026, 3, 16, 10, 0), utc(2026, 3, 16, 10, 30), booker("Ada"))
        .await
        .unwrap();

    let cancelled = guard.cancel(booking.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    let completed = guard.complete(booking.id).await;
    assert_eq!(
        completed,
        Err(SlotError::InvalidTransition {
            from: "cancelled".to_string(),
            to: "completed".to_string(),
        })
    );

    let stored = store.0.get_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Cancelled);
}
