//! Shared fixtures for slot-engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use slot_engine::memory::{InMemoryStore, StaticCalendar};
use slot_engine::ports::{BusyPage, BusyQuery, CalendarProvider, FixedClock};
use slot_engine::{
    Booker, DayOfWeek, EventType, Result, Schedule, SlotEnumerator, SlotError, TimeOfDay,
    WeeklyAvailabilityWindow,
};

pub const OWNER: &str = "user_owner";

/// 2026-03-16, a Monday.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn hm(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

pub fn window(day: DayOfWeek, start: &str, end: &str) -> WeeklyAvailabilityWindow {
    WeeklyAvailabilityWindow::new(day, hm(start), hm(end)).unwrap()
}

pub fn schedule(timezone: Tz, windows: Vec<WeeklyAvailabilityWindow>) -> Schedule {
    Schedule {
        owner_id: OWNER.to_string(),
        timezone,
        windows,
    }
}

/// Monday 09:00-17:00 UTC.
pub fn monday_nine_to_five() -> Schedule {
    schedule(Tz::UTC, vec![window(DayOfWeek::Monday, "09:00", "17:00")])
}

pub fn event_type(duration_minutes: u32) -> EventType {
    EventType::new(OWNER, "Intro call", duration_minutes).unwrap()
}

pub fn booker(name: &str) -> Booker {
    Booker::new(name, format!("{}@example.com", name.to_lowercase()), None).unwrap()
}

/// Enumerator over an in-memory store with "today" pinned to 2026-03-01.
pub fn enumerator(store: Arc<InMemoryStore>, calendar: Arc<dyn CalendarProvider>) -> SlotEnumerator {
    SlotEnumerator::new(store.clone(), store, calendar)
        .with_clock(Arc::new(FixedClock(date(2026, 3, 1))))
}

pub fn store_with(schedule: Schedule) -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::with_records(vec![schedule], vec![]))
}

pub fn no_busy() -> Arc<StaticCalendar> {
    Arc::new(StaticCalendar::new())
}

/// A calendar whose every call fails.
pub struct FailingCalendar;

#[async_trait]
impl CalendarProvider for FailingCalendar {
    async fn list_busy_intervals(&self, _owner_id: &str, _query: &BusyQuery) -> Result<BusyPage> {
        Err(SlotError::ExternalCalendarUnavailable("503 from provider".to_string()))
    }
}

/// A calendar that answers only after a delay.
pub struct SlowCalendar(pub StdDuration);

#[async_trait]
impl CalendarProvider for SlowCalendar {
    async fn list_busy_intervals(&self, _owner_id: &str, _query: &BusyQuery) -> Result<BusyPage> {
        tokio::time::sleep(self.0).await;
        Ok(BusyPage::default())
    }
}

/// Answers every page after a delay and always claims another page follows.
pub struct SlowPages(pub StdDuration);

#[async_trait]
impl CalendarProvider for SlowPages {
    async fn list_busy_intervals(&self, _owner_id: &str, _query: &BusyQuery) -> Result<BusyPage> {
        tokio::time::sleep(self.0).await;
        Ok(BusyPage {
            intervals: Vec::new(),
            next_page_token: Some("more".to_string()),
        })
    }
}
