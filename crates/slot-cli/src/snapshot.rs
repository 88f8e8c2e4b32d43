//! A JSON file holding everything the engine needs for one run: owner schedules,
//! event types, external busy time and existing bookings.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use slot_engine::memory::{InMemoryStore, StaticCalendar};
use slot_engine::{Booking, BusyInterval, EventType, SchedulePayload, ScheduleService};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerSchedule {
    pub owner_id: String,
    #[serde(flatten)]
    pub schedule: SchedulePayload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub schedules: Vec<OwnerSchedule>,
    #[serde(default)]
    pub event_types: Vec<EventType>,
    /// External calendar busy intervals, keyed by owner.
    #[serde(default)]
    pub busy: HashMap<String, Vec<BusyInterval>>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
}

/// Stores and calendar populated from a snapshot.
pub struct Loaded {
    pub store: Arc<InMemoryStore>,
    pub calendar: Arc<StaticCalendar>,
}

impl Snapshot {
    /// Read a snapshot and check every event type it carries.
    pub fn read(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path))?;
        let snapshot: Snapshot =
            serde_json::from_str(&raw).with_context(|| format!("Invalid snapshot: {}", path))?;
        for event_type in &snapshot.event_types {
            event_type
                .validate()
                .with_context(|| format!("Invalid event type: {}", event_type.id))?;
        }
        Ok(snapshot)
    }

    pub fn write(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write snapshot: {}", path))
    }

    pub fn event_type(&self, id: Uuid) -> Result<&EventType> {
        self.event_types
            .iter()
            .find(|e| e.id == id)
            .with_context(|| format!("Unknown event type: {}", id))
    }

    /// Build the in-memory stores. Every schedule passes the same validation as
    /// an owner's save.
    pub async fn load(&self) -> Result<Loaded> {
        let store = Arc::new(InMemoryStore::with_records(Vec::new(), self.bookings.clone()));

        let schedules = ScheduleService::new(store.clone());
        for owner in &self.schedules {
            schedules
                .save(&owner.owner_id, &owner.schedule)
                .await
                .with_context(|| format!("Invalid schedule for owner '{}'", owner.owner_id))?;
        }

        let calendar = self
            .busy
            .iter()
            .fold(StaticCalendar::new(), |calendar, (owner, intervals)| {
                calendar.with_busy(owner.clone(), intervals.clone())
            });

        Ok(Loaded {
            store,
            calendar: Arc::new(calendar),
        })
    }

    /// Replace a booking by id, or append it if new.
    pub fn upsert_booking(&mut self, booking: Booking) {
        match self.bookings.iter_mut().find(|b| b.id == booking.id) {
            Some(existing) => *existing = booking,
            None => self.bookings.push(booking),
        }
    }
}
