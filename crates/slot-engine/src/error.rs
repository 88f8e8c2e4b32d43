//! Error types for slot-engine operations.

use thiserror::Error;

use crate::overlap::OverlapConflict;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlotError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid availability window: {0}")]
    InvalidWindow(String),

    #[error("Invalid event duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid booker details: {0}")]
    InvalidBooker(String),

    #[error("Schedule has overlapping windows on {} day(s)", .0.len())]
    ScheduleConflict(Vec<OverlapConflict>),

    #[error("The selected time slot is no longer available")]
    SlotNoLongerAvailable,

    #[error("Event type {0} is not currently available for booking")]
    EventTypeInactive(String),

    #[error("Date {0} is in the past")]
    PastDate(String),

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Invalid booking status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("External calendar unavailable: {0}")]
    ExternalCalendarUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, SlotError>;
