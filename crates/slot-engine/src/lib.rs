//! # slot-engine
//!
//! Availability resolution for meeting schedulers.
//!
//! Owners publish a recurring weekly schedule in their own timezone; visitors ask
//! which start times are bookable for an event type and then reserve one. The
//! engine turns the weekly schedule, external calendar busy time and existing
//! confirmed bookings into an exact set of bookable slots, and guards the final
//! write against double-booking.
//!
//! ## Modules
//!
//! - [`time`]: weekdays, `HH:MM` times, date/zone parsing, the slot grid
//! - [`dst`]: DST gap and overlap handling for wall-clock candidates
//! - [`overlap`]: Detect overlapping weekly windows before a schedule is saved
//! - [`resolver`]: Does a candidate meeting fit inside one weekly window
//! - [`conflict`]: Does a candidate overlap a busy calendar interval
//! - [`busy`]: Merge busy sources into one sorted timeline
//! - [`enumerator`]: Bookable times for a day, bookable dates for a range
//! - [`reservation`]: Race-safe final check and booking state changes
//! - [`schedule`]: Validate and replace an owner's schedule
//! - [`ports`]: Store, calendar and clock traits supplied by the host
//! - [`memory`]: In-process port implementations
//! - [`config`]: Engine configuration
//! - [`error`]: Error types

pub mod busy;
pub mod config;
pub mod conflict;
pub mod dst;
pub mod enumerator;
pub mod error;
pub mod memory;
pub mod model;
pub mod overlap;
pub mod ports;
pub mod reservation;
pub mod resolver;
pub mod schedule;
pub mod time;

pub use config::{CalendarFailurePolicy, EngineConfig};
pub use conflict::has_conflict;
pub use enumerator::SlotEnumerator;
pub use error::{Result, SlotError};
pub use model::{
    Booker, Booking, BookingStatus, BusyInterval, EventType, Schedule, WeeklyAvailabilityWindow,
    WindowInput,
};
pub use overlap::{detect_overlaps, detect_overlaps_in, overlap_warnings, OverlapConflict, OverlapReport};
pub use reservation::ReservationGuard;
pub use resolver::is_in_availability;
pub use schedule::{SchedulePayload, ScheduleService};
pub use time::{parse_time_of_day, DayOfWeek, TimeOfDay};
