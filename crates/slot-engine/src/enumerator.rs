//! Enumerate bookable start times for an event type.
//!
//! For a day (or a range of days) the enumerator builds the bookable-hours grid in
//! the visitor's timezone, keeps candidates whose whole span fits the owner's
//! weekly schedule, and drops those that overlap a busy calendar interval or a
//! confirmed booking. The schedule, calendar and bookings are fetched once per
//! request, never once per day.
//!
//! The result is advisory. [`crate::reservation::ReservationGuard`] re-checks at
//! commit time.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::busy::BusyTimeline;
use crate::config::{CalendarFailurePolicy, EngineConfig};
use crate::error::{Result, SlotError};
use crate::model::{BusyInterval, EventType, Schedule};
use crate::ports::{
    BookingStore, BusyQuery, CalendarProvider, Clock, ScheduleStore, SystemClock,
};
use crate::resolver::is_in_availability;
use crate::time::{format_time_of_day, parse_timezone, zoned_slot_grid};

pub struct SlotEnumerator {
    schedules: Arc<dyn ScheduleStore>,
    bookings: Arc<dyn BookingStore>,
    calendar: Arc<dyn CalendarProvider>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

/// Everything fetched for one request, reused for every date in it.
struct Resolution {
    schedule: Schedule,
    busy: BusyTimeline,
    duration_minutes: u32,
    timezone: Tz,
}

impl SlotEnumerator {
    pub fn new(
        schedules: Arc<dyn ScheduleStore>,
        bookings: Arc<dyn BookingStore>,
        calendar: Arc<dyn CalendarProvider>,
    ) -> Self {
        Self {
            schedules,
            bookings,
            calendar,
            clock: Arc::new(SystemClock),
            config: EngineConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Bookable start times on `date`, as sorted, unique `HH:MM` strings in `timezone`.
    ///
    /// # Errors
    /// Returns `SlotError::InvalidDuration` if the event type's duration is out of
    /// range and `SlotError::InvalidTimezone` for an unknown zone. A missing
    /// schedule, an inactive event type or a failed schedule fetch yield an empty
    /// list.
    pub async fn available_time_slots(
        &self,
        event_type: &EventType,
        date: NaiveDate,
        timezone: &str,
    ) -> Result<Vec<String>> {
        event_type.validate()?;
        let tz = parse_timezone(timezone)?;
        let grids = vec![(date, self.grid(date, tz))];
        let Some(resolution) = self.resolve(event_type, &grids, tz).await else {
            return Ok(Vec::new());
        };
        let (_, grid) = &grids[0];
        Ok(resolution.format_slots(grid))
    }

    /// Dates in `[start_date, end_date]` with at least one bookable slot.
    ///
    /// Dates before today (in `timezone`) are skipped.
    pub async fn available_dates(
        &self,
        event_type: &EventType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        timezone: &str,
    ) -> Result<Vec<NaiveDate>> {
        event_type.validate()?;
        let tz = parse_timezone(timezone)?;
        let today = self.clock.today(tz);

        let grids: Vec<(NaiveDate, Vec<DateTime<Utc>>)> = start_date
            .iter_days()
            .take_while(|date| *date <= end_date)
            .filter(|date| *date >= today)
            .map(|date| (date, self.grid(date, tz)))
            .collect();
        if grids.is_empty() {
            return Ok(Vec::new());
        }

        let Some(resolution) = self.resolve(event_type, &grids, tz).await else {
            return Ok(Vec::new());
        };

        Ok(grids
            .iter()
            .filter(|(_, grid)| grid.iter().any(|&t| resolution.is_bookable(t)))
            .map(|(date, _)| *date)
            .collect())
    }

    fn grid(&self, date: NaiveDate, tz: Tz) -> Vec<DateTime<Utc>> {
        zoned_slot_grid(date, tz, &self.config.grid, self.config.dst_policy)
    }

    /// Fetch the schedule, bookings and busy intervals covering every candidate.
    ///
    /// `None` means "no availability at all" for this request.
    async fn resolve(
        &self,
        event_type: &EventType,
        grids: &[(NaiveDate, Vec<DateTime<Utc>>)],
        timezone: Tz,
    ) -> Option<Resolution> {
        let owner_id = event_type.owner_id.as_str();
        if !event_type.active {
            debug!(event_type_id = %event_type.id, "event type inactive, no slots offered");
            return None;
        }

        let candidates = grids.iter().flat_map(|(_, grid)| grid.iter().copied());
        let (Some(window_start), Some(last)) = (candidates.clone().min(), candidates.max()) else {
            return None;
        };
        let window_end = last + event_type.duration();

        let schedule = match self.schedules.get_schedule(owner_id).await {
            Ok(Some(schedule)) => schedule,
            Ok(None) => {
                debug!(owner_id, "owner has no schedule, treating as zero availability");
                return None;
            }
            Err(err) => {
                warn!(owner_id, error = %err, "schedule fetch failed, treating as zero availability");
                return None;
            }
        };

        let bookings = match self
            .bookings
            .confirmed_overlapping(owner_id, window_start, window_end)
            .await
        {
            Ok(bookings) => bookings,
            Err(err) => {
                warn!(owner_id, error = %err, "booking lookup failed, offering no slots");
                return None;
            }
        };

        let calendar = match self.fetch_busy(owner_id, window_start, window_end).await {
            Ok(intervals) => intervals,
            Err(err) => match self.config.calendar_failure {
                CalendarFailurePolicy::FailOpen => {
                    warn!(owner_id, error = %err, "calendar unavailable, assuming no busy intervals");
                    Vec::new()
                }
                CalendarFailurePolicy::FailClosed => {
                    warn!(owner_id, error = %err, "calendar unavailable, offering no slots");
                    return None;
                }
            },
        };

        debug!(
            owner_id,
            busy = calendar.len(),
            bookings = bookings.len(),
            days = grids.len(),
            "resolving availability"
        );

        Some(Resolution {
            busy: BusyTimeline::build(&calendar, &bookings, window_start, window_end),
            schedule,
            duration_minutes: event_type.duration_minutes,
            timezone,
        })
    }

    /// Collect busy intervals in `[start, end)`, following page tokens.
    ///
    /// The whole listing, across all pages, is bounded by the configured
    /// timeout. A timeout is reported the same way as a provider failure.
    async fn fetch_busy(
        &self,
        owner_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>> {
        let timeout = self.config.calendar_timeout();
        tokio::time::timeout(timeout, self.fetch_pages(owner_id, start, end))
            .await
            .map_err(|_| {
                SlotError::ExternalCalendarUnavailable(format!(
                    "no response within {}ms",
                    timeout.as_millis()
                ))
            })?
    }

    async fn fetch_pages(
        &self,
        owner_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>> {
        let mut query = BusyQuery {
            start,
            end,
            max_results: self.config.calendar_page_size,
            page_token: None,
        };
        let mut intervals = Vec::new();

        for _ in 0..self.config.calendar_max_pages.max(1) {
            let page = self
                .calendar
                .list_busy_intervals(owner_id, &query)
                .await
                .map_err(|err| match err {
                    SlotError::ExternalCalendarUnavailable(_) => err,
                    other => SlotError::ExternalCalendarUnavailable(other.to_string()),
                })?;

            intervals.extend(page.intervals);
            match page.next_page_token {
                Some(token) => query.page_token = Some(token),
                None => return Ok(intervals),
            }
        }

        warn!(
            owner_id,
            fetched = intervals.len(),
            max_pages = self.config.calendar_max_pages,
            "busy interval listing truncated"
        );
        Ok(intervals)
    }
}

impl Resolution {
    fn is_bookable(&self, start: DateTime<Utc>) -> bool {
        let end = start + chrono::Duration::minutes(i64::from(self.duration_minutes));
        is_in_availability(start, self.duration_minutes, Some(&self.schedule))
            && !self.busy.overlaps(start, end)
    }

    fn format_slots(&self, grid: &[DateTime<Utc>]) -> Vec<String> {
        grid.iter()
            .filter(|&&t| self.is_bookable(t))
            .map(|&t| format_time_of_day(t, self.timezone))
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect()
    }
}
