//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::ports::DEFAULT_CALENDAR_PAGE_SIZE;
use crate::time::SlotGrid;

/// What the enumerator does when the external calendar fails or times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarFailurePolicy {
    /// Treat the failure as "no busy intervals". Can overbook if the calendar
    /// holds commitments the booking store does not know about.
    #[default]
    FailOpen,
    /// Offer no slots until the calendar answers.
    FailClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub grid: SlotGrid,
    pub dst_policy: DstPolicy,
    /// Upper bound on the whole busy-interval listing, across all pages.
    pub calendar_timeout_ms: u64,
    pub calendar_failure: CalendarFailurePolicy,
    pub calendar_page_size: usize,
    /// Pages followed before accepting truncation.
    pub calendar_max_pages: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid: SlotGrid::default(),
            dst_policy: DstPolicy::default(),
            calendar_timeout_ms: 5_000,
            calendar_failure: CalendarFailurePolicy::default(),
            calendar_page_size: DEFAULT_CALENDAR_PAGE_SIZE,
            calendar_max_pages: 4,
        }
    }
}

impl EngineConfig {
    pub fn calendar_timeout(&self) -> Duration {
        Duration::from_millis(self.calendar_timeout_ms)
    }
}
