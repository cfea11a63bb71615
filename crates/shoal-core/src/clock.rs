//! Simulated calendar.
//!
//! The day counter is the single source of truth; the year and the day
//! within the year are derived from it, never stored independently.

use serde::{Deserialize, Serialize};

/// Default number of days in a simulated year.
pub const DAYS_PER_YEAR: u32 = 365;

/// Discrete daily clock driving every yearly and sub-annual schedule.
///
/// `day` counts completed-or-current days from zero. Day `0` is the first
/// day of year `0`; the last day of a year is the one for which
/// [`is_year_end`](SimClock::is_year_end) returns `true`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    day: u64,
    days_per_year: u32,
}

impl SimClock {
    /// A clock at day zero.
    ///
    /// `days_per_year` is floored at one so the year arithmetic never
    /// divides by zero.
    pub fn new(days_per_year: u32) -> Self {
        Self {
            day: 0,
            days_per_year: days_per_year.max(1),
        }
    }

    /// Absolute day number.
    pub fn day(&self) -> u64 {
        self.day
    }

    /// Days in one simulated year.
    pub fn days_per_year(&self) -> u32 {
        self.days_per_year
    }

    /// Zero-based year containing the current day.
    pub fn year(&self) -> u32 {
        (self.day / u64::from(self.days_per_year)) as u32
    }

    /// Zero-based day within the current year.
    pub fn day_of_year(&self) -> u32 {
        (self.day % u64::from(self.days_per_year)) as u32
    }

    /// Whether the current day closes its year.
    pub fn is_year_end(&self) -> bool {
        self.day_of_year() + 1 == self.days_per_year
    }

    /// Whether an `interval`-day schedule fires on the current day.
    ///
    /// Schedules fire on the last day of each interval, so a 365-day
    /// interval on a 365-day year coincides with [`is_year_end`](Self::is_year_end).
    /// An interval of zero never fires.
    pub fn fires_every(&self, interval: u32) -> bool {
        interval != 0 && (self.day + 1) % u64::from(interval) == 0
    }

    /// Move to the next day.
    pub fn advance(&mut self) {
        self.day += 1;
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(DAYS_PER_YEAR)
    }
}
