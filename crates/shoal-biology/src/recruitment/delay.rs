//! Recruitment batches that surface a fixed number of years late.

use std::collections::BTreeMap;

use tracing::debug;

/// Queue of recruit batches keyed by the year they become visible.
///
/// A batch submitted in year `y` is released in year `y + years`. Batches
/// for the same target year add up. With `years == 0` a batch is released
/// in the year it was submitted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecruitmentDelay {
    years: u32,
    pending: BTreeMap<u32, f64>,
}

impl RecruitmentDelay {
    /// An empty queue.
    pub fn new(years: u32) -> Self {
        Self {
            years,
            pending: BTreeMap::new(),
        }
    }

    /// A queue pre-filled so that `backlog[i]` is released in year `i`.
    ///
    /// Covers the first years of a run, before any batch computed in the
    /// simulation itself can arrive.
    pub fn with_backlog(years: u32, backlog: impl IntoIterator<Item = f64>) -> Self {
        let mut delay = Self::new(years);
        for (year, batch) in (0u32..).zip(backlog) {
            *delay.pending.entry(year).or_insert(0.0) += batch.max(0.0);
        }
        delay
    }

    /// Delay in years.
    pub fn years(&self) -> u32 {
        self.years
    }

    /// Queue a batch computed in `year`.
    pub fn submit(&mut self, year: u32, batch: f64) {
        let target = year.saturating_add(self.years);
        let batch = batch.max(0.0);
        *self.pending.entry(target).or_insert(0.0) += batch;
        if self.years > 0 {
            debug!(year, target, batch, "recruit batch queued");
        }
    }

    /// Remove and sum every batch due in or before `year`.
    pub fn release(&mut self, year: u32) -> f64 {
        let later = match year.checked_add(1) {
            Some(next) => self.pending.split_off(&next),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.pending, later);
        due.values().sum()
    }

    /// Recruits queued but not yet released.
    pub fn pending_total(&self) -> f64 {
        self.pending.values().sum()
    }

    /// Target year and size of each queued batch, soonest first.
    pub fn pending(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.pending.iter().map(|(&y, &b)| (y, b))
    }
}
