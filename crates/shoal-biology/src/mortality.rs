//! Natural mortality.
//!
//! Both variants scale counts down by a survival factor per subdivision
//! and never raise a count. The exponential variant reads `M` from the
//! species' meristics; the proportional variant carries its own annual
//! proportion.

use serde::{Deserialize, Serialize};
use shoal_core::clock::DAYS_PER_YEAR;
use shoal_core::{Meristics, StructuredAbundance};

use crate::error::ProcessConfigError;
use crate::rounding::Rounding;

/// How natural mortality removes individuals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NaturalMortality {
    /// `count ← count × exp(−M × elapsed / 365)`, `M` per subdivision.
    Exponential,
    /// `count ← count × (1 − annual)^(elapsed / 365)`.
    Proportional {
        /// Fraction of the population dying over a full year.
        annual: f64,
    },
}

impl NaturalMortality {
    /// Proportional mortality with a validated annual proportion.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessConfigError::RateOutOfRange`] unless
    /// `0 <= annual <= 1`.
    pub fn proportional(annual: f64) -> Result<Self, ProcessConfigError> {
        let process = Self::Proportional { annual };
        process.validate_rate()?;
        Ok(process)
    }

    fn validate_rate(&self) -> Result<(), ProcessConfigError> {
        if let Self::Proportional { annual } = *self {
            if !(0.0..=1.0).contains(&annual) {
                return Err(ProcessConfigError::RateOutOfRange {
                    name: "annual mortality",
                    value: annual,
                });
            }
        }
        Ok(())
    }

    /// Check the process against a species before the first tick.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessConfigError`] if the proportion is out of range or
    /// the meristics lack a mortality rate for a subdivision.
    pub fn validate(&self, meristics: &Meristics) -> Result<(), ProcessConfigError> {
        self.validate_rate()?;
        if matches!(self, Self::Exponential) {
            for subdivision in 0..meristics.subdivisions() {
                if meristics.mortality(subdivision).is_none() {
                    return Err(ProcessConfigError::MissingSubdivision {
                        process: "exponential mortality",
                        subdivision,
                        subdivisions: meristics.subdivisions(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Survival factor of `subdivision` over `elapsed_days`.
    pub fn survival(&self, meristics: &Meristics, subdivision: usize, elapsed_days: u32) -> f64 {
        let years = f64::from(elapsed_days) / f64::from(DAYS_PER_YEAR);
        match *self {
            Self::Exponential => {
                let m = meristics.mortality(subdivision).unwrap_or(0.0);
                (-m * years).exp()
            }
            Self::Proportional { annual } => (1.0 - annual).powf(years),
        }
    }

    /// Remove the individuals that die of natural causes over
    /// `elapsed_days`.
    ///
    /// Subdivisions of the abundance beyond those in the meristics are left
    /// untouched. No count ever increases.
    pub fn cull(
        &self,
        meristics: &Meristics,
        abundance: &mut StructuredAbundance,
        elapsed_days: u32,
        rounding: Rounding,
    ) {
        let subdivisions = abundance.subdivisions().min(meristics.subdivisions());
        for subdivision in 0..subdivisions {
            let survival = self.survival(meristics, subdivision, elapsed_days);
            abundance.update_subdivision(subdivision, |row| {
                for count in row.iter_mut() {
                    *count = rounding.survivors(*count * survival).min(*count);
                }
            });
        }
    }
}
