//! Aging: moving individuals from one bin to the next.

use shoal_core::{Meristics, StructuredAbundance};

use crate::error::ProcessConfigError;
use crate::growth::GrowthTransition;
use crate::rounding::Rounding;

/// How individuals advance through the age or size bins.
///
/// None of the variants touch recruitment: bin 0 is refilled by the
/// recruitment step, not here.
#[derive(Clone, Debug, PartialEq)]
pub enum Aging {
    /// Every individual moves up exactly one bin.
    ///
    /// With `plus_group` the oldest bin keeps its survivors and receives
    /// the next-oldest; without it the oldest cohort dies off.
    Standard {
        /// Whether the oldest bin accumulates.
        plus_group: bool,
    },
    /// A fraction `proportion` of each bin moves up one bin per call.
    Proportional {
        /// Fraction moving per call, in `[0, 1]`.
        proportion: f64,
        /// Whether the oldest bin keeps the fraction that would leave it.
        plus_group: bool,
    },
    /// Individuals spread over larger length bins by a transition matrix.
    LengthTransition(GrowthTransition),
}

impl Aging {
    /// Proportional aging with a validated proportion.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessConfigError::RateOutOfRange`] unless
    /// `0 <= proportion <= 1`.
    pub fn proportional(proportion: f64, plus_group: bool) -> Result<Self, ProcessConfigError> {
        if !(0.0..=1.0).contains(&proportion) {
            return Err(ProcessConfigError::RateOutOfRange {
                name: "aging proportion",
                value: proportion,
            });
        }
        Ok(Self::Proportional {
            proportion,
            plus_group,
        })
    }

    /// Length-transition aging built from the species' growth curves.
    ///
    /// # Errors
    ///
    /// See [`GrowthTransition::from_meristics`].
    pub fn length_transition(
        meristics: &Meristics,
        size_sd: f64,
        scaling: f64,
    ) -> Result<Self, ProcessConfigError> {
        GrowthTransition::from_meristics(meristics, size_sd, scaling).map(Self::LengthTransition)
    }

    /// Check the process against a species.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessConfigError::BinMismatch`] if a transition matrix
    /// was built for a different number of bins.
    pub fn validate(&self, meristics: &Meristics) -> Result<(), ProcessConfigError> {
        if let Self::LengthTransition(t) = self {
            if t.bins() != meristics.bins() {
                return Err(ProcessConfigError::BinMismatch {
                    name: "transition matrix",
                    expected: meristics.bins(),
                    actual: t.bins(),
                });
            }
        }
        Ok(())
    }

    /// Age every subdivision of `abundance` in place.
    pub fn age(&self, abundance: &mut StructuredAbundance, rounding: Rounding) {
        match self {
            Self::Standard { plus_group } => {
                for subdivision in 0..abundance.subdivisions() {
                    abundance.update_subdivision(subdivision, |row| shift(row, *plus_group));
                }
            }
            Self::Proportional {
                proportion,
                plus_group,
            } => {
                for subdivision in 0..abundance.subdivisions() {
                    abundance.update_subdivision(subdivision, |row| {
                        shift_fraction(row, *proportion, *plus_group, rounding)
                    });
                }
            }
            Self::LengthTransition(transition) => transition.apply(abundance, rounding),
        }
    }
}

fn shift(row: &mut [f64], plus_group: bool) {
    let last = row.len() - 1;
    if last == 0 {
        if !plus_group {
            row[0] = 0.0;
        }
        return;
    }
    let oldest = row[last];
    row.copy_within(0..last, 1);
    row[0] = 0.0;
    if plus_group {
        row[last] += oldest;
    }
}

fn shift_fraction(row: &mut [f64], proportion: f64, plus_group: bool, rounding: Rounding) {
    let last = row.len() - 1;
    let mut incoming = 0.0;
    for bin in 0..row.len() {
        let leaving = if bin == last && plus_group {
            0.0
        } else {
            rounding.transfer(row[bin] * proportion)
        };
        row[bin] = row[bin] - leaving + incoming;
        incoming = leaving;
    }
}
