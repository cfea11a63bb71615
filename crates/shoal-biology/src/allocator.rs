//! Spatial weights for placing recruits and resetting stocks.

use indexmap::IndexMap;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use shoal_core::CellId;
use shoal_space::Space;

use crate::error::{ProcessConfigError, ProcessError};
use crate::rounding::Rounding;

/// Absorbs floating-point error in cumulative sums before flooring.
const CUMULATIVE_SLACK: f64 = 1e-6;

/// A rule assigning a non-negative weight to every cell.
///
/// Land cells always weigh zero, whatever the variant says.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Allocator {
    /// Every water cell weighs one.
    #[default]
    Uniform,
    /// Explicit weights; unlisted cells weigh zero.
    Fixed {
        /// Weight per cell.
        weights: IndexMap<CellId, f64>,
    },
    /// The space's static habitability.
    Habitability,
    /// Fractions captured from an earlier distribution, see
    /// [`Allocator::snapshot`].
    Snapshot {
        /// Fraction per cell.
        fractions: IndexMap<CellId, f64>,
    },
    /// `inner` restricted to an inclusive row/column rectangle.
    BoundingBox {
        /// Inclusive row range.
        rows: (i32, i32),
        /// Inclusive column range.
        cols: (i32, i32),
        /// Weights inside the box.
        inner: Box<Allocator>,
    },
    /// Linear fall-off from a centre cell: `max(0, 1 - d / (radius + 1))`.
    Peak {
        /// Cell of maximum weight.
        centre: CellId,
        /// Distance at which the weight is last positive.
        radius: u32,
    },
    /// Independent uniform draw in `[min, max)` per cell.
    Random {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
}

impl Allocator {
    /// Capture the relative share of each cell in `totals`.
    ///
    /// Non-finite or negative totals count as zero. If nothing is left the
    /// snapshot is empty and every later allocation fails with
    /// [`ProcessError::NoValidCell`].
    pub fn snapshot(totals: impl IntoIterator<Item = (CellId, f64)>) -> Self {
        let totals: IndexMap<CellId, f64> = totals
            .into_iter()
            .map(|(cell, v)| (cell, if v.is_finite() && v > 0.0 { v } else { 0.0 }))
            .collect();
        let sum: f64 = totals.values().sum();
        let fractions = if sum > 0.0 {
            totals.into_iter().map(|(c, v)| (c, v / sum)).collect()
        } else {
            IndexMap::new()
        };
        Self::Snapshot { fractions }
    }

    /// Check the variant's own parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessConfigError::Negative`] for negative or non-finite
    /// fixed weights, fractions or random bounds, and
    /// [`ProcessConfigError::RateOutOfRange`] if a random range is
    /// inverted.
    pub fn validate(&self) -> Result<(), ProcessConfigError> {
        match self {
            Self::Uniform | Self::Habitability | Self::Peak { .. } => Ok(()),
            Self::Fixed { weights } => weights
                .values()
                .try_for_each(|&w| check_non_negative("allocator weight", w)),
            Self::Snapshot { fractions } => fractions
                .values()
                .try_for_each(|&w| check_non_negative("allocator fraction", w)),
            Self::BoundingBox { inner, .. } => inner.validate(),
            Self::Random { min, max } => {
                check_non_negative("random allocator min", *min)?;
                check_non_negative("random allocator max", *max)?;
                if min > max {
                    return Err(ProcessConfigError::RateOutOfRange {
                        name: "random allocator range",
                        value: *min,
                    });
                }
                Ok(())
            }
        }
    }

    /// Raw weight of one cell.
    pub fn weight(&self, cell: CellId, space: &dyn Space, rng: &mut dyn RngCore) -> f64 {
        if !space.is_water(cell) {
            return 0.0;
        }
        match self {
            Self::Uniform => 1.0,
            Self::Fixed { weights } => weights.get(&cell).copied().unwrap_or(0.0),
            Self::Habitability => space.habitability(cell),
            Self::Snapshot { fractions } => fractions.get(&cell).copied().unwrap_or(0.0),
            Self::BoundingBox { rows, cols, inner } => {
                let inside = space.coord(cell).is_some_and(|coord| {
                    coord.len() >= 2
                        && (rows.0..=rows.1).contains(&coord[0])
                        && (cols.0..=cols.1).contains(&coord[1])
                });
                if inside {
                    inner.weight(cell, space, rng)
                } else {
                    0.0
                }
            }
            Self::Peak { centre, radius } => {
                let d = space.distance(*centre, cell);
                (1.0 - d / (f64::from(*radius) + 1.0)).max(0.0)
            }
            Self::Random { min, max } => min + (max - min) * rng.random::<f64>(),
        }
    }

    /// Raw weights of `cells`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvalidWeight`] for a negative or non-finite
    /// weight.
    pub fn weights(
        &self,
        cells: &[CellId],
        space: &dyn Space,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>, ProcessError> {
        cells
            .iter()
            .map(|&cell| {
                let weight = self.weight(cell, space, rng);
                if !(weight >= 0.0) || !weight.is_finite() {
                    return Err(ProcessError::InvalidWeight { cell, weight });
                }
                Ok(weight)
            })
            .collect()
    }

    /// Weights of `cells` scaled to sum to one.
    ///
    /// # Errors
    ///
    /// As [`weights`](Self::weights), plus [`ProcessError::NoValidCell`]
    /// when every weight is zero.
    pub fn normalized_weights(
        &self,
        cells: &[CellId],
        space: &dyn Space,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>, ProcessError> {
        let mut weights = self.weights(cells, space, rng)?;
        let sum: f64 = weights.iter().sum();
        if !(sum > 0.0) {
            return Err(ProcessError::NoValidCell { what: "allocation" });
        }
        weights.iter_mut().for_each(|w| *w /= sum);
        Ok(weights)
    }

    /// Divide `total` among `cells` by normalized weight.
    ///
    /// With [`Rounding::Whole`] the total is floored and distributed by
    /// cumulative flooring, so the parts are whole and sum to it exactly.
    ///
    /// # Errors
    ///
    /// See [`normalized_weights`](Self::normalized_weights).
    pub fn apportion(
        &self,
        total: f64,
        cells: &[CellId],
        space: &dyn Space,
        rng: &mut dyn RngCore,
        rounding: Rounding,
    ) -> Result<Vec<f64>, ProcessError> {
        let weights = self.normalized_weights(cells, space, rng)?;
        Ok(split(total, &weights, rounding))
    }
}

/// Split `total` by weights that already sum to one.
pub fn split(total: f64, weights: &[f64], rounding: Rounding) -> Vec<f64> {
    let total = total.max(0.0);
    match rounding {
        Rounding::Fractional => weights.iter().map(|w| total * w).collect(),
        Rounding::Whole => {
            let total = total.floor();
            let last = weights.len().saturating_sub(1);
            let mut cumulative = 0.0;
            let mut assigned = 0.0;
            weights
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    cumulative += w;
                    let upto = if i == last {
                        total
                    } else {
                        (cumulative * total + CUMULATIVE_SLACK).floor().min(total)
                    };
                    let part = (upto - assigned).max(0.0);
                    assigned += part;
                    part
                })
                .collect()
        }
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), ProcessConfigError> {
    if !(value >= 0.0) || !value.is_finite() {
        return Err(ProcessConfigError::Negative { name, value });
    }
    Ok(())
}
