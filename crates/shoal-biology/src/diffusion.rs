//! Movement of individuals between neighbouring cells.
//!
//! Diffusion is computed pair-wise over unordered Moore-neighbour pairs.
//! Every flow is a function of the counts frozen at the start of the
//! step, read from the published side of the [`AbundanceArena`], and all
//! updates land in the staging side. The order in which cells or pairs
//! are visited therefore cannot change the result.
//!
//! A cell never sends more than it held at the start of the step: when
//! the summed outflow of a cell would exceed its count, all of its
//! outgoing flows are scaled down proportionally. Whatever leaves one
//! cell arrives at another, so each (subdivision, bin) total is conserved.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use shoal_core::{CellId, Meristics};
use shoal_space::Space;

use crate::arena::AbundanceArena;
use crate::error::ProcessConfigError;
use crate::rounding::Rounding;

/// Neighbour pairs and habitability for a fixed set of cells.
///
/// Built once per radius from the space and the arena's slot order, and
/// shareable between species registered on the same cells.
#[derive(Clone, Debug, PartialEq)]
pub struct DiffusionPlan {
    radius: u32,
    pairs: Vec<(usize, usize)>,
    habitability: Vec<f64>,
}

impl DiffusionPlan {
    /// Collect every unordered pair of registered cells within `radius` of
    /// each other. Cells the space does not consider neighbours (land, or
    /// unregistered cells) never appear.
    pub fn new(space: &dyn Space, cells: &[CellId], radius: u32) -> Self {
        let slots: HashMap<CellId, usize> =
            cells.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        let mut pairs = Vec::new();
        for (i, &cell) in cells.iter().enumerate() {
            for neighbour in space.neighbours(cell, radius) {
                if let Some(&j) = slots.get(&neighbour) {
                    if i < j {
                        pairs.push((i, j));
                    }
                }
            }
        }
        pairs.sort_unstable();
        pairs.dedup();
        let habitability = cells.iter().map(|&c| space.habitability(c)).collect();
        Self {
            radius,
            pairs,
            habitability,
        }
    }

    /// Neighbourhood radius the plan was built for.
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Number of slots (cells) covered.
    pub fn slots(&self) -> usize {
        self.habitability.len()
    }

    /// Unordered slot pairs, each with `i < j`.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }
}

/// How a species moves between cells.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diffuser {
    /// No movement.
    #[default]
    None,
    /// Every bin flows down the gradient at `rate`.
    ConstantRate {
        /// Moore neighbourhood radius.
        radius: u32,
        /// Fraction of the count difference exchanged per step.
        rate: f64,
    },
    /// Like [`Diffuser::ConstantRate`] but only bins
    /// `smallest_bin..=largest_bin` move.
    AgeLimited {
        /// Moore neighbourhood radius.
        radius: u32,
        /// Fraction of the count difference exchanged per step.
        rate: f64,
        /// First moving bin.
        smallest_bin: usize,
        /// Last moving bin.
        largest_bin: usize,
    },
    /// Flow towards an equilibrium proportional to habitability.
    Weighted {
        /// Moore neighbourhood radius.
        radius: u32,
        /// Fraction of the weighted imbalance exchanged per step.
        rate: f64,
    },
}

impl Diffuser {
    /// Constant-rate diffusion.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessConfigError::RateOutOfRange`] unless `0 <= rate <= 1`.
    pub fn constant_rate(radius: u32, rate: f64) -> Result<Self, ProcessConfigError> {
        check_rate(rate)?;
        Ok(Self::ConstantRate { radius, rate })
    }

    /// Constant-rate diffusion restricted to a window of bins.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessConfigError::RateOutOfRange`] for a bad rate and
    /// [`ProcessConfigError::BinRange`] if `smallest_bin > largest_bin`.
    /// The window is checked against the species in
    /// [`validate`](Self::validate).
    pub fn age_limited(
        radius: u32,
        rate: f64,
        smallest_bin: usize,
        largest_bin: usize,
    ) -> Result<Self, ProcessConfigError> {
        check_rate(rate)?;
        if smallest_bin > largest_bin {
            return Err(ProcessConfigError::BinRange {
                smallest: smallest_bin,
                largest: largest_bin,
                bins: largest_bin + 1,
            });
        }
        Ok(Self::AgeLimited {
            radius,
            rate,
            smallest_bin,
            largest_bin,
        })
    }

    /// Habitability-weighted diffusion.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessConfigError::RateOutOfRange`] unless `0 <= rate <= 1`.
    pub fn weighted(radius: u32, rate: f64) -> Result<Self, ProcessConfigError> {
        check_rate(rate)?;
        Ok(Self::Weighted { radius, rate })
    }

    /// Check parameters against a species.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessConfigError`] for a rate outside `[0, 1]` or a bin
    /// window that does not fit the species.
    pub fn validate(&self, meristics: &Meristics) -> Result<(), ProcessConfigError> {
        match *self {
            Self::None => Ok(()),
            Self::ConstantRate { rate, .. } | Self::Weighted { rate, .. } => check_rate(rate),
            Self::AgeLimited {
                rate,
                smallest_bin,
                largest_bin,
                ..
            } => {
                check_rate(rate)?;
                if smallest_bin > largest_bin || largest_bin >= meristics.bins() {
                    return Err(ProcessConfigError::BinRange {
                        smallest: smallest_bin,
                        largest: largest_bin,
                        bins: meristics.bins(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Neighbourhood radius, or `None` when nothing moves.
    pub fn radius(&self) -> Option<u32> {
        match *self {
            Self::None => None,
            Self::ConstantRate { radius, rate }
            | Self::AgeLimited { radius, rate, .. }
            | Self::Weighted { radius, rate } => (rate > 0.0 && radius > 0).then_some(radius),
        }
    }

    /// Run one diffusion step over every registered cell.
    ///
    /// `plan` must have been built over `arena`'s cells in slot order.
    /// The arena is published once at the end.
    pub fn diffuse(&self, plan: &DiffusionPlan, arena: &mut AbundanceArena, rounding: Rounding) {
        let (rate, weighted) = match *self {
            Self::None => return,
            Self::ConstantRate { rate, .. } | Self::AgeLimited { rate, .. } => (rate, false),
            Self::Weighted { rate, .. } => (rate, true),
        };
        if rate <= 0.0 || plan.pairs.is_empty() || arena.len() != plan.slots() {
            return;
        }

        let guard = arena.stage();
        let Some((_, first)) = guard.published.first() else {
            return;
        };
        let subdivisions = first.subdivisions();
        let bins = first.bins();
        let window = match *self {
            Self::AgeLimited {
                smallest_bin,
                largest_bin,
                ..
            } => smallest_bin..largest_bin.min(bins.saturating_sub(1)) + 1,
            _ => 0..bins,
        };

        let slots = plan.slots();
        let mut counts = vec![0.0; slots];
        let mut outflow = vec![0.0; slots];
        let mut delta = vec![0.0; slots];
        let mut flows = Vec::with_capacity(plan.pairs.len());

        for subdivision in 0..subdivisions {
            for bin in window.clone() {
                for (slot, abundance) in guard.published.values().enumerate() {
                    counts[slot] = abundance.get(subdivision, bin);
                }
                outflow.iter_mut().for_each(|v| *v = 0.0);
                delta.iter_mut().for_each(|v| *v = 0.0);
                flows.clear();

                for &(i, j) in &plan.pairs {
                    let flow = if weighted {
                        let (w_i, w_j) = (plan.habitability[i], plan.habitability[j]);
                        weighted_flow(rate, counts[i], counts[j], w_i, w_j)
                    } else {
                        rate * (counts[i] - counts[j])
                    };
                    if flow > 0.0 {
                        outflow[i] += flow;
                    } else {
                        outflow[j] -= flow;
                    }
                    flows.push(flow);
                }

                for (&(i, j), &flow) in plan.pairs.iter().zip(&flows) {
                    let (from, to, amount) = if flow > 0.0 { (i, j, flow) } else { (j, i, -flow) };
                    let scale = if outflow[from] > counts[from] {
                        counts[from] / outflow[from]
                    } else {
                        1.0
                    };
                    let moved = rounding.transfer(amount * scale);
                    if moved > 0.0 {
                        delta[from] -= moved;
                        delta[to] += moved;
                    }
                }

                for (staged, &change) in guard.staging.iter_mut().zip(&delta) {
                    if change != 0.0 {
                        staged.update_subdivision(subdivision, |row| row[bin] += change);
                    }
                }
            }
        }

        arena.publish();
    }
}

/// Flow from `i` to `j` that drives `n / w` towards equality.
fn weighted_flow(rate: f64, n_i: f64, n_j: f64, w_i: f64, w_j: f64) -> f64 {
    let norm = w_i.max(w_j);
    if norm <= 0.0 {
        return 0.0;
    }
    rate * (n_i * w_j - n_j * w_i) / norm
}

fn check_rate(rate: f64) -> Result<(), ProcessConfigError> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(ProcessConfigError::RateOutOfRange {
            name: "diffusion rate",
            value: rate,
        });
    }
    Ok(())
}
