//! Probabilistic length-bin transitions.
//!
//! A [`GrowthTransition`] holds one `bins × bins` matrix per subdivision.
//! Row `from` gives the probability that an individual in length bin
//! `from` ends the growth step in each bin `to`. Rows are built from the
//! von Bertalanffy expected increment plus normally distributed noise of
//! fixed standard deviation, then rounded to five decimals and
//! re-normalized.

use shoal_core::meristics::GrowthCurve;
use shoal_core::{Meristics, StructuredAbundance};

use crate::error::ProcessConfigError;
use crate::rounding::Rounding;

/// No individual grows into a bin whose upper bound reaches this multiple
/// of `L∞`.
const MAX_LENGTH_TO_ASYMPTOTE: f64 = 1.2;

/// Per-subdivision size transition matrices.
#[derive(Clone, Debug, PartialEq)]
pub struct GrowthTransition {
    bins: usize,
    matrices: Vec<Vec<f64>>,
}

impl GrowthTransition {
    /// Build matrices for every subdivision from the species' bin lengths
    /// and growth curves.
    ///
    /// `scaling` shrinks the annual increment for sub-annual steps (for a
    /// step every `n` days use `n / 365`).
    ///
    /// # Errors
    ///
    /// Returns [`ProcessConfigError`] if `size_sd` or `scaling` is not
    /// positive, or a subdivision has no growth curve.
    pub fn from_meristics(
        meristics: &Meristics,
        size_sd: f64,
        scaling: f64,
    ) -> Result<Self, ProcessConfigError> {
        check_positive("size_sd", size_sd)?;
        check_positive("scaling", scaling)?;
        let matrices = (0..meristics.subdivisions())
            .map(|subdivision| {
                let curve = meristics
                    .growth(subdivision)
                    .ok_or(ProcessConfigError::MissingGrowth { subdivision })?;
                Ok(transition_matrix(
                    meristics.lengths(subdivision),
                    curve,
                    size_sd,
                    scaling,
                ))
            })
            .collect::<Result<Vec<_>, ProcessConfigError>>()?;
        Ok(Self {
            bins: meristics.bins(),
            matrices,
        })
    }

    /// Number of bins each matrix covers.
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Transition probabilities out of bin `from` of `subdivision`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn row(&self, subdivision: usize, from: usize) -> &[f64] {
        &self.matrices[subdivision][from * self.bins..(from + 1) * self.bins]
    }

    /// Redistribute every bin according to its row.
    ///
    /// Total count per subdivision is conserved. With [`Rounding::Whole`]
    /// the outgoing amounts are floored and the remainder stays put.
    pub fn apply(&self, abundance: &mut StructuredAbundance, rounding: Rounding) {
        debug_assert_eq!(
            abundance.bins(),
            self.bins,
            "transition matrix applied to a different bin count"
        );
        if abundance.bins() != self.bins {
            return;
        }
        let subdivisions = abundance.subdivisions().min(self.matrices.len());
        let mut next = vec![0.0; self.bins];
        for subdivision in 0..subdivisions {
            next.iter_mut().for_each(|v| *v = 0.0);
            let current = abundance.subdivision(subdivision);
            for from in 0..self.bins {
                let count = current[from];
                if count <= 0.0 {
                    continue;
                }
                let row = self.row(subdivision, from);
                let mut moved = 0.0;
                for to in from + 1..self.bins {
                    let amount = rounding.transfer(count * row[to]);
                    next[to] += amount;
                    moved += amount;
                }
                next[from] += (count - moved).max(0.0);
            }
            abundance.update_subdivision(subdivision, |row| row.copy_from_slice(&next));
        }
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), ProcessConfigError> {
    if !(value > 0.0) || !value.is_finite() {
        return Err(ProcessConfigError::NotPositive { name, value });
    }
    Ok(())
}

/// Row-major `[from][to]` matrix for one subdivision.
fn transition_matrix(lengths: &[f64], curve: GrowthCurve, size_sd: f64, scaling: f64) -> Vec<f64> {
    let bins = lengths.len();
    let last = bins - 1;
    let lower: Vec<f64> = (0..bins)
        .map(|i| if i == 0 { 0.0 } else { (lengths[i - 1] + lengths[i]) / 2.0 })
        .collect();
    let upper: Vec<f64> = (0..bins)
        .map(|i| if i == last { lengths[i] } else { (lengths[i] + lengths[i + 1]) / 2.0 })
        .collect();
    let ceiling = MAX_LENGTH_TO_ASYMPTOTE * curve.asymptotic_length;

    let mut matrix = vec![0.0; bins * bins];
    for from in 0..bins {
        let growth =
            (curve.asymptotic_length - lengths[from]) * (1.0 - (-curve.k).exp()) * scaling;
        let mean = lengths[from] + growth;
        let cdf = |x: f64| normal_cdf((x - mean) / size_sd);
        let row = &mut matrix[from * bins..(from + 1) * bins];
        for to in from..bins {
            let p = if to == from {
                if to == last {
                    1.0
                } else {
                    cdf(upper[to])
                }
            } else if upper[to] >= ceiling {
                0.0
            } else if to == last {
                1.0 - cdf(lower[to])
            } else {
                cdf(upper[to]) - cdf(lower[to])
            };
            row[to] = round5(p.max(0.0));
        }
        let sum: f64 = row.iter().sum();
        if sum > 0.0 {
            row.iter_mut().for_each(|p| *p /= sum);
        } else {
            row[from] = 1.0;
        }
    }
    matrix
}

fn round5(p: f64) -> f64 {
    (p * 1e5).round() / 1e5
}

/// Standard normal CDF.
fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Abramowitz and Stegun 7.1.26, absolute error below 1.5e-7.
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}
