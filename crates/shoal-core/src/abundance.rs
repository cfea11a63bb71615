//! The per-cell, per-species abundance matrix.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AbundanceError;
use crate::meristics::Meristics;

/// Counts of individuals by subdivision (sex) and age/size bin.
///
/// The shape is fixed at construction. No entry is ever negative or
/// non-finite: every mutating method either validates its input or, for
/// closures handed raw rows, clamps the result back into range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct StructuredAbundance {
    subdivisions: usize,
    bins: usize,
    counts: Vec<f64>,
}

impl StructuredAbundance {
    /// All-zero matrix of the given shape.
    ///
    /// Shapes with a zero dimension are widened to one so the matrix is
    /// never empty.
    pub fn zeros(subdivisions: usize, bins: usize) -> Self {
        let subdivisions = subdivisions.max(1);
        let bins = bins.max(1);
        Self {
            subdivisions,
            bins,
            counts: vec![0.0; subdivisions * bins],
        }
    }

    /// All-zero matrix shaped for a species.
    pub fn for_meristics(meristics: &Meristics) -> Self {
        Self::zeros(meristics.subdivisions(), meristics.bins())
    }

    /// Build from one row of counts per subdivision.
    ///
    /// # Errors
    ///
    /// Returns [`AbundanceError`] if there are no rows, the rows differ in
    /// length, or any count is negative or non-finite.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, AbundanceError> {
        let bins = rows.first().map_or(0, Vec::len);
        if bins == 0 {
            return Err(AbundanceError::Empty);
        }
        let mut counts = Vec::with_capacity(rows.len() * bins);
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != bins {
                return Err(AbundanceError::RaggedRows {
                    row: row_index,
                    expected: bins,
                    actual: row.len(),
                });
            }
            for (bin, &value) in row.iter().enumerate() {
                check_count(row_index, bin, value)?;
                counts.push(value);
            }
        }
        Ok(Self {
            subdivisions: rows.len(),
            bins,
            counts,
        })
    }

    /// Number of subdivisions.
    pub fn subdivisions(&self) -> usize {
        self.subdivisions
    }

    /// Number of bins.
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Whether `other` has the same shape.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.subdivisions == other.subdivisions && self.bins == other.bins
    }

    /// Count at `(subdivision, bin)`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn get(&self, subdivision: usize, bin: usize) -> f64 {
        assert!(subdivision < self.subdivisions && bin < self.bins);
        self.counts[subdivision * self.bins + bin]
    }

    /// Overwrite the count at `(subdivision, bin)`.
    ///
    /// # Errors
    ///
    /// Returns [`AbundanceError`] if the index is out of range or the value
    /// is negative or non-finite.
    pub fn set(&mut self, subdivision: usize, bin: usize, value: f64) -> Result<(), AbundanceError> {
        self.check_index(subdivision, bin)?;
        check_count(subdivision, bin, value)?;
        self.counts[subdivision * self.bins + bin] = value;
        Ok(())
    }

    /// Add `amount` individuals to `(subdivision, bin)`.
    ///
    /// # Errors
    ///
    /// Returns [`AbundanceError`] if the index is out of range or `amount`
    /// is negative or non-finite.
    pub fn add(&mut self, subdivision: usize, bin: usize, amount: f64) -> Result<(), AbundanceError> {
        self.check_index(subdivision, bin)?;
        check_count(subdivision, bin, amount)?;
        self.counts[subdivision * self.bins + bin] += amount;
        Ok(())
    }

    /// Counts of every bin in `subdivision`.
    ///
    /// # Panics
    ///
    /// Panics if `subdivision` is out of range.
    pub fn subdivision(&self, subdivision: usize) -> &[f64] {
        &self.counts[subdivision * self.bins..(subdivision + 1) * self.bins]
    }

    /// Rewrite one subdivision in place.
    ///
    /// The closure sees the raw row. Afterwards any negative or non-finite
    /// entry it produced is reset to zero, so the matrix invariant holds
    /// whatever the closure did.
    ///
    /// # Panics
    ///
    /// Panics if `subdivision` is out of range.
    pub fn update_subdivision<F>(&mut self, subdivision: usize, f: F)
    where
        F: FnOnce(&mut [f64]),
    {
        let row = &mut self.counts[subdivision * self.bins..(subdivision + 1) * self.bins];
        f(row);
        for value in row.iter_mut() {
            if !(*value >= 0.0) || !value.is_finite() {
                debug_assert!(!(*value < -1e-6), "process produced negative count {value}");
                *value = 0.0;
            }
        }
    }

    /// Flattened counts, `[subdivision][bin]` row-major.
    pub fn as_slice(&self) -> &[f64] {
        &self.counts
    }

    /// Sum over every subdivision and bin.
    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Sum over the bins of one subdivision.
    pub fn total_in(&self, subdivision: usize) -> f64 {
        self.subdivision(subdivision).iter().sum()
    }

    /// Total weight of the individuals, using the species' weight-at-bin.
    ///
    /// Subdivisions or bins the meristics do not describe weigh nothing.
    pub fn biomass(&self, meristics: &Meristics) -> f64 {
        let subdivisions = self.subdivisions.min(meristics.subdivisions());
        let bins = self.bins.min(meristics.bins());
        let mut biomass = 0.0;
        for sub in 0..subdivisions {
            let row = self.subdivision(sub);
            for bin in 0..bins {
                biomass += row[bin] * meristics.weight(sub, bin);
            }
        }
        biomass
    }

    /// Multiply every count by `factor`.
    ///
    /// # Errors
    ///
    /// Returns [`AbundanceError::InvalidCount`] if `factor` is negative or
    /// non-finite.
    pub fn scale(&mut self, factor: f64) -> Result<(), AbundanceError> {
        check_count(0, 0, factor)?;
        self.counts.iter_mut().for_each(|c| *c *= factor);
        Ok(())
    }

    /// Add another matrix of the same shape element-wise.
    ///
    /// # Errors
    ///
    /// Returns [`AbundanceError::ShapeMismatch`] if the shapes differ.
    pub fn accumulate(&mut self, other: &Self) -> Result<(), AbundanceError> {
        self.check_shape(other)?;
        for (c, o) in self.counts.iter_mut().zip(&other.counts) {
            *c += o;
        }
        Ok(())
    }

    /// Remove a catch-at-age matrix, clamping each bin at what is present.
    ///
    /// Every bin loses `min(catch, stock)`. The caught amount that could
    /// not be satisfied is reported per bin in [`Removal::shortfall`].
    ///
    /// # Errors
    ///
    /// Returns [`AbundanceError::ShapeMismatch`] if `catch` has a different
    /// shape. The matrix is untouched in that case.
    pub fn remove(&mut self, catch: &Self) -> Result<Removal, AbundanceError> {
        self.check_shape(catch)?;
        let mut removed = Self::zeros(self.subdivisions, self.bins);
        let mut shortfall = Self::zeros(self.subdivisions, self.bins);
        for i in 0..self.counts.len() {
            let wanted = catch.counts[i];
            let taken = wanted.min(self.counts[i]);
            self.counts[i] -= taken;
            removed.counts[i] = taken;
            shortfall.counts[i] = wanted - taken;
        }
        Ok(Removal { removed, shortfall })
    }

    fn check_index(&self, subdivision: usize, bin: usize) -> Result<(), AbundanceError> {
        if subdivision >= self.subdivisions || bin >= self.bins {
            return Err(AbundanceError::OutOfRange {
                subdivision,
                bin,
                subdivisions: self.subdivisions,
                bins: self.bins,
            });
        }
        Ok(())
    }

    fn check_shape(&self, other: &Self) -> Result<(), AbundanceError> {
        if !self.same_shape(other) {
            return Err(AbundanceError::ShapeMismatch {
                expected_subdivisions: self.subdivisions,
                expected_bins: self.bins,
                subdivisions: other.subdivisions,
                bins: other.bins,
            });
        }
        Ok(())
    }
}

fn check_count(subdivision: usize, bin: usize, value: f64) -> Result<(), AbundanceError> {
    if !(value >= 0.0) || !value.is_finite() {
        return Err(AbundanceError::InvalidCount {
            subdivision,
            bin,
            value,
        });
    }
    Ok(())
}

impl TryFrom<Vec<Vec<f64>>> for StructuredAbundance {
    type Error = AbundanceError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<StructuredAbundance> for Vec<Vec<f64>> {
    fn from(abundance: StructuredAbundance) -> Self {
        abundance
            .counts
            .chunks(abundance.bins)
            .map(<[f64]>::to_vec)
            .collect()
    }
}

impl fmt::Display for StructuredAbundance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.counts.chunks(self.bins).enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{row:?}")?;
        }
        Ok(())
    }
}

/// Outcome of [`StructuredAbundance::remove`].
#[derive(Clone, Debug, PartialEq)]
pub struct Removal {
    /// What was actually taken, per bin.
    pub removed: StructuredAbundance,
    /// Catch that exceeded the available stock, per bin.
    pub shortfall: StructuredAbundance,
}

impl Removal {
    /// Total individuals removed.
    pub fn removed_total(&self) -> f64 {
        self.removed.total()
    }

    /// Total catch that could not be satisfied.
    pub fn shortfall_total(&self) -> f64 {
        self.shortfall.total()
    }

    /// Whether any bin was clamped.
    pub fn is_clamped(&self) -> bool {
        self.shortfall_total() > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{FEMALE, MALE};
    use crate::meristics::MeristicsBuilder;
    use proptest::prelude::*;

    fn sample() -> StructuredAbundance {
        StructuredAbundance::from_rows(vec![vec![0.0, 0.0, 10.0], vec![10.0, 20.0, 30.0]]).unwrap()
    }

    // ── Construction ────────────────────────────────────────────

    #[test]
    fn from_rows_validates() {
        assert_eq!(
            StructuredAbundance::from_rows(vec![]).unwrap_err(),
            AbundanceError::Empty
        );
        assert!(matches!(
            StructuredAbundance::from_rows(vec![vec![1.0, 2.0], vec![1.0]]),
            Err(AbundanceError::RaggedRows { row: 1, .. })
        ));
        assert!(matches!(
            StructuredAbundance::from_rows(vec![vec![1.0, -2.0]]),
            Err(AbundanceError::InvalidCount { bin: 1, .. })
        ));
    }

    #[test]
    fn zeros_never_empty() {
        let a = StructuredAbundance::zeros(0, 0);
        assert_eq!((a.subdivisions(), a.bins()), (1, 1));
    }

    #[test]
    fn accessors_and_totals() {
        let a = sample();
        assert_eq!(a.get(MALE, 2), 30.0);
        assert_eq!(a.subdivision(FEMALE), &[0.0, 0.0, 10.0]);
        assert_eq!(a.total(), 70.0);
        assert_eq!(a.total_in(MALE), 60.0);
    }

    #[test]
    fn set_and_add_reject_negative() {
        let mut a = sample();
        assert!(a.set(0, 0, -1.0).is_err());
        assert!(a.add(0, 0, f64::INFINITY).is_err());
        assert!(a.set(2, 0, 1.0).is_err());
        a.add(FEMALE, 0, 5.0).unwrap();
        assert_eq!(a.get(FEMALE, 0), 5.0);
    }

    #[test]
    fn update_subdivision_clamps_negative() {
        let mut a = sample();
        a.update_subdivision(MALE, |row| row[0] -= 10.0 + 1e-9);
        assert_eq!(a.get(MALE, 0), 0.0);
    }

    #[test]
    fn biomass_uses_weights() {
        let m = MeristicsBuilder::new(2, 3)
            .weights(vec![1.0, 2.0, 3.0, 1.0, 1.0, 1.0])
            .build()
            .unwrap();
        assert_eq!(sample().biomass(&m), 30.0 + 60.0);
    }

    #[test]
    fn serde_round_trips_as_rows() {
        let a = sample();
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "[[0.0,0.0,10.0],[10.0,20.0,30.0]]");
        let back: StructuredAbundance = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
        assert!(serde_json::from_str::<StructuredAbundance>("[[1.0,-1.0]]").is_err());
    }

    // ── Harvest removal ─────────────────────────────────────────

    #[test]
    fn removal_within_stock() {
        let mut a = sample();
        let catch =
            StructuredAbundance::from_rows(vec![vec![0.0, 0.0, 4.0], vec![1.0, 2.0, 3.0]]).unwrap();
        let removal = a.remove(&catch).unwrap();
        assert_eq!(removal.removed_total(), 10.0);
        assert!(!removal.is_clamped());
        assert_eq!(a.get(MALE, 2), 27.0);
    }

    #[test]
    fn over_catch_is_clamped_and_reported() {
        let mut a = sample();
        let catch =
            StructuredAbundance::from_rows(vec![vec![5.0, 0.0, 15.0], vec![0.0, 0.0, 0.0]]).unwrap();
        let removal = a.remove(&catch).unwrap();
        assert_eq!(a.subdivision(FEMALE), &[0.0, 0.0, 0.0]);
        assert_eq!(removal.shortfall.subdivision(FEMALE), &[5.0, 0.0, 5.0]);
        assert_eq!(removal.shortfall_total(), 10.0);
        assert_eq!(removal.removed_total(), 10.0);
    }

    #[test]
    fn removal_shape_mismatch_leaves_stock_untouched() {
        let mut a = sample();
        let before = a.clone();
        let catch = StructuredAbundance::zeros(1, 3);
        assert!(matches!(
            a.remove(&catch),
            Err(AbundanceError::ShapeMismatch { .. })
        ));
        assert_eq!(a, before);
    }

    proptest! {
        #[test]
        fn removal_never_negative_and_conserves(
            stock in prop::collection::vec(0.0f64..1e6, 6),
            catch in prop::collection::vec(0.0f64..1e6, 6),
        ) {
            let mut a = StructuredAbundance::from_rows(
                vec![stock[..3].to_vec(), stock[3..].to_vec()]).unwrap();
            let c = StructuredAbundance::from_rows(
                vec![catch[..3].to_vec(), catch[3..].to_vec()]).unwrap();
            let before = a.total();
            let removal = a.remove(&c).unwrap();
            prop_assert!(a.as_slice().iter().all(|&v| v >= 0.0));
            prop_assert!((before - removal.removed_total() - a.total()).abs() < 1e-6);
            prop_assert!((removal.removed_total() + removal.shortfall_total() - c.total()).abs() < 1e-6);
        }
    }
}
