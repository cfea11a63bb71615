//! Snapshot and restore of a species' spatial distribution.
//!
//! [`GridSnapshot`] records every cell as it is and writes it back scaled
//! by a per-cell weight. The resetters record only a species-wide total
//! and spread it again with an [`Allocator`]:
//!
//! - [`BiomassResetter`] uses raw weights, so `total × weight` can exceed
//!   the recorded total; each pool is capped at its carrying capacity.
//! - [`AbundanceResetter`] normalizes the weights and splits every
//!   (subdivision, bin) entry of the summed matrix across cells.

use indexmap::IndexMap;
use rand::RngCore;
use shoal_biology::allocator::split;
use shoal_biology::{Allocator, Rounding};
use shoal_core::{CellId, StructuredAbundance};
use shoal_space::Space;

use crate::biomass::BiomassProcesses;
use crate::error::{RegistrationError, ResetError};
use crate::processes::SingleSpeciesProcesses;

/// Per-cell state of one species at a moment in time.
#[derive(Clone, Debug, PartialEq)]
pub enum GridSnapshot {
    /// Biomass of each pool.
    Biomass(IndexMap<CellId, f64>),
    /// Abundance of each cell.
    Abundance(IndexMap<CellId, StructuredAbundance>),
}

impl GridSnapshot {
    /// Record every pool of a biomass-only species.
    pub fn capture_biomass(processes: &BiomassProcesses) -> Self {
        Self::Biomass(
            processes
                .cells()
                .filter_map(|cell| processes.pool(cell).map(|p| (cell, p.biomass)))
                .collect(),
        )
    }

    /// Record every cell of an abundance-tracked species.
    pub fn capture_abundance(processes: &SingleSpeciesProcesses) -> Self {
        Self::Abundance(
            processes
                .cells()
                .filter_map(|cell| processes.abundance(cell).map(|a| (cell, a.clone())))
                .collect(),
        )
    }

    /// Number of cells recorded.
    pub fn len(&self) -> usize {
        match self {
            Self::Biomass(cells) => cells.len(),
            Self::Abundance(cells) => cells.len(),
        }
    }

    /// Whether no cell was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mode(&self) -> &'static str {
        match self {
            Self::Biomass(_) => "biomass",
            Self::Abundance(_) => "abundance",
        }
    }

    /// Overwrite every registered pool with `recorded × weight(cell)`.
    /// Cells missing from the snapshot are emptied.
    ///
    /// # Errors
    ///
    /// Returns [`ResetError::ModeMismatch`] for an abundance snapshot, or a
    /// wrapped [`RegistrationError`] if the pools are finalized.
    pub fn restore_biomass(
        &self,
        target: &mut BiomassProcesses,
        mut weight: impl FnMut(CellId) -> f64,
    ) -> Result<(), ResetError> {
        let Self::Biomass(recorded) = self else {
            return Err(ResetError::ModeMismatch {
                expected: "biomass",
                found: self.mode(),
            });
        };
        let cells: Vec<CellId> = target.cells().collect();
        for cell in cells {
            let biomass = recorded.get(&cell).copied().unwrap_or(0.0) * weight(cell);
            target.set_biomass(cell, biomass)?;
        }
        Ok(())
    }

    /// Overwrite every registered cell with `recorded × weight(cell)`,
    /// rounding each entry with `rounding`. Cells missing from the snapshot
    /// are emptied.
    ///
    /// # Errors
    ///
    /// Returns [`ResetError::ModeMismatch`] for a biomass snapshot, or a
    /// wrapped [`RegistrationError`] if a recorded matrix no longer fits.
    pub fn restore_abundance(
        &self,
        target: &mut SingleSpeciesProcesses,
        mut weight: impl FnMut(CellId) -> f64,
        rounding: Rounding,
    ) -> Result<(), ResetError> {
        let Self::Abundance(recorded) = self else {
            return Err(ResetError::ModeMismatch {
                expected: "abundance",
                found: self.mode(),
            });
        };
        let meristics = target.species().meristics_arc();
        let cells: Vec<CellId> = target.cells().collect();
        for cell in cells {
            let mut abundance = match recorded.get(&cell) {
                Some(a) => a.clone(),
                None => StructuredAbundance::for_meristics(&meristics),
            };
            let w = weight(cell).max(0.0);
            for subdivision in 0..abundance.subdivisions() {
                abundance.update_subdivision(subdivision, |row| {
                    for count in row.iter_mut() {
                        *count = rounding.transfer(*count * w);
                    }
                });
            }
            target.replace(cell, abundance)?;
        }
        Ok(())
    }
}

/// Records a species' total biomass and spreads it back by raw allocator
/// weight.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BiomassResetter {
    recorded: Option<f64>,
}

impl BiomassResetter {
    /// Nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the current total biomass.
    pub fn record(&mut self, processes: &BiomassProcesses) {
        self.recorded = Some(processes.total_biomass());
    }

    /// The recorded total.
    pub fn recorded(&self) -> Option<f64> {
        self.recorded
    }

    /// Set every pool to `total × weight(cell)`, capped at its carrying
    /// capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ResetError::NothingRecorded`] before [`record`](Self::record),
    /// or the allocator's weight error.
    pub fn reset(
        &self,
        target: &mut BiomassProcesses,
        allocator: &Allocator,
        space: &dyn Space,
        rng: &mut dyn RngCore,
    ) -> Result<(), ResetError> {
        let total = self.recorded.ok_or(ResetError::NothingRecorded)?;
        let cells: Vec<CellId> = target.cells().collect();
        let weights = allocator.weights(&cells, space, rng)?;
        for (cell, weight) in cells.into_iter().zip(weights) {
            target.set_biomass(cell, total * weight)?;
        }
        Ok(())
    }
}

/// Records a species' summed abundance matrix and spreads it back by
/// normalized allocator weight.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AbundanceResetter {
    recorded: Option<StructuredAbundance>,
}

impl AbundanceResetter {
    /// Nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the current abundance summed over every cell.
    pub fn record(&mut self, processes: &SingleSpeciesProcesses) {
        self.recorded = Some(processes.total_abundance());
    }

    /// The recorded matrix.
    pub fn recorded(&self) -> Option<&StructuredAbundance> {
        self.recorded.as_ref()
    }

    /// Replace every cell with its normalized share of the recorded
    /// matrix. With [`Rounding::Whole`] each entry is split by cumulative
    /// flooring, so per-entry totals are preserved exactly.
    ///
    /// # Errors
    ///
    /// Returns [`ResetError::NothingRecorded`] before [`record`](Self::record),
    /// the allocator's weight error, or a wrapped [`RegistrationError`].
    pub fn reset(
        &self,
        target: &mut SingleSpeciesProcesses,
        allocator: &Allocator,
        space: &dyn Space,
        rng: &mut dyn RngCore,
        rounding: Rounding,
    ) -> Result<(), ResetError> {
        let recorded = self.recorded.as_ref().ok_or(ResetError::NothingRecorded)?;
        let cells: Vec<CellId> = target.cells().collect();
        let weights = allocator.normalized_weights(&cells, space, rng)?;
        let mut shares =
            vec![StructuredAbundance::zeros(recorded.subdivisions(), recorded.bins()); cells.len()];
        for subdivision in 0..recorded.subdivisions() {
            for bin in 0..recorded.bins() {
                let parts = split(recorded.get(subdivision, bin), &weights, rounding);
                for (share, part) in shares.iter_mut().zip(parts) {
                    share
                        .set(subdivision, bin, part)
                        .map_err(RegistrationError::from)?;
                }
            }
        }
        for (cell, share) in cells.into_iter().zip(shares) {
            target.replace(cell, share)?;
        }
        Ok(())
    }
}
