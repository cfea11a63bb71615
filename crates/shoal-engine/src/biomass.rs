//! Biomass-only mode.
//!
//! A species tracked as a scalar [`BiomassPool`] per cell instead of a
//! structured abundance. Pools grow logistically once a year and lose
//! biomass only through harvest.

use indexmap::IndexMap;
use shoal_biology::LogisticGrowth;
use shoal_core::{BiomassPool, CellId, SimClock, SpeciesId};
use tracing::{info, warn};

use crate::error::RegistrationError;
use crate::processes::Lifecycle;

/// Logistic biomass pools of one species.
#[derive(Clone, Debug)]
pub struct BiomassProcesses {
    species: SpeciesId,
    growth: LogisticGrowth,
    pools: IndexMap<CellId, BiomassPool>,
    state: Lifecycle,
    biomass_series: Vec<f64>,
}

impl BiomassProcesses {
    /// No pools yet.
    pub fn new(species: SpeciesId, growth: LogisticGrowth) -> Self {
        Self {
            species,
            growth,
            pools: IndexMap::new(),
            state: Lifecycle::Uninitialized,
            biomass_series: Vec::new(),
        }
    }

    /// The species driven.
    pub fn species(&self) -> SpeciesId {
        self.species
    }

    /// Current lifecycle state.
    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// Register a cell's pool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] if finalized or the cell is already
    /// registered.
    pub fn add(&mut self, cell: CellId, pool: BiomassPool) -> Result<(), RegistrationError> {
        if self.state == Lifecycle::Finalized {
            return Err(RegistrationError::Finalized);
        }
        if self.pools.contains_key(&cell) {
            return Err(RegistrationError::DuplicateCell { cell });
        }
        self.pools.insert(cell, pool);
        self.state = Lifecycle::Active;
        Ok(())
    }

    /// Pool of one cell.
    pub fn pool(&self, cell: CellId) -> Option<&BiomassPool> {
        self.pools.get(&cell)
    }

    /// Registered cells in registration order.
    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.pools.keys().copied()
    }

    /// Biomass summed over every pool.
    pub fn total_biomass(&self) -> f64 {
        self.pools.values().map(|p| p.biomass).sum()
    }

    /// Total biomass recorded at the end of each simulated year.
    pub fn biomass_series(&self) -> &[f64] {
        &self.biomass_series
    }

    /// Overwrite a cell's biomass, capped at its carrying capacity.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] if finalized or the cell is unknown.
    pub fn set_biomass(&mut self, cell: CellId, biomass: f64) -> Result<(), RegistrationError> {
        if self.state == Lifecycle::Finalized {
            return Err(RegistrationError::Finalized);
        }
        let pool = self
            .pools
            .get_mut(&cell)
            .ok_or(RegistrationError::UnknownCell { cell })?;
        *pool = BiomassPool::new(biomass, pool.carrying_capacity);
        Ok(())
    }

    /// Harvest `amount` from a cell and return the part that was not
    /// there to take.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] if finalized or the cell is unknown.
    pub fn remove(&mut self, cell: CellId, amount: f64) -> Result<f64, RegistrationError> {
        if self.state == Lifecycle::Finalized {
            return Err(RegistrationError::Finalized);
        }
        let pool = self
            .pools
            .get_mut(&cell)
            .ok_or(RegistrationError::UnknownCell { cell })?;
        let shortfall = pool.remove(amount);
        if shortfall > 0.0 {
            warn!(species = %self.species, %cell, amount, shortfall, "biomass catch clamped");
        }
        Ok(shortfall)
    }

    /// Grow every pool if `clock` is on the last day of a year, and return
    /// the biomass added.
    pub fn step(&mut self, clock: SimClock) -> f64 {
        if self.state != Lifecycle::Active || !clock.is_year_end() {
            return 0.0;
        }
        let added: f64 = self
            .pools
            .values_mut()
            .map(|pool| self.growth.grow(pool))
            .sum();
        let total = self.total_biomass();
        self.biomass_series.push(total);
        info!(species = %self.species, year = clock.year(), added, total, "yearly biomass growth");
        added
    }

    /// End the simulation for this species.
    pub fn finalize(&mut self) {
        self.state = Lifecycle::Finalized;
    }
}
