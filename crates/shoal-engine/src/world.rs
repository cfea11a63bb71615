//! The daily step loop.
//!
//! [`BiologyWorld`] owns the grid, the species registry, the clock, the
//! seeded generator and every species' processes. Each call to
//! [`step()`](BiologyWorld::step) runs one simulated day for every
//! species and returns that day's [`StepMetrics`].
//!
//! A step that fails halts the world: every later
//! [`step()`](BiologyWorld::step) returns [`StepError::Halted`], so a
//! partly applied day is never run a second time.
//!
//! Between steps the only way to change a stock from outside is a harvest
//! ([`apply_catch`](BiologyWorld::apply_catch) or
//! [`apply_biomass_catch`](BiologyWorld::apply_biomass_catch)), or a
//! snapshot restore or reset.
//!
//! # Example
//!
//! ```
//! use shoal_biology::{NaturalMortality, RecruitmentKind};
//! use shoal_core::{LocalBiology, MeristicsBuilder, StructuredAbundance};
//! use shoal_engine::{BiologyWorld, EngineConfig, RecruitmentSpec, SpeciesProcessesConfig};
//! use shoal_space::{EdgeBehavior, MooreGrid};
//!
//! let grid = MooreGrid::new(2, 2, EdgeBehavior::Absorb).unwrap();
//! let mut world = BiologyWorld::new(Box::new(grid), EngineConfig::default()).unwrap();
//! let meristics = MeristicsBuilder::new(2, 3).weights(vec![1.0; 6]).build().unwrap();
//! let processes = SpeciesProcessesConfig::new(
//!     NaturalMortality::Exponential,
//!     RecruitmentSpec::new(RecruitmentKind::Fixed {
//!         recruits: 40.0,
//!         yearly_scale: Default::default(),
//!     }),
//! );
//! let cod = world.add_species("cod", meristics, &processes).unwrap();
//! world
//!     .populate(|_| {
//!         LocalBiology::Abundance([(cod, StructuredAbundance::zeros(2, 3))].into_iter().collect())
//!     })
//!     .unwrap();
//! for _ in 0..365 {
//!     world.step().unwrap();
//! }
//! assert_eq!(world.biomass_series(cod), Some(&[40.0][..]));
//! ```

use std::time::Instant;

use indexmap::IndexMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use shoal_biology::{Allocator, LogisticGrowth};
use shoal_core::{
    BiomassPool, CellId, LocalBiology, Meristics, Removal, SimClock, SpeciesId, SpeciesRegistry,
    StructuredAbundance,
};
use shoal_space::Space;
use tracing::{error, info, warn};

use crate::biomass::BiomassProcesses;
use crate::config::{ConfigError, EngineConfig, SpeciesProcessesConfig};
use crate::error::{RegistrationError, ResetError, StepError};
use crate::metrics::{micros, StepMetrics};
use crate::multi::MultiSpeciesProcesses;
use crate::processes::{SingleSpeciesProcesses, StepContext};
use crate::reset::{AbundanceResetter, BiomassResetter, GridSnapshot};

/// A grid of cells, the species living in them, and the clock that
/// drives them.
pub struct BiologyWorld {
    space: Box<dyn Space>,
    registry: SpeciesRegistry,
    clock: SimClock,
    rng: ChaCha8Rng,
    config: EngineConfig,
    abundance: MultiSpeciesProcesses,
    biomass: IndexMap<SpeciesId, BiomassProcesses>,
    last_metrics: StepMetrics,
    finalized: bool,
    halted: bool,
}

impl BiologyWorld {
    /// An empty world on `space`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroInterval`] for a zero-day interval.
    pub fn new(space: Box<dyn Space>, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            space,
            registry: SpeciesRegistry::new(),
            clock: SimClock::default(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            abundance: MultiSpeciesProcesses::new(),
            biomass: IndexMap::new(),
            last_metrics: StepMetrics::default(),
            finalized: false,
            halted: false,
        })
    }

    /// Register an abundance-tracked species with its processes.
    ///
    /// Nothing is registered if the processes are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a duplicate name or any invalid process.
    pub fn add_species(
        &mut self,
        name: &str,
        meristics: Meristics,
        processes: &SpeciesProcessesConfig,
    ) -> Result<SpeciesId, ConfigError> {
        let mut registry = self.registry.clone();
        let id = registry.register(name, meristics)?;
        let species = registry
            .get(id)
            .ok_or(ConfigError::UnknownSpecies { species: id })?;
        let built = processes.build(species)?;
        self.abundance.insert(built)?;
        self.registry = registry;
        info!(species = name, id = %id, "species added");
        Ok(id)
    }

    /// Register a species tracked only as logistic biomass pools.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a duplicate name or an invalid growth
    /// rate.
    pub fn add_biomass_species(
        &mut self,
        name: &str,
        meristics: Meristics,
        growth: LogisticGrowth,
    ) -> Result<SpeciesId, ConfigError> {
        growth.validate().map_err(|source| ConfigError::Process {
            species: name.to_owned(),
            source,
        })?;
        let id = self.registry.register(name, meristics)?;
        self.biomass.insert(id, BiomassProcesses::new(id, growth));
        info!(species = name, id = %id, "biomass species added");
        Ok(id)
    }

    /// Fill every water cell with what `seed` returns for it.
    ///
    /// # Errors
    ///
    /// Stops at the first cell that cannot be registered.
    pub fn populate(
        &mut self,
        mut seed: impl FnMut(CellId) -> LocalBiology,
    ) -> Result<(), RegistrationError> {
        for cell in self.space.water_cells() {
            let biology = seed(cell);
            self.populate_cell(cell, &biology)?;
        }
        Ok(())
    }

    /// Register one cell's starting stocks.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::UnknownCell`] for land or cells outside
    /// the grid, [`RegistrationError::UnknownSpecies`] for a species with no
    /// processes in that mode, and any error from the processes themselves.
    pub fn populate_cell(
        &mut self,
        cell: CellId,
        biology: &LocalBiology,
    ) -> Result<(), RegistrationError> {
        if self.finalized {
            return Err(RegistrationError::Finalized);
        }
        if !self.space.is_water(cell) {
            return Err(RegistrationError::UnknownCell { cell });
        }
        match biology {
            LocalBiology::Empty => {}
            LocalBiology::Abundance(stocks) => {
                for (&species, abundance) in stocks {
                    self.abundance
                        .get_mut(species)
                        .ok_or(RegistrationError::UnknownSpecies { species })?
                        .add(cell, abundance.clone())?;
                }
            }
            LocalBiology::Biomass(pools) => {
                for (&species, &pool) in pools {
                    self.biomass
                        .get_mut(&species)
                        .ok_or(RegistrationError::UnknownSpecies { species })?
                        .add(cell, pool)?;
                }
            }
        }
        Ok(())
    }

    /// Run one simulated day and return its metrics.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] after finalization or when any species fails.
    /// The day is not advanced on error and the world halts.
    pub fn step(&mut self) -> Result<&StepMetrics, StepError> {
        if self.finalized {
            return Err(StepError::WorldFinalized);
        }
        if self.halted {
            return Err(StepError::Halted {
                day: self.clock.day(),
            });
        }
        let start = Instant::now();
        let mut metrics = StepMetrics {
            day: self.clock.day(),
            ..StepMetrics::default()
        };

        let mut ctx = StepContext {
            space: self.space.as_ref(),
            clock: self.clock,
            config: &self.config,
            rng: &mut self.rng,
        };
        if let Err(e) = self.abundance.step(&mut ctx, &mut metrics) {
            self.halted = true;
            error!(day = self.clock.day(), error = %e, "step failed, world halted");
            return Err(e);
        }

        let biomass_start = Instant::now();
        for pools in self.biomass.values_mut() {
            pools.step(self.clock);
        }
        metrics.biomass_us = micros(biomass_start);

        metrics.total_us = micros(start);
        self.clock.advance();
        self.last_metrics = metrics;
        Ok(&self.last_metrics)
    }

    /// Harvest a catch-at-age from one cell.
    ///
    /// Each bin loses at most what it holds; anything left uncaught is
    /// reported in the [`Removal`] and logged.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] for an unknown species or cell, a
    /// misshapen catch, or a finalized species.
    pub fn apply_catch(
        &mut self,
        species: SpeciesId,
        cell: CellId,
        catch: &StructuredAbundance,
    ) -> Result<Removal, RegistrationError> {
        let processes = self
            .abundance
            .get_mut(species)
            .ok_or(RegistrationError::UnknownSpecies { species })?;
        let removal = processes.remove(cell, catch)?;
        if removal.is_clamped() {
            warn!(
                species = %species,
                %cell,
                shortfall = removal.shortfall_total(),
                "catch exceeded stock"
            );
        }
        Ok(removal)
    }

    /// Harvest biomass from one pool and return the shortfall.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] for an unknown species or cell, or a
    /// finalized species.
    pub fn apply_biomass_catch(
        &mut self,
        species: SpeciesId,
        cell: CellId,
        amount: f64,
    ) -> Result<f64, RegistrationError> {
        self.biomass
            .get_mut(&species)
            .ok_or(RegistrationError::UnknownSpecies { species })?
            .remove(cell, amount)
    }

    /// What one cell holds now.
    ///
    /// A cell holding any abundance-tracked species reports those;
    /// otherwise its biomass pools; otherwise [`LocalBiology::Empty`].
    pub fn local_biology(&self, cell: CellId) -> LocalBiology {
        let stocks: IndexMap<SpeciesId, StructuredAbundance> = self
            .abundance
            .iter()
            .filter_map(|(id, p)| p.abundance(cell).map(|a| (id, a.clone())))
            .collect();
        if !stocks.is_empty() {
            return LocalBiology::Abundance(stocks);
        }
        let pools: IndexMap<SpeciesId, BiomassPool> = self
            .biomass
            .iter()
            .filter_map(|(&id, p)| p.pool(cell).map(|pool| (id, *pool)))
            .collect();
        if !pools.is_empty() {
            return LocalBiology::Biomass(pools);
        }
        LocalBiology::Empty
    }

    /// Biomass of one species over the whole grid.
    pub fn species_biomass(&self, species: SpeciesId) -> Option<f64> {
        if let Some(p) = self.abundance.get(species) {
            return Some(p.total_biomass());
        }
        self.biomass.get(&species).map(BiomassProcesses::total_biomass)
    }

    /// Yearly total biomass of one species.
    pub fn biomass_series(&self, species: SpeciesId) -> Option<&[f64]> {
        if let Some(p) = self.abundance.get(species) {
            return Some(p.biomass_series());
        }
        self.biomass.get(&species).map(BiomassProcesses::biomass_series)
    }

    /// Record one species' per-cell state.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::UnknownSpecies`] if the species has no
    /// processes.
    pub fn snapshot(&self, species: SpeciesId) -> Result<GridSnapshot, RegistrationError> {
        if let Some(p) = self.abundance.get(species) {
            return Ok(GridSnapshot::capture_abundance(p));
        }
        self.biomass
            .get(&species)
            .map(GridSnapshot::capture_biomass)
            .ok_or(RegistrationError::UnknownSpecies { species })
    }

    /// Write a snapshot back, scaled per cell by `weight`.
    ///
    /// # Errors
    ///
    /// Returns [`ResetError`] for an unknown species, a snapshot of the
    /// other mode, or a cell that can no longer be overwritten.
    pub fn restore(
        &mut self,
        species: SpeciesId,
        snapshot: &GridSnapshot,
        weight: impl FnMut(CellId) -> f64,
    ) -> Result<(), ResetError> {
        if let Some(p) = self.abundance.get_mut(species) {
            return snapshot.restore_abundance(p, weight, self.config.rounding);
        }
        let pools = self
            .biomass
            .get_mut(&species)
            .ok_or(RegistrationError::UnknownSpecies { species })?;
        snapshot.restore_biomass(pools, weight)
    }

    /// Spread a recorded total biomass back over a biomass species' pools.
    ///
    /// # Errors
    ///
    /// See [`BiomassResetter::reset`].
    pub fn reset_biomass(
        &mut self,
        species: SpeciesId,
        resetter: &BiomassResetter,
        allocator: &Allocator,
    ) -> Result<(), ResetError> {
        let pools = self
            .biomass
            .get_mut(&species)
            .ok_or(RegistrationError::UnknownSpecies { species })?;
        resetter.reset(pools, allocator, self.space.as_ref(), &mut self.rng)
    }

    /// Spread a recorded abundance matrix back over a species' cells.
    ///
    /// # Errors
    ///
    /// See [`AbundanceResetter::reset`].
    pub fn reset_abundance(
        &mut self,
        species: SpeciesId,
        resetter: &AbundanceResetter,
        allocator: &Allocator,
    ) -> Result<(), ResetError> {
        let processes = self
            .abundance
            .get_mut(species)
            .ok_or(RegistrationError::UnknownSpecies { species })?;
        resetter.reset(
            processes,
            allocator,
            self.space.as_ref(),
            &mut self.rng,
            self.config.rounding,
        )
    }

    /// End the simulation. Further steps and harvests fail.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.abundance.finalize();
        for pools in self.biomass.values_mut() {
            pools.finalize();
        }
        self.finalized = true;
        info!(day = self.clock.day(), "world finalized");
    }

    /// Whether [`finalize`](Self::finalize) has been called.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Whether a failed step has halted the world.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// The grid.
    pub fn space(&self) -> &dyn Space {
        self.space.as_ref()
    }

    /// Every registered species.
    pub fn registry(&self) -> &SpeciesRegistry {
        &self.registry
    }

    /// The clock, pointing at the next day to simulate.
    pub fn clock(&self) -> SimClock {
        self.clock
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Processes of an abundance-tracked species.
    pub fn processes(&self, species: SpeciesId) -> Option<&SingleSpeciesProcesses> {
        self.abundance.get(species)
    }

    /// Mutable processes of an abundance-tracked species.
    pub fn processes_mut(&mut self, species: SpeciesId) -> Option<&mut SingleSpeciesProcesses> {
        self.abundance.get_mut(species)
    }

    /// Pools of a biomass-only species.
    pub fn biomass_processes(&self, species: SpeciesId) -> Option<&BiomassProcesses> {
        self.biomass.get(&species)
    }

    /// Metrics of the most recent step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }
}
