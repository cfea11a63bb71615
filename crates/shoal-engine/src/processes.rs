//! Single-species natural-processes orchestrator.
//!
//! [`SingleSpeciesProcesses`] owns every registered cell's abundance for
//! one species and applies the natural processes to all of them, once per
//! simulated day, in a fixed order:
//!
//! 1. on the last day of a year, count spawners and compute recruits;
//! 2. natural mortality, every `mortality_interval_days`;
//! 3. aging, at the aging cadence;
//! 4. diffusion, every `diffusion_interval_days`;
//! 5. on the last day of a year, place recruits in bin 0 and record total
//!    biomass.
//!
//! Spawners are counted before that day's mortality and aging, so the
//! stock that recruits is the stock that lived through the year.
//!
//! Everything that can fail on a recruitment day (recruit computation,
//! allocator weights) runs before the first count changes. A failed step
//! leaves the abundance, the delay queues and the lifecycle as they were.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──add()──▶ Active ──finalize()──▶ Finalized
//! ```
//!
//! Cells can be added until the first step. Stepping an uninitialized or
//! finalized orchestrator is an error.

use std::sync::Arc;
use std::time::Instant;

use rand::RngCore;
use shoal_biology::allocator::split;
use shoal_biology::{
    Aging, Allocator, AbundanceArena, DiffusionPlan, Diffuser, NaturalMortality, ProcessError,
    Recruitment, Rounding,
};
use shoal_core::{
    CellId, Meristics, Removal, SimClock, Species, StructuredAbundance, FEMALE, MALE,
};
use shoal_space::Space;
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, RecruitmentScope};
use crate::error::{RegistrationError, StepError};
use crate::metrics::{micros, StepMetrics};

/// Where an orchestrator is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// No cell registered yet.
    Uninitialized,
    /// Cells registered; stepping allowed.
    Active,
    /// Simulation over; no further mutation.
    Finalized,
}

/// The runtime processes of one species.
#[derive(Clone, Debug)]
pub struct ProcessSet {
    /// Natural mortality.
    pub mortality: NaturalMortality,
    /// Aging.
    pub aging: Aging,
    /// Days between aging passes.
    pub aging_cadence_days: u32,
    /// Recruitment. With [`RecruitmentScope::Local`] each cell runs its
    /// own copy.
    pub recruitment: Recruitment,
    /// Movement between cells.
    pub diffusion: Diffuser,
    /// Placement of globally computed recruits.
    pub allocator: Option<Allocator>,
    /// Global or per-cell recruitment.
    pub scope: RecruitmentScope,
}

/// Everything a species needs from the world for one tick.
pub struct StepContext<'a> {
    /// The grid.
    pub space: &'a dyn Space,
    /// The day being simulated.
    pub clock: SimClock,
    /// Engine-wide settings.
    pub config: &'a EngineConfig,
    /// The world's shared generator.
    pub rng: &'a mut dyn RngCore,
}

enum PendingRecruits {
    Global { recruits: u64, weights: Vec<f64> },
    Local(Vec<u64>),
}

/// Natural processes of one species over every registered cell.
#[derive(Debug)]
pub struct SingleSpeciesProcesses {
    species: Species,
    processes: ProcessSet,
    state: Lifecycle,
    arena: AbundanceArena,
    local_recruitment: Vec<Recruitment>,
    plan: Option<Arc<DiffusionPlan>>,
    stepping: bool,
    last_recruits: u64,
    biomass_series: Vec<f64>,
}

impl SingleSpeciesProcesses {
    /// An uninitialized orchestrator. Prefer
    /// [`SpeciesProcessesConfig::build`](crate::SpeciesProcessesConfig::build),
    /// which validates the processes first.
    pub fn new(species: Species, processes: ProcessSet) -> Self {
        Self {
            species,
            processes,
            state: Lifecycle::Uninitialized,
            arena: AbundanceArena::new(),
            local_recruitment: Vec::new(),
            plan: None,
            stepping: false,
            last_recruits: 0,
            biomass_series: Vec::new(),
        }
    }

    /// The species driven.
    pub fn species(&self) -> &Species {
        &self.species
    }

    /// Current lifecycle state.
    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// The recruitment process (the template copy under local scope).
    pub fn recruitment(&self) -> &Recruitment {
        &self.processes.recruitment
    }

    /// The recruit allocator, if any.
    pub fn allocator(&self) -> Option<&Allocator> {
        self.processes.allocator.as_ref()
    }

    /// Replace the recruit allocator. Removing it under global scope makes
    /// the next recruitment fail with [`StepError::MissingAllocator`].
    pub fn set_allocator(&mut self, allocator: Option<Allocator>) {
        self.processes.allocator = allocator;
    }

    /// Register a cell's starting abundance.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] if the orchestrator is finalized or
    /// already stepping, the matrix has the wrong shape, or the cell is
    /// already registered.
    pub fn add(
        &mut self,
        cell: CellId,
        abundance: StructuredAbundance,
    ) -> Result<(), RegistrationError> {
        if self.state == Lifecycle::Finalized {
            return Err(RegistrationError::Finalized);
        }
        if self.stepping {
            return Err(RegistrationError::AlreadyStepping);
        }
        self.check_shape(cell, &abundance)?;
        if !self.arena.insert(cell, abundance) {
            return Err(RegistrationError::DuplicateCell { cell });
        }
        self.state = Lifecycle::Active;
        Ok(())
    }

    /// Published abundance of `cell`.
    pub fn abundance(&self, cell: CellId) -> Option<&StructuredAbundance> {
        self.arena.get(cell)
    }

    /// Registered cells in registration order.
    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.arena.cells()
    }

    /// Number of registered cells.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether no cell is registered.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Biomass over every registered cell.
    pub fn total_biomass(&self) -> f64 {
        self.arena.biomass(self.species.meristics())
    }

    /// Counts summed over every registered cell.
    pub fn total_abundance(&self) -> StructuredAbundance {
        let mut total = StructuredAbundance::for_meristics(self.species.meristics());
        for (_, abundance) in self.arena.iter() {
            let added = total.accumulate(abundance);
            debug_assert!(added.is_ok(), "registered shapes match the species");
        }
        total
    }

    /// Total biomass recorded at the end of each simulated year.
    pub fn biomass_series(&self) -> &[f64] {
        &self.biomass_series
    }

    /// Recruits placed at the most recent recruitment.
    pub fn last_recruits(&self) -> u64 {
        self.last_recruits
    }

    /// Diffusion radius, or `None` when the species does not move.
    pub fn diffusion_radius(&self) -> Option<u32> {
        self.processes.diffusion.radius()
    }

    /// The diffusion plan in use, if one has been built.
    pub fn diffusion_plan(&self) -> Option<&Arc<DiffusionPlan>> {
        self.plan.as_ref()
    }

    /// Adopt a plan built elsewhere over the same cells.
    ///
    /// Ignored unless it covers exactly this orchestrator's cells at its
    /// diffusion radius.
    pub fn use_plan(&mut self, plan: Arc<DiffusionPlan>) -> bool {
        let fits = Some(plan.radius()) == self.diffusion_radius() && plan.slots() == self.len();
        if fits {
            self.plan = Some(plan);
        }
        fits
    }

    /// Remove a catch-at-age from one cell.
    ///
    /// Every bin loses at most what it holds; the unmet part is reported
    /// in the returned [`Removal`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] if finalized, the cell is unknown, or
    /// the catch has the wrong shape.
    pub fn remove(
        &mut self,
        cell: CellId,
        catch: &StructuredAbundance,
    ) -> Result<Removal, RegistrationError> {
        if self.state == Lifecycle::Finalized {
            return Err(RegistrationError::Finalized);
        }
        let abundance = self
            .arena
            .get_mut(cell)
            .ok_or(RegistrationError::UnknownCell { cell })?;
        Ok(abundance.remove(catch)?)
    }

    /// Overwrite a registered cell's abundance.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] if finalized, the cell is unknown, or
    /// the matrix has the wrong shape.
    pub fn replace(
        &mut self,
        cell: CellId,
        abundance: StructuredAbundance,
    ) -> Result<(), RegistrationError> {
        if self.state == Lifecycle::Finalized {
            return Err(RegistrationError::Finalized);
        }
        self.check_shape(cell, &abundance)?;
        let slot = self
            .arena
            .get_mut(cell)
            .ok_or(RegistrationError::UnknownCell { cell })?;
        *slot = abundance;
        Ok(())
    }

    /// End the simulation for this species.
    pub fn finalize(&mut self) {
        if self.state != Lifecycle::Finalized {
            info!(
                species = %self.species.name(),
                years = self.biomass_series.len(),
                "species finalized"
            );
        }
        self.state = Lifecycle::Finalized;
    }

    /// Run one simulated day and return the recruits placed (zero on days
    /// without recruitment).
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] if the orchestrator is not active, recruitment
    /// fails, or global recruitment fires without an allocator.
    pub fn step(
        &mut self,
        ctx: &mut StepContext<'_>,
        metrics: &mut StepMetrics,
    ) -> Result<u64, StepError> {
        match self.state {
            Lifecycle::Uninitialized => {
                return Err(StepError::NotStarted {
                    species: self.species.name().to_owned(),
                })
            }
            Lifecycle::Finalized => {
                return Err(StepError::Finalized {
                    species: self.species.name().to_owned(),
                })
            }
            Lifecycle::Active => {}
        }
        if !self.stepping {
            self.stepping = true;
            info!(
                species = %self.species.name(),
                cells = self.arena.len(),
                "species active"
            );
        }

        let meristics = self.species.meristics_arc();
        let clock = ctx.clock;
        let rounding = ctx.config.rounding;
        let year_end = clock.is_year_end();

        let start = Instant::now();
        let pending = if year_end {
            Some(self.compute_recruits(&meristics, clock.year(), ctx)?)
        } else {
            None
        };
        metrics.recruitment_us += micros(start);

        let interval = ctx.config.mortality_interval_days;
        if clock.fires_every(interval) {
            let start = Instant::now();
            for (_, abundance) in self.arena.iter_mut() {
                self.processes
                    .mortality
                    .cull(&meristics, abundance, interval, rounding);
            }
            metrics.mortality_us += micros(start);
        }

        if clock.fires_every(self.processes.aging_cadence_days) {
            let start = Instant::now();
            for (_, abundance) in self.arena.iter_mut() {
                self.processes.aging.age(abundance, rounding);
            }
            metrics.aging_us += micros(start);
        }

        if clock.fires_every(ctx.config.diffusion_interval_days) {
            if let Some(radius) = self.diffusion_radius() {
                let start = Instant::now();
                let plan = self.plan_for(ctx.space, radius);
                self.processes
                    .diffusion
                    .diffuse(&plan, &mut self.arena, rounding);
                debug!(
                    species = %self.species.name(),
                    day = clock.day(),
                    pairs = plan.pairs().len(),
                    "diffusion pass"
                );
                metrics.diffusion_us += micros(start);
            }
        }

        let Some(pending) = pending else {
            return Ok(0);
        };
        let start = Instant::now();
        let placed = self.place(pending, rounding)?;
        self.last_recruits = placed;
        let biomass = self.total_biomass();
        self.biomass_series.push(biomass);
        metrics.recruitment_us += micros(start);
        info!(
            species = %self.species.name(),
            year = clock.year(),
            recruits = placed,
            biomass,
            "yearly recruitment"
        );
        Ok(placed)
    }

    fn check_shape(
        &self,
        cell: CellId,
        abundance: &StructuredAbundance,
    ) -> Result<(), RegistrationError> {
        let meristics = self.species.meristics();
        if abundance.subdivisions() != meristics.subdivisions() || abundance.bins() != meristics.bins()
        {
            return Err(RegistrationError::ShapeMismatch {
                cell,
                expected_subdivisions: meristics.subdivisions(),
                expected_bins: meristics.bins(),
                subdivisions: abundance.subdivisions(),
                bins: abundance.bins(),
            });
        }
        Ok(())
    }

    fn process_error(&self, source: ProcessError) -> StepError {
        StepError::Process {
            species: self.species.name().to_owned(),
            source,
        }
    }

    fn plan_for(&mut self, space: &dyn Space, radius: u32) -> Arc<DiffusionPlan> {
        match &self.plan {
            Some(plan) if plan.radius() == radius && plan.slots() == self.arena.len() => {
                Arc::clone(plan)
            }
            _ => {
                let cells: Vec<CellId> = self.arena.cells().collect();
                let plan = Arc::new(DiffusionPlan::new(space, &cells, radius));
                self.plan = Some(Arc::clone(&plan));
                plan
            }
        }
    }

    /// Normalized allocator weights of the registered cells.
    fn recruit_weights(&self, ctx: &mut StepContext<'_>) -> Result<Vec<f64>, StepError> {
        let Some(allocator) = &self.processes.allocator else {
            return Err(StepError::MissingAllocator {
                species: self.species.name().to_owned(),
            });
        };
        let cells: Vec<CellId> = self.arena.cells().collect();
        allocator
            .normalized_weights(&cells, ctx.space, &mut *ctx.rng)
            .map_err(|e| {
                warn!(
                    species = %self.species.name(),
                    error = %e,
                    "recruits cannot be placed"
                );
                self.process_error(e)
            })
    }

    /// Recruits due this year. Delay queues are only updated once every
    /// computation has succeeded.
    fn compute_recruits(
        &mut self,
        meristics: &Meristics,
        year: u32,
        ctx: &mut StepContext<'_>,
    ) -> Result<PendingRecruits, StepError> {
        let two_sexes = meristics.subdivisions() > MALE;
        match self.processes.scope {
            RecruitmentScope::Global => {
                let weights = self.recruit_weights(ctx)?;
                let mut female = vec![0.0; meristics.bins()];
                let mut male = if two_sexes {
                    vec![0.0; meristics.bins()]
                } else {
                    Vec::new()
                };
                for (_, abundance) in self.arena.iter() {
                    accumulate(&mut female, abundance.subdivision(FEMALE));
                    if two_sexes {
                        accumulate(&mut male, abundance.subdivision(MALE));
                    }
                }
                let mut recruitment = self.processes.recruitment.clone();
                let recruits = recruitment
                    .recruit(meristics, &female, &male, year, &mut *ctx.rng)
                    .map_err(|e| self.process_error(e))?;
                self.processes.recruitment = recruitment;
                Ok(PendingRecruits::Global { recruits, weights })
            }
            RecruitmentScope::Local => {
                let mut local = if self.local_recruitment.len() == self.arena.len() {
                    self.local_recruitment.clone()
                } else {
                    vec![self.processes.recruitment.clone(); self.arena.len()]
                };
                let mut per_cell = Vec::with_capacity(self.arena.len());
                for ((_, abundance), recruitment) in self.arena.iter().zip(local.iter_mut()) {
                    let male: &[f64] = if two_sexes {
                        abundance.subdivision(MALE)
                    } else {
                        &[]
                    };
                    let recruits = recruitment
                        .recruit(
                            meristics,
                            abundance.subdivision(FEMALE),
                            male,
                            year,
                            &mut *ctx.rng,
                        )
                        .map_err(|e| self.process_error(e))?;
                    per_cell.push(recruits);
                }
                self.local_recruitment = local;
                Ok(PendingRecruits::Local(per_cell))
            }
        }
    }

    fn place(&mut self, pending: PendingRecruits, rounding: Rounding) -> Result<u64, StepError> {
        let shares = match pending {
            PendingRecruits::Local(per_cell) => per_cell.into_iter().map(|n| n as f64).collect(),
            PendingRecruits::Global { recruits, weights } => {
                split(recruits as f64, &weights, rounding)
            }
        };

        let mut placed = 0.0;
        for ((_, abundance), share) in self.arena.iter_mut().zip(shares) {
            add_recruits(abundance, share, rounding).map_err(|e| StepError::Process {
                species: self.species.name().to_owned(),
                source: e,
            })?;
            placed += share;
        }
        Ok(placed as u64)
    }
}

fn accumulate(into: &mut [f64], row: &[f64]) {
    for (total, &count) in into.iter_mut().zip(row) {
        *total += count;
    }
}

/// Put `amount` recruits into bin 0, split evenly across subdivisions.
/// Whole remainders go to the lowest subdivisions.
fn add_recruits(
    abundance: &mut StructuredAbundance,
    amount: f64,
    rounding: Rounding,
) -> Result<(), ProcessError> {
    let subdivisions = abundance.subdivisions();
    let shares: Vec<f64> = match rounding {
        Rounding::Fractional => vec![amount / subdivisions as f64; subdivisions],
        Rounding::Whole => {
            let amount = amount.floor();
            let base = (amount / subdivisions as f64).floor();
            let remainder = amount - base * subdivisions as f64;
            (0..subdivisions)
                .map(|s| if (s as f64) < remainder { base + 1.0 } else { base })
                .collect()
        }
    };
    for (subdivision, share) in shares.into_iter().enumerate() {
        if share > 0.0 {
            abundance.add(subdivision, 0, share)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgingSpec, RecruitmentSpec, SpeciesProcessesConfig};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use shoal_biology::RecruitmentKind;
    use shoal_core::SpeciesRegistry;
    use shoal_test_utils::{growing_species, open_grid, seeded_abundance, two_sex_species};

    fn species(bins: usize) -> Species {
        species_from(two_sex_species(bins))
    }

    fn species_from(meristics: Meristics) -> Species {
        let mut registry = SpeciesRegistry::new();
        let id = registry.register("cod", meristics).unwrap();
        registry.get(id).unwrap().clone()
    }

    fn fixed_config(recruits: f64) -> SpeciesProcessesConfig {
        SpeciesProcessesConfig::new(
            NaturalMortality::Exponential,
            RecruitmentSpec::new(RecruitmentKind::Fixed {
                recruits,
                yearly_scale: Default::default(),
            }),
        )
    }

    fn run_days(
        processes: &mut SingleSpeciesProcesses,
        space: &dyn Space,
        days: u32,
    ) -> Result<u64, StepError> {
        run_observed(processes, space, &EngineConfig::default(), days, |_, _| {})
    }

    /// Step `days` days, calling `after` with the day just run.
    fn run_observed(
        processes: &mut SingleSpeciesProcesses,
        space: &dyn Space,
        config: &EngineConfig,
        days: u32,
        mut after: impl FnMut(u64, &SingleSpeciesProcesses),
    ) -> Result<u64, StepError> {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut clock = SimClock::default();
        let mut metrics = StepMetrics::default();
        let mut placed = 0;
        for _ in 0..days {
            let mut ctx = StepContext {
                space,
                clock,
                config,
                rng: &mut rng,
            };
            placed += processes.step(&mut ctx, &mut metrics)?;
            after(clock.day(), processes);
            clock.advance();
        }
        Ok(placed)
    }

    #[test]
    fn lifecycle_transitions() {
        let s = species(2);
        let grid = open_grid(1, 2);
        let mut p = fixed_config(0.0).build(&s).unwrap();
        assert_eq!(p.state(), Lifecycle::Uninitialized);
        assert!(matches!(
            run_days(&mut p, &grid, 1),
            Err(StepError::NotStarted { .. })
        ));
        p.add(CellId(0), seeded_abundance(s.meristics(), 1.0, 1.0)).unwrap();
        assert_eq!(p.state(), Lifecycle::Active);
        run_days(&mut p, &grid, 1).unwrap();
        assert_eq!(
            p.add(CellId(1), seeded_abundance(s.meristics(), 1.0, 1.0)),
            Err(RegistrationError::AlreadyStepping)
        );
        p.finalize();
        assert!(matches!(
            run_days(&mut p, &grid, 1),
            Err(StepError::Finalized { .. })
        ));
        assert_eq!(
            p.remove(CellId(0), &StructuredAbundance::zeros(2, 2)),
            Err(RegistrationError::Finalized)
        );
    }

    #[test]
    fn duplicate_and_misshapen_cells_rejected() {
        let s = species(2);
        let mut p = fixed_config(0.0).build(&s).unwrap();
        p.add(CellId(3), seeded_abundance(s.meristics(), 1.0, 1.0)).unwrap();
        assert_eq!(
            p.add(CellId(3), seeded_abundance(s.meristics(), 2.0, 2.0)),
            Err(RegistrationError::DuplicateCell { cell: CellId(3) })
        );
        assert!(matches!(
            p.add(CellId(4), StructuredAbundance::zeros(2, 5)),
            Err(RegistrationError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn recruits_arrive_only_at_year_end() {
        let s = species(2);
        let grid = open_grid(1, 2);
        let mut p = fixed_config(10.0).build(&s).unwrap();
        for cell in grid.canonical_ordering() {
            p.add(cell, StructuredAbundance::zeros(2, 2)).unwrap();
        }
        assert_eq!(run_days(&mut p, &grid, 364).unwrap(), 0);
        assert_eq!(p.total_abundance().total(), 0.0);
        assert!(p.biomass_series().is_empty());
    }

    #[test]
    fn one_year_places_recruits() {
        let s = species(2);
        let grid = open_grid(1, 2);
        let mut p = fixed_config(10.0).build(&s).unwrap();
        for cell in grid.canonical_ordering() {
            p.add(cell, StructuredAbundance::zeros(2, 2)).unwrap();
        }
        assert_eq!(run_days(&mut p, &grid, 365).unwrap(), 10);
        assert_eq!(p.last_recruits(), 10);
        let a = p.abundance(CellId(0)).unwrap();
        assert_eq!(a.subdivision(FEMALE), &[3.0, 0.0]);
        assert_eq!(a.subdivision(MALE), &[2.0, 0.0]);
        assert_eq!(p.biomass_series(), &[10.0]);
    }

    #[test]
    fn removed_allocator_is_a_step_error() {
        let s = species(2);
        let grid = open_grid(1, 1);
        let mut p = fixed_config(10.0).build(&s).unwrap();
        p.add(CellId(0), StructuredAbundance::zeros(2, 2)).unwrap();
        p.set_allocator(None);
        assert_eq!(
            run_days(&mut p, &grid, 365),
            Err(StepError::MissingAllocator {
                species: "cod".into()
            })
        );
    }

    #[test]
    fn local_scope_recruits_from_own_cell() {
        let s = species(2);
        let grid = open_grid(1, 2);
        let mut config = SpeciesProcessesConfig::new(
            NaturalMortality::Exponential,
            RecruitmentSpec::new(RecruitmentKind::beverton_holt(s.meristics(), false)),
        );
        config.scope = RecruitmentScope::Local;
        config.allocator = None;
        let mut p = config.build(&s).unwrap();
        p.add(CellId(0), seeded_abundance(s.meristics(), 100.0, 100.0)).unwrap();
        p.add(CellId(1), StructuredAbundance::zeros(2, 2)).unwrap();
        let placed = run_days(&mut p, &grid, 365).unwrap();
        assert!(placed > 0);
        assert_eq!(p.abundance(CellId(1)).unwrap().total(), 0.0);
        assert_eq!(p.abundance(CellId(0)).unwrap().get(FEMALE, 0) as u64 * 2, placed);
    }

    #[test]
    fn harvest_clamps_and_reports() {
        let s = species(2);
        let mut p = fixed_config(0.0).build(&s).unwrap();
        p.add(CellId(0), seeded_abundance(s.meristics(), 5.0, 5.0)).unwrap();
        let catch = StructuredAbundance::from_rows(vec![vec![8.0, 0.0], vec![2.0, 0.0]]).unwrap();
        let removal = p.remove(CellId(0), &catch).unwrap();
        assert_eq!(removal.removed_total(), 7.0);
        assert_eq!(removal.shortfall_total(), 3.0);
        assert_eq!(p.abundance(CellId(0)).unwrap().subdivision(FEMALE), &[0.0, 0.0]);
        assert_eq!(
            p.remove(CellId(9), &catch),
            Err(RegistrationError::UnknownCell { cell: CellId(9) })
        );
    }

    #[test]
    fn add_recruits_splits_remainder_low() {
        let mut a = StructuredAbundance::zeros(3, 1);
        add_recruits(&mut a, 11.0, Rounding::Whole).unwrap();
        assert_eq!(a.as_slice(), &[4.0, 4.0, 3.0]);
        let mut b = StructuredAbundance::zeros(2, 1);
        add_recruits(&mut b, 3.0, Rounding::Fractional).unwrap();
        assert_eq!(b.as_slice(), &[1.5, 1.5]);
    }

    #[test]
    fn failed_allocation_changes_nothing() {
        let s = species(2);
        let grid = open_grid(1, 2);
        let mut config = fixed_config(10.0);
        config.recruitment.delay_years = 1;
        config.allocator = Some(Allocator::Fixed {
            weights: [(CellId(99), 1.0)].into_iter().collect(),
        });
        let mut p = config.build(&s).unwrap();
        for cell in grid.canonical_ordering() {
            p.add(cell, seeded_abundance(s.meristics(), 200.0, 250.0)).unwrap();
        }

        let err = run_days(&mut p, &grid, 365).unwrap_err();
        assert!(matches!(
            err,
            StepError::Process {
                source: ProcessError::NoValidCell { .. },
                ..
            }
        ));
        // The last day's aging and the delay queue were not touched.
        let a = p.abundance(CellId(0)).unwrap();
        assert_eq!(a.subdivision(FEMALE), &[200.0, 0.0]);
        assert_eq!(a.subdivision(MALE), &[250.0, 0.0]);
        assert_eq!(p.recruitment(), &config.recruitment.build().unwrap());
        assert!(p.biomass_series().is_empty());
    }

    #[test]
    fn length_transition_fires_on_its_cadence() {
        let s = species_from(growing_species());
        let grid = open_grid(1, 1);
        let mut config = fixed_config(0.0);
        config.aging = AgingSpec::LengthTransition {
            size_sd: 5.0,
            cadence_days: 2,
        };
        let mut p = config.build(&s).unwrap();
        p.add(CellId(0), seeded_abundance(s.meristics(), 1000.0, 1000.0)).unwrap();

        let mut smallest = Vec::new();
        let mut totals = Vec::new();
        run_observed(&mut p, &grid, &EngineConfig::default(), 8, |_, p| {
            let a = p.abundance(CellId(0)).unwrap();
            smallest.push(a.get(FEMALE, 0));
            totals.push(a.total());
        })
        .unwrap();

        // Days 0, 2, 4, 6 leave the stock alone; days 1, 3, 5, 7 grow it.
        assert_eq!(smallest[0], 1000.0);
        for day in (1..8).step_by(2) {
            assert!(smallest[day] < smallest[day - 1], "day {day}: {smallest:?}");
        }
        for day in (2..8).step_by(2) {
            assert_eq!(smallest[day], smallest[day - 1], "day {day}: {smallest:?}");
        }
        assert!(totals.iter().all(|&t| t == 2000.0), "{totals:?}");
    }

    #[test]
    fn proportional_aging_runs_yearly() {
        let s = species(3);
        let grid = open_grid(1, 1);
        let mut config = fixed_config(0.0);
        config.aging = AgingSpec::Proportional {
            proportion: 0.5,
            plus_group: false,
        };
        let mut p = config.build(&s).unwrap();
        p.add(CellId(0), seeded_abundance(s.meristics(), 100.0, 50.0)).unwrap();

        run_days(&mut p, &grid, 364).unwrap();
        assert_eq!(p.abundance(CellId(0)).unwrap().subdivision(FEMALE), &[100.0, 0.0, 0.0]);

        let mut p = config.build(&s).unwrap();
        p.add(CellId(0), seeded_abundance(s.meristics(), 100.0, 50.0)).unwrap();
        run_days(&mut p, &grid, 365).unwrap();
        assert_eq!(p.abundance(CellId(0)).unwrap().subdivision(FEMALE), &[50.0, 50.0, 0.0]);

        let mut p = config.build(&s).unwrap();
        p.add(CellId(0), seeded_abundance(s.meristics(), 100.0, 50.0)).unwrap();
        run_days(&mut p, &grid, 2 * 365).unwrap();
        let a = p.abundance(CellId(0)).unwrap();
        assert_eq!(a.subdivision(FEMALE), &[25.0, 50.0, 25.0]);
        assert_eq!(a.subdivision(MALE), &[13.0, 25.0, 12.0]);
    }

    #[test]
    fn daily_mortality_compounds_to_annual() {
        let s = species(2);
        let grid = open_grid(1, 1);
        let mut config = fixed_config(0.0);
        config.mortality = NaturalMortality::proportional(0.3).unwrap();

        let yearly = EngineConfig {
            rounding: Rounding::Fractional,
            ..EngineConfig::default()
        };
        let daily = EngineConfig {
            mortality_interval_days: 1,
            ..yearly.clone()
        };

        let mut once = config.build(&s).unwrap();
        once.add(CellId(0), seeded_abundance(s.meristics(), 1000.0, 500.0)).unwrap();
        run_observed(&mut once, &grid, &yearly, 365, |_, _| {}).unwrap();

        let mut every_day = config.build(&s).unwrap();
        every_day.add(CellId(0), seeded_abundance(s.meristics(), 1000.0, 500.0)).unwrap();
        let mut day_100 = 0.0;
        run_observed(&mut every_day, &grid, &daily, 365, |day, p| {
            if day == 99 {
                day_100 = p.abundance(CellId(0)).unwrap().get(FEMALE, 0);
            }
        })
        .unwrap();

        assert!((day_100 - 1000.0 * 0.7f64.powf(100.0 / 365.0)).abs() < 1e-6);
        let a = once.abundance(CellId(0)).unwrap();
        let b = every_day.abundance(CellId(0)).unwrap();
        assert!((a.get(FEMALE, 1) - 700.0).abs() < 1e-6);
        for subdivision in [FEMALE, MALE] {
            for bin in 0..2 {
                assert!((a.get(subdivision, bin) - b.get(subdivision, bin)).abs() < 1e-6);
            }
        }
    }
}
