//! Multi-species natural processes.
//!
//! Holds one [`SingleSpeciesProcesses`] per species and steps them in
//! registration order. Species that move over the same cells at the same
//! radius share one [`DiffusionPlan`], the neighbour pair list. The plan
//! is read-only; each species still runs its own diffusion pass over its
//! own arena at its own rate, so counts never cross between species.

use std::sync::Arc;

use indexmap::IndexMap;
use shoal_biology::DiffusionPlan;
use shoal_core::{CellId, SpeciesId};
use shoal_space::Space;
use tracing::debug;

use crate::config::ConfigError;
use crate::error::StepError;
use crate::metrics::StepMetrics;
use crate::processes::{SingleSpeciesProcesses, StepContext};

struct SharedPlan {
    radius: u32,
    cells: Vec<CellId>,
    plan: Arc<DiffusionPlan>,
}

/// Natural processes of every abundance-tracked species.
#[derive(Default)]
pub struct MultiSpeciesProcesses {
    species: IndexMap<SpeciesId, SingleSpeciesProcesses>,
    plans: Vec<SharedPlan>,
}

impl MultiSpeciesProcesses {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a species' processes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateSpecies`] if the species is already
    /// present.
    pub fn insert(&mut self, processes: SingleSpeciesProcesses) -> Result<(), ConfigError> {
        let id = processes.species().id();
        if self.species.contains_key(&id) {
            return Err(ConfigError::DuplicateSpecies { species: id });
        }
        self.species.insert(id, processes);
        Ok(())
    }

    /// Processes of one species.
    pub fn get(&self, species: SpeciesId) -> Option<&SingleSpeciesProcesses> {
        self.species.get(&species)
    }

    /// Mutable processes of one species.
    pub fn get_mut(&mut self, species: SpeciesId) -> Option<&mut SingleSpeciesProcesses> {
        self.species.get_mut(&species)
    }

    /// Species in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (SpeciesId, &SingleSpeciesProcesses)> {
        self.species.iter().map(|(id, p)| (*id, p))
    }

    /// Mutable species in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SpeciesId, &mut SingleSpeciesProcesses)> {
        self.species.iter_mut().map(|(id, p)| (*id, p))
    }

    /// Number of species.
    pub fn len(&self) -> usize {
        self.species.len()
    }

    /// Whether no species is present.
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Number of distinct diffusion plans built so far.
    pub fn plan_count(&self) -> usize {
        self.plans.len()
    }

    /// Step every species through one day, recording each one's recruits
    /// in `metrics`.
    ///
    /// # Errors
    ///
    /// Stops at the first species that fails and returns its error.
    pub fn step(
        &mut self,
        ctx: &mut StepContext<'_>,
        metrics: &mut StepMetrics,
    ) -> Result<(), StepError> {
        self.share_plans(ctx.space);
        for (id, processes) in self.species.iter_mut() {
            let recruits = processes.step(ctx, metrics)?;
            if ctx.clock.is_year_end() {
                metrics.recruits.push((*id, recruits));
            }
        }
        Ok(())
    }

    /// Mark every species finalized.
    pub fn finalize(&mut self) {
        for processes in self.species.values_mut() {
            processes.finalize();
        }
    }

    fn share_plans(&mut self, space: &dyn Space) {
        for processes in self.species.values_mut() {
            let Some(radius) = processes.diffusion_radius() else {
                continue;
            };
            if processes
                .diffusion_plan()
                .is_some_and(|p| p.radius() == radius && p.slots() == processes.len())
            {
                continue;
            }
            let cells: Vec<CellId> = processes.cells().collect();
            let shared = match self
                .plans
                .iter()
                .find(|s| s.radius == radius && s.cells == cells)
            {
                Some(shared) => Arc::clone(&shared.plan),
                None => {
                    let plan = Arc::new(DiffusionPlan::new(space, &cells, radius));
                    debug!(radius, cells = cells.len(), "diffusion plan built");
                    self.plans.push(SharedPlan {
                        radius,
                        cells,
                        plan: Arc::clone(&plan),
                    });
                    plan
                }
            };
            processes.use_plan(shared);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, RecruitmentSpec, SpeciesProcessesConfig};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use shoal_biology::{Diffuser, NaturalMortality, RecruitmentKind};
    use shoal_core::{SimClock, SpeciesRegistry, StructuredAbundance, FEMALE};
    use shoal_test_utils::{open_grid, seeded_abundance, two_sex_species};

    fn build(registry: &mut SpeciesRegistry, name: &str, diffusion: Diffuser) -> SingleSpeciesProcesses {
        build_with(registry, name, diffusion, |_| {
            seeded_abundance(&two_sex_species(2), 10.0, 10.0)
        })
    }

    fn build_with(
        registry: &mut SpeciesRegistry,
        name: &str,
        diffusion: Diffuser,
        stock: impl Fn(CellId) -> StructuredAbundance,
    ) -> SingleSpeciesProcesses {
        let id = registry.register(name, two_sex_species(2)).unwrap();
        let species = registry.get(id).unwrap().clone();
        let mut config = SpeciesProcessesConfig::new(
            NaturalMortality::Exponential,
            RecruitmentSpec::new(RecruitmentKind::Fixed {
                recruits: 8.0,
                yearly_scale: Default::default(),
            }),
        );
        config.diffusion = diffusion;
        let mut p = config.build(&species).unwrap();
        for cell in open_grid(2, 2).canonical_ordering() {
            p.add(cell, stock(cell)).unwrap();
        }
        p
    }

    /// `female` fish in bin 0 of `home` (half as many males), nothing elsewhere.
    fn stock_at(cell: CellId, home: CellId, female: f64) -> StructuredAbundance {
        let n = if cell == home { female } else { 0.0 };
        seeded_abundance(&two_sex_species(2), n, n / 2.0)
    }

    #[test]
    fn duplicate_species_rejected() {
        let mut registry = SpeciesRegistry::new();
        let first = build(&mut registry, "cod", Diffuser::None);
        let id = first.species().id();
        let species = first.species().clone();
        let second = SpeciesProcessesConfig::new(
            NaturalMortality::Exponential,
            RecruitmentSpec::new(RecruitmentKind::Fixed {
                recruits: 0.0,
                yearly_scale: Default::default(),
            }),
        )
        .build(&species)
        .unwrap();
        let mut multi = MultiSpeciesProcesses::new();
        multi.insert(first).unwrap();
        assert_eq!(
            multi.insert(second),
            Err(ConfigError::DuplicateSpecies { species: id })
        );
        assert_eq!(multi.len(), 1);
    }

    #[test]
    fn same_radius_species_share_a_plan() {
        let mut registry = SpeciesRegistry::new();
        let grid = open_grid(2, 2);
        let mut multi = MultiSpeciesProcesses::new();
        multi
            .insert(build(&mut registry, "cod", Diffuser::constant_rate(1, 0.1).unwrap()))
            .unwrap();
        multi
            .insert(build(&mut registry, "hake", Diffuser::constant_rate(1, 0.3).unwrap()))
            .unwrap();
        multi
            .insert(build(&mut registry, "ling", Diffuser::None))
            .unwrap();

        let config = EngineConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut ctx = StepContext {
            space: &grid,
            clock: SimClock::default(),
            config: &config,
            rng: &mut rng,
        };
        multi.step(&mut ctx, &mut StepMetrics::default()).unwrap();
        assert_eq!(multi.plan_count(), 1);
        let plans: Vec<_> = multi
            .iter()
            .filter_map(|(_, p)| p.diffusion_plan().cloned())
            .collect();
        assert_eq!(plans.len(), 2);
        assert!(Arc::ptr_eq(&plans[0], &plans[1]));
    }

    #[test]
    fn year_end_records_recruits_per_species() {
        let mut registry = SpeciesRegistry::new();
        let grid = open_grid(2, 2);
        let mut multi = MultiSpeciesProcesses::new();
        let cod = build(&mut registry, "cod", Diffuser::None);
        let cod_id = cod.species().id();
        multi.insert(cod).unwrap();
        let ling = build(&mut registry, "ling", Diffuser::None);
        let ling_id = ling.species().id();
        multi.insert(ling).unwrap();

        let config = EngineConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut clock = SimClock::default();
        let mut metrics = StepMetrics::default();
        for day in 0..365 {
            if day == 364 {
                metrics.recruits.clear();
            }
            let mut ctx = StepContext {
                space: &grid,
                clock,
                config: &config,
                rng: &mut rng,
            };
            multi.step(&mut ctx, &mut metrics).unwrap();
            clock.advance();
        }
        assert_eq!(metrics.recruits_for(cod_id), Some(8));
        assert_eq!(metrics.recruits_for(ling_id), Some(8));
        let cod = multi.get(cod_id).unwrap();
        assert_eq!(cod.total_abundance().total(), 88.0);
        assert_eq!(
            cod.abundance(CellId(0)).unwrap(),
            &StructuredAbundance::from_rows(vec![vec![1.0, 10.0], vec![1.0, 10.0]]).unwrap()
        );
    }

    #[test]
    fn shared_plan_keeps_species_apart() {
        let cod_stock = |c| stock_at(c, CellId(0), 100.0);
        let hake_stock = |c| stock_at(c, CellId(3), 60.0);
        let cod_rate = || Diffuser::constant_rate(1, 0.1).unwrap();
        let hake_rate = || Diffuser::constant_rate(1, 0.3).unwrap();

        let mut registry = SpeciesRegistry::new();
        let mut multi = MultiSpeciesProcesses::new();
        let cod = build_with(&mut registry, "cod", cod_rate(), cod_stock);
        let cod_id = cod.species().id();
        multi.insert(cod).unwrap();
        let hake = build_with(&mut registry, "hake", hake_rate(), hake_stock);
        let hake_id = hake.species().id();
        multi.insert(hake).unwrap();

        let mut alone = SpeciesRegistry::new();
        let mut cod_alone = build_with(&mut alone, "cod", cod_rate(), cod_stock);
        let mut hake_alone = build_with(&mut alone, "hake", hake_rate(), hake_stock);

        let grid = open_grid(2, 2);
        let config = EngineConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut clock = SimClock::default();
        for _ in 0..5 {
            let mut ctx = StepContext {
                space: &grid,
                clock,
                config: &config,
                rng: &mut rng,
            };
            multi.step(&mut ctx, &mut StepMetrics::default()).unwrap();
            cod_alone.step(&mut ctx, &mut StepMetrics::default()).unwrap();
            hake_alone.step(&mut ctx, &mut StepMetrics::default()).unwrap();
            clock.advance();
        }

        assert_eq!(multi.plan_count(), 1);
        let cod = multi.get(cod_id).unwrap();
        let hake = multi.get(hake_id).unwrap();
        for cell in grid.canonical_ordering() {
            assert_eq!(cod.abundance(cell), cod_alone.abundance(cell), "cod {cell}");
            assert_eq!(hake.abundance(cell), hake_alone.abundance(cell), "hake {cell}");
        }
        assert_eq!(cod.total_abundance().total(), 150.0);
        assert_eq!(hake.total_abundance().total(), 90.0);
        assert!(cod.abundance(CellId(0)).unwrap().get(FEMALE, 0) < 100.0);
        assert!(hake.abundance(CellId(3)).unwrap().get(FEMALE, 0) < 60.0);
    }
}
