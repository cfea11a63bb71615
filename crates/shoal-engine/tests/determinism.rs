//! Integration test: seeded reproducibility and mass conservation.
//!
//! Two worlds built from the same configuration and seed must agree bit
//! for bit after several noisy years. Between year ends, a stock with no
//! mortality only moves, so its total never changes.

use proptest::prelude::*;
use shoal_biology::{Allocator, Diffuser, LognormalNoise, NaturalMortality, RecruitmentKind};
use shoal_core::{LocalBiology, SpeciesId, StructuredAbundance};
use shoal_engine::{BiologyWorld, EngineConfig, RecruitmentSpec, SpeciesProcessesConfig};
use shoal_test_utils::{open_grid, seeded_abundance, two_sex_species};

fn noisy_world(seed: u64) -> (BiologyWorld, SpeciesId) {
    let meristics = two_sex_species(4);
    let mut recruitment = RecruitmentSpec::new(RecruitmentKind::beverton_holt(&meristics, false));
    recruitment.noise = Some(LognormalNoise::new(0.6, 0).unwrap());
    let mut processes = SpeciesProcessesConfig::new(NaturalMortality::Exponential, recruitment);
    processes.allocator = Some(Allocator::Random { min: 0.5, max: 1.5 });
    processes.diffusion = Diffuser::constant_rate(1, 0.05).unwrap();

    let config = EngineConfig {
        seed,
        ..EngineConfig::default()
    };
    let mut world = BiologyWorld::new(Box::new(open_grid(3, 3)), config).unwrap();
    let id = world.add_species("cod", meristics.clone(), &processes).unwrap();
    world
        .populate(|cell| {
            let n = f64::from(cell.0 * 20 + 10);
            LocalBiology::Abundance([(id, seeded_abundance(&meristics, n, n))].into_iter().collect())
        })
        .unwrap();
    (world, id)
}

fn run(world: &mut BiologyWorld, days: u32) {
    for _ in 0..days {
        world.step().unwrap();
    }
}

#[test]
fn same_seed_same_stocks() {
    let (mut a, id) = noisy_world(42);
    let (mut b, _) = noisy_world(42);
    run(&mut a, 3 * 365);
    run(&mut b, 3 * 365);
    assert_eq!(a.snapshot(id).unwrap(), b.snapshot(id).unwrap());
    assert_eq!(a.biomass_series(id), b.biomass_series(id));
    assert_eq!(a.biomass_series(id).map(<[f64]>::len), Some(3));
}

#[test]
fn different_seed_different_recruits() {
    let (mut a, id) = noisy_world(1);
    let (mut b, _) = noisy_world(2);
    run(&mut a, 3 * 365);
    run(&mut b, 3 * 365);
    assert_ne!(a.biomass_series(id), b.biomass_series(id));
}

proptest! {
    #[test]
    fn movement_conserves_the_stock(
        counts in prop::collection::vec(0u32..500, 16),
        rate in 0.0f64..=1.0,
        radius in 1u32..3,
        days in 1u32..40,
    ) {
        let meristics = two_sex_species(2);
        let mut processes = SpeciesProcessesConfig::new(
            NaturalMortality::Exponential,
            RecruitmentSpec::new(RecruitmentKind::Fixed {
                recruits: 0.0,
                yearly_scale: Default::default(),
            }),
        );
        processes.diffusion = Diffuser::constant_rate(radius, rate).unwrap();
        let mut world = BiologyWorld::new(Box::new(open_grid(4, 4)), EngineConfig::default()).unwrap();
        let id = world.add_species("cod", meristics.clone(), &processes).unwrap();
        world
            .populate(|cell| {
                let n = f64::from(counts[cell.index()]);
                let mut a = StructuredAbundance::zeros(2, 2);
                a.set(0, 1, n).unwrap();
                a.set(1, 0, n / 2.0).unwrap();
                LocalBiology::Abundance([(id, a)].into_iter().collect())
            })
            .unwrap();
        let before = world.processes(id).unwrap().total_abundance();

        run(&mut world, days);

        let after = world.processes(id).unwrap().total_abundance();
        prop_assert_eq!(after.as_slice(), before.as_slice());
        for cell in world.processes(id).unwrap().cells() {
            let a = world.processes(id).unwrap().abundance(cell).unwrap();
            prop_assert!(a.as_slice().iter().all(|&v| v >= 0.0));
        }
    }
}
