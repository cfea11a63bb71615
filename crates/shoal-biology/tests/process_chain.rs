//! Processes composed over a small grid without the engine.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use shoal_biology::allocator::split;
use shoal_biology::{
    AbundanceArena, Aging, Allocator, DiffusionPlan, Diffuser, NaturalMortality, Recruitment,
    RecruitmentKind, Rounding,
};
use shoal_core::{CellId, FEMALE, MALE};
use shoal_space::Space;
use shoal_test_utils::{
    growing_species, open_grid, seeded_abundance, two_sex_species, AbundanceBuilder,
};

fn arena_in_order(order: &[u32], counts: impl Fn(u32) -> f64) -> AbundanceArena {
    let mut arena = AbundanceArena::new();
    for &cell in order {
        let a = AbundanceBuilder::new(2, 3)
            .row(FEMALE, &[counts(cell), counts(cell) / 2.0, 0.0])
            .row(MALE, &[0.0, counts(cell), 7.0])
            .build();
        assert!(arena.insert(CellId(cell), a));
    }
    arena
}

#[test]
fn diffusion_independent_of_cell_order() {
    let grid = open_grid(4, 4);
    let counts = |cell: u32| f64::from((cell * 37) % 101) * 10.0;
    let forward: Vec<u32> = (0..16).collect();
    let backward: Vec<u32> = (0..16).rev().collect();

    let mut a = arena_in_order(&forward, counts);
    let mut b = arena_in_order(&backward, counts);
    let cells_a: Vec<CellId> = a.cells().collect();
    let cells_b: Vec<CellId> = b.cells().collect();
    let plan_a = DiffusionPlan::new(&grid, &cells_a, 1);
    let plan_b = DiffusionPlan::new(&grid, &cells_b, 1);
    let diffuser = Diffuser::constant_rate(1, 0.05).unwrap();

    let before = a.total();
    for _ in 0..10 {
        diffuser.diffuse(&plan_a, &mut a, Rounding::Whole);
        diffuser.diffuse(&plan_b, &mut b, Rounding::Whole);
    }
    assert_eq!(a.total(), before);
    for cell in grid.canonical_ordering() {
        assert_eq!(a.get(cell), b.get(cell), "cell {cell} differs");
    }
}

#[test]
fn yearly_chain_on_one_cell() {
    let m = two_sex_species(3);
    let mut abundance = AbundanceBuilder::new(2, 3)
        .row(FEMALE, &[100.0, 60.0, 30.0])
        .row(MALE, &[100.0, 60.0, 30.0])
        .build();
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    let female = abundance.subdivision(FEMALE).to_vec();
    let male = abundance.subdivision(MALE).to_vec();
    let mut recruitment = Recruitment::new(RecruitmentKind::Fixed {
        recruits: 41.0,
        yearly_scale: Default::default(),
    });
    let recruits = recruitment.recruit(&m, &female, &male, 0, &mut rng).unwrap();

    NaturalMortality::proportional(0.5)
        .unwrap()
        .cull(&m, &mut abundance, 365, Rounding::Whole);
    assert_eq!(abundance.subdivision(FEMALE), &[50.0, 30.0, 15.0]);

    Aging::Standard { plus_group: true }.age(&mut abundance, Rounding::Whole);
    assert_eq!(abundance.subdivision(MALE), &[0.0, 50.0, 45.0]);

    let parts = split(recruits as f64, &[0.5, 0.5], Rounding::Whole);
    abundance.add(FEMALE, 0, parts[0]).unwrap();
    abundance.add(MALE, 0, parts[1]).unwrap();
    assert_eq!(abundance.get(FEMALE, 0) + abundance.get(MALE, 0), 41.0);
    assert_eq!(abundance.total(), 41.0 + 2.0 * 95.0);
}

#[test]
fn uniform_recruits_over_grid() {
    let m = two_sex_species(2);
    let grid = open_grid(4, 4);
    let mut arena = AbundanceArena::new();
    for cell in grid.canonical_ordering() {
        arena.insert(cell, seeded_abundance(&m, 200.0, 250.0));
    }
    for (_, a) in arena.iter_mut() {
        Aging::Standard { plus_group: false }.age(a, Rounding::Whole);
    }
    let cells: Vec<CellId> = arena.cells().collect();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let per_cell = Allocator::Uniform
        .apportion(1600.0, &cells, &grid, &mut rng, Rounding::Whole)
        .unwrap();
    for (cell, amount) in cells.iter().zip(per_cell) {
        let a = arena.get_mut(*cell).unwrap();
        a.add(FEMALE, 0, amount).unwrap();
        a.add(MALE, 0, amount).unwrap();
    }
    for (_, a) in arena.iter() {
        assert_eq!(a.subdivision(FEMALE), &[100.0, 200.0]);
        assert_eq!(a.subdivision(MALE), &[100.0, 250.0]);
    }
}

#[test]
fn growth_then_mortality_keeps_counts_whole() {
    let m = growing_species();
    let aging = Aging::length_transition(&m, 2.0, 1.0).unwrap();
    let mut a = seeded_abundance(&m, 1000.0, 1000.0);
    for _ in 0..5 {
        aging.age(&mut a, Rounding::Whole);
        NaturalMortality::Exponential.cull(&m, &mut a, 365, Rounding::Whole);
    }
    assert!(a.as_slice().iter().all(|c| c.fract() == 0.0));
    assert!(a.get(FEMALE, 3) > 0.0);
    assert!(a.total() < 2000.0);
}
