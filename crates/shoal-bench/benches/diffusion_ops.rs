//! Criterion micro-benchmarks for diffusion planning and diffusion passes.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use shoal_bench::seeded_arena;
use shoal_biology::{DiffusionPlan, Diffuser, Rounding};
use shoal_core::{CellId, Meristics};
use shoal_test_utils::{shortspine_input, two_sex_species};

/// Benchmark: build the radius-1 pair list for a 64x64 grid.
fn bench_plan_64x64(c: &mut Criterion) {
    let meristics = two_sex_species(1);
    let (grid, arena) = seeded_arena(64, &meristics).unwrap();
    let cells: Vec<CellId> = arena.cells().collect();

    c.bench_function("diffusion_plan_64x64_r1", |b| {
        b.iter(|| black_box(DiffusionPlan::new(&grid, &cells, 1)));
    });
}

/// Benchmark: one constant-rate pass over 32x32 cells with 101 age bins.
fn bench_constant_rate_32x32(c: &mut Criterion) {
    let meristics = Meristics::from_stock_assessment(&shortspine_input()).unwrap();
    let (grid, mut arena) = seeded_arena(32, &meristics).unwrap();
    let cells: Vec<CellId> = arena.cells().collect();
    let plan = DiffusionPlan::new(&grid, &cells, 1);
    let diffuser = Diffuser::constant_rate(1, 0.1).unwrap();

    c.bench_function("diffuse_constant_rate_32x32_101bins", |b| {
        b.iter(|| {
            diffuser.diffuse(&plan, &mut arena, Rounding::Whole);
            black_box(arena.generation());
        });
    });
}

/// Benchmark: one habitability-weighted pass at radius 2, fractional counts.
fn bench_weighted_radius2(c: &mut Criterion) {
    let meristics = two_sex_species(20);
    let (grid, mut arena) = seeded_arena(32, &meristics).unwrap();
    let cells: Vec<CellId> = arena.cells().collect();
    let plan = DiffusionPlan::new(&grid, &cells, 2);
    let diffuser = Diffuser::weighted(2, 0.2).unwrap();

    c.bench_function("diffuse_weighted_32x32_r2", |b| {
        b.iter(|| {
            diffuser.diffuse(&plan, &mut arena, Rounding::Fractional);
            black_box(arena.total());
        });
    });
}

criterion_group!(
    benches,
    bench_plan_64x64,
    bench_constant_rate_32x32,
    bench_weighted_radius2
);
criterion_main!(benches);
