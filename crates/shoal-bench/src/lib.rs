//! Benchmark profiles for the Shoal population-dynamics engine.
//!
//! - [`reference_world`]: 32x32 grid, one shortspine-like stock with
//!   Beverton-Holt recruitment and constant-rate diffusion
//! - [`stress_world`]: 96x96 grid with three species sharing the grid
//! - [`seeded_arena`]: a populated [`AbundanceArena`] for diffusion-only
//!   benchmarks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::error::Error;

use shoal_biology::{AbundanceArena, Diffuser, LognormalNoise, NaturalMortality, RecruitmentKind};
use shoal_core::{CellId, LocalBiology, Meristics, SpeciesId, StructuredAbundance};
use shoal_engine::{BiologyWorld, EngineConfig, RecruitmentSpec, SpeciesProcessesConfig};
use shoal_space::{EdgeBehavior, MooreGrid};
use shoal_test_utils::shortspine_input;

/// Result type of the profile builders.
pub type ProfileResult<T> = Result<T, Box<dyn Error>>;

/// A 32x32 world with one stock of 101 age bins.
pub fn reference_world(seed: u64) -> ProfileResult<(BiologyWorld, SpeciesId)> {
    let mut world = grid_world(32, seed)?;
    let id = add_stock(&mut world, "shortspine", 0.1)?;
    Ok((world, id))
}

/// A 96x96 world with three stocks that move at different rates.
pub fn stress_world(seed: u64) -> ProfileResult<(BiologyWorld, Vec<SpeciesId>)> {
    let mut world = grid_world(96, seed)?;
    let mut ids = Vec::new();
    for (name, rate) in [("shortspine", 0.05), ("longspine", 0.1), ("sablefish", 0.2)] {
        ids.push(add_stock(&mut world, name, rate)?);
    }
    Ok((world, ids))
}

/// An arena over every cell of a `side`x`side` grid, each holding a
/// declining age structure for `meristics`.
pub fn seeded_arena(side: u32, meristics: &Meristics) -> ProfileResult<(MooreGrid, AbundanceArena)> {
    let grid = MooreGrid::new(side, side, EdgeBehavior::Absorb)?;
    let mut arena = AbundanceArena::new();
    for cell in 0..side * side {
        arena.insert(CellId(cell), age_structure(meristics, 1_000.0 + f64::from(cell % 17))?);
    }
    Ok((grid, arena))
}

fn grid_world(side: u32, seed: u64) -> ProfileResult<BiologyWorld> {
    let grid = MooreGrid::new(side, side, EdgeBehavior::Absorb)?;
    let config = EngineConfig {
        seed,
        ..EngineConfig::default()
    };
    Ok(BiologyWorld::new(Box::new(grid), config)?)
}

fn add_stock(world: &mut BiologyWorld, name: &str, rate: f64) -> ProfileResult<SpeciesId> {
    let meristics = Meristics::from_stock_assessment(&shortspine_input())?;
    let mut recruitment = RecruitmentSpec::new(RecruitmentKind::beverton_holt(&meristics, false));
    recruitment.noise = Some(LognormalNoise::new(0.3, 0)?);
    let mut processes = SpeciesProcessesConfig::new(NaturalMortality::Exponential, recruitment);
    processes.diffusion = Diffuser::constant_rate(1, rate)?;
    let id = world.add_species(name, meristics.clone(), &processes)?;

    let stock = age_structure(&meristics, 500.0)?;
    world.populate(|_| LocalBiology::Abundance([(id, stock.clone())].into_iter().collect()))?;
    Ok(id)
}

fn age_structure(meristics: &Meristics, recruits: f64) -> ProfileResult<StructuredAbundance> {
    let mut abundance = StructuredAbundance::for_meristics(meristics);
    for subdivision in 0..meristics.subdivisions() {
        for (bin, survival) in meristics.cumulative_survival(subdivision).iter().enumerate() {
            abundance.set(subdivision, bin, (recruits * survival).round())?;
        }
    }
    Ok(abundance)
}
