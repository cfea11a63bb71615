//! Shoal quickstart: ten years of one stock on a small grid.
//!
//! Demonstrates:
//!   1. Building meristics from stock-assessment growth parameters
//!   2. Configuring mortality, recruitment with noise, and diffusion
//!   3. Populating a Moore grid with a land cell
//!   4. Stepping day by day, harvesting between ticks
//!   5. Reading the yearly biomass series and step metrics
//!
//! Run with:
//!   RUST_LOG=info cargo run --example quickstart

use shoal_biology::{Allocator, Diffuser, LognormalNoise, NaturalMortality, RecruitmentKind};
use shoal_core::{
    GrowthParameters, LocalBiology, Meristics, StockAssessmentInput, StructuredAbundance, FEMALE,
};
use shoal_engine::{
    AgingSpec, BiologyWorld, EngineConfig, RecruitmentSpec, SpeciesProcessesConfig,
};
use shoal_space::{EdgeBehavior, MooreGrid};
use tracing_subscriber::EnvFilter;

// ─── Grid parameters ────────────────────────────────────────────

const ROWS: u32 = 6;
const COLS: u32 = 6;
const YEARS: u32 = 10;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ─── Species ────────────────────────────────────────────────

    let sex = GrowthParameters {
        age_young: 2.0,
        length_young: 7.0,
        length_max: 60.0,
        k: 0.05,
        weight_a: 4.77e-6,
        weight_b: 3.263,
        mortality: 0.15,
    };
    let input = StockAssessmentInput {
        max_age: 40,
        age_old: 40,
        female: sex,
        male: sex,
        maturity_inflection: 18.2,
        maturity_slope: -2.3,
        fecundity_intercept: 1.0,
        fecundity_slope: 0.0,
        virgin_recruits: 50_000.0,
        steepness: 0.7,
    };
    let meristics = Meristics::from_stock_assessment(&input)?;

    let mut recruitment = RecruitmentSpec::new(RecruitmentKind::beverton_holt(&meristics, false));
    recruitment.noise = Some(LognormalNoise::new(0.4, 2)?);
    recruitment.delay_years = 1;
    recruitment.backlog = vec![40_000.0];

    let mut processes = SpeciesProcessesConfig::new(NaturalMortality::Exponential, recruitment);
    processes.aging = AgingSpec::Standard { plus_group: true };
    processes.diffusion = Diffuser::age_limited(1, 0.02, 1, 10)?;
    processes.allocator = Some(Allocator::Habitability);

    // ─── World ──────────────────────────────────────────────────

    let mut land = vec![false; (ROWS * COLS) as usize];
    land[0] = true;
    let habitability: Vec<f64> = (0..ROWS * COLS)
        .map(|i| 1.0 + f64::from(i % COLS) / f64::from(COLS))
        .collect();
    let grid = MooreGrid::new(ROWS, COLS, EdgeBehavior::Absorb)?
        .with_land(land)?
        .with_habitability(habitability)?;
    let harbour = grid.cell(1, 1).ok_or("grid has no cell (1, 1)")?;

    let config = EngineConfig {
        seed: 7,
        ..EngineConfig::default()
    };
    let mut world = BiologyWorld::new(Box::new(grid), config)?;
    let sablefish = world.add_species("sablefish", meristics.clone(), &processes)?;

    world.populate(|_| {
        let mut stock = StructuredAbundance::for_meristics(&meristics);
        for bin in 0..meristics.bins() {
            let n = (2_000.0 * (-0.15 * bin as f64).exp()).round();
            for subdivision in 0..meristics.subdivisions() {
                // Counts are finite and non-negative by construction.
                let _ = stock.set(subdivision, bin, n);
            }
        }
        LocalBiology::Abundance([(sablefish, stock)].into_iter().collect())
    })?;

    // ─── Run ────────────────────────────────────────────────────

    for year in 0..YEARS {
        for _ in 0..365 {
            world.step()?;
        }
        let mut catch = StructuredAbundance::for_meristics(&meristics);
        catch.set(FEMALE, 5, 1_500.0)?;
        let removal = world.apply_catch(sablefish, harbour, &catch)?;

        let metrics = world.last_metrics();
        println!(
            "year {year:>2}: recruits {:>7}, biomass {:>12.1}, catch shortfall {:>6.0}, last tick {} us",
            metrics.recruits_for(sablefish).unwrap_or(0),
            world.species_biomass(sablefish).unwrap_or(0.0),
            removal.shortfall_total(),
            metrics.total_us,
        );
    }

    world.finalize();
    if let Some(series) = world.biomass_series(sablefish) {
        println!("biomass series: {series:.1?}");
    }
    Ok(())
}
