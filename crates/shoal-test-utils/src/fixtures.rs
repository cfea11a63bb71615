//! Reusable species, grid and abundance fixtures.
//!
//! - [`two_sex_species`]: two subdivisions, unit weights, no mortality.
//! - [`growing_species`]: adds lengths and growth curves for
//!   length-transition aging.
//! - [`shortspine_input`]: a realistic stock assessment (101 ages).
//! - [`open_grid`]: an all-water Moore grid with absorbing edges.

use shoal_core::{
    GrowthCurve, GrowthParameters, Meristics, MeristicsBuilder, StockAssessmentInput,
    StructuredAbundance, FEMALE, MALE,
};
use shoal_space::{EdgeBehavior, MooreGrid};

/// Two-sex species with `bins` bins of weight 1, maturity 1, no natural
/// mortality, steepness 0.6, `R0 = 1000` and `φ0 = 1`.
pub fn two_sex_species(bins: usize) -> Meristics {
    MeristicsBuilder::new(2, bins)
        .weights(vec![1.0; 2 * bins])
        .mortality(vec![0.0, 0.0])
        .steepness(0.6)
        .virgin_recruits(1000.0)
        .cumulative_phi(1.0)
        .build()
        .expect("fixture meristics are valid")
}

/// Two-sex species with four length bins `[5, 15, 25, 35]` growing
/// towards `L∞ = 40` at `K = 0.2`, and annual mortality 0.2.
pub fn growing_species() -> Meristics {
    let lengths = [5.0, 15.0, 25.0, 35.0];
    let curve = GrowthCurve {
        asymptotic_length: 40.0,
        k: 0.2,
    };
    MeristicsBuilder::new(2, 4)
        .lengths(lengths.iter().chain(&lengths).copied().collect())
        .weights(vec![0.1, 0.5, 1.2, 2.0, 0.1, 0.5, 1.2, 2.0])
        .mortality(vec![0.2, 0.2])
        .growth(vec![curve, curve])
        .build()
        .expect("fixture meristics are valid")
}

/// Shortspine thornyhead stock-assessment parameters.
pub fn shortspine_input() -> StockAssessmentInput {
    let sex = GrowthParameters {
        age_young: 2.0,
        length_young: 7.0,
        length_max: 75.0,
        k: 0.018,
        weight_a: 4.77e-6,
        weight_b: 3.263,
        mortality: 0.0505,
    };
    StockAssessmentInput {
        max_age: 100,
        age_old: 100,
        female: sex,
        male: sex,
        maturity_inflection: 18.2,
        maturity_slope: -2.3,
        fecundity_intercept: 1.0,
        fecundity_slope: 0.0,
        virgin_recruits: 36_315_502.0,
        steepness: 0.6,
    }
}

/// All-water `rows × cols` grid with absorbing edges.
pub fn open_grid(rows: u32, cols: u32) -> MooreGrid {
    MooreGrid::new(rows, cols, EdgeBehavior::Absorb).expect("fixture grid is valid")
}

/// Abundance for `meristics` with `female` and `male` individuals in
/// bin 0 and nothing else.
pub fn seeded_abundance(meristics: &Meristics, female: f64, male: f64) -> StructuredAbundance {
    AbundanceBuilder::new(meristics.subdivisions(), meristics.bins())
        .count(FEMALE, 0, female)
        .count(MALE, 0, male)
        .build()
}

/// Fluent construction of small abundance matrices.
pub struct AbundanceBuilder {
    abundance: StructuredAbundance,
}

impl AbundanceBuilder {
    pub fn new(subdivisions: usize, bins: usize) -> Self {
        Self {
            abundance: StructuredAbundance::zeros(subdivisions, bins),
        }
    }

    /// Set one entry. Out-of-range subdivisions are ignored so two-sex
    /// helpers also work on single-subdivision species.
    pub fn count(mut self, subdivision: usize, bin: usize, value: f64) -> Self {
        if subdivision < self.abundance.subdivisions() {
            self.abundance
                .set(subdivision, bin, value)
                .expect("fixture counts are valid");
        }
        self
    }

    /// Fill a whole subdivision.
    pub fn row(mut self, subdivision: usize, values: &[f64]) -> Self {
        for (bin, &value) in values.iter().enumerate() {
            self = self.count(subdivision, bin, value);
        }
        self
    }

    pub fn build(self) -> StructuredAbundance {
        self.abundance
    }
}
