//! Per-species biological constants.
//!
//! [`Meristics`] is built once, validated, and never mutated afterwards.
//! Two construction paths exist: [`MeristicsBuilder`] takes the per-bin
//! arrays directly, and [`Meristics::from_stock_assessment`] derives them
//! from von Bertalanffy growth and allometric weight parameters.

use serde::{Deserialize, Serialize};

use crate::error::MeristicsError;
use crate::id::FEMALE;

/// Von Bertalanffy growth curve of one subdivision.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrowthCurve {
    /// Asymptotic length `L∞`.
    pub asymptotic_length: f64,
    /// Brody growth coefficient `K` (per year).
    pub k: f64,
}

/// Validated biological parameter set for one species.
///
/// Per-bin arrays are indexed `[subdivision][bin]` and stored flattened
/// row-major. Every array is sized exactly `subdivisions × bins` (or
/// `bins` for the female-only maturity and fecundity vectors).
#[derive(Clone, Debug, PartialEq)]
pub struct Meristics {
    subdivisions: usize,
    bins: usize,
    weights: Vec<f64>,
    lengths: Vec<f64>,
    maturity: Vec<f64>,
    relative_fecundity: Vec<f64>,
    mortality: Vec<f64>,
    cumulative_survival: Vec<f64>,
    phi: Vec<f64>,
    cumulative_phi: f64,
    steepness: f64,
    virgin_recruits: f64,
    growth: Vec<GrowthCurve>,
}

impl Meristics {
    /// Number of subdivisions (sexes).
    pub fn subdivisions(&self) -> usize {
        self.subdivisions
    }

    /// Number of age or size bins.
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Weight of one individual in `bin` of `subdivision`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn weight(&self, subdivision: usize, bin: usize) -> f64 {
        self.weights[subdivision * self.bins + bin]
    }

    /// Weights of every bin of `subdivision`.
    pub fn weights(&self, subdivision: usize) -> &[f64] {
        &self.weights[subdivision * self.bins..(subdivision + 1) * self.bins]
    }

    /// Length of an individual in `bin` of `subdivision`.
    pub fn length(&self, subdivision: usize, bin: usize) -> f64 {
        self.lengths[subdivision * self.bins + bin]
    }

    /// Lengths of every bin of `subdivision`.
    pub fn lengths(&self, subdivision: usize) -> &[f64] {
        &self.lengths[subdivision * self.bins..(subdivision + 1) * self.bins]
    }

    /// Fraction mature at each bin.
    pub fn maturity(&self) -> &[f64] {
        &self.maturity
    }

    /// Relative fecundity at each bin.
    pub fn relative_fecundity(&self) -> &[f64] {
        &self.relative_fecundity
    }

    /// Annual natural mortality rate `M` of `subdivision`.
    ///
    /// Returns `None` for a subdivision the species does not have.
    pub fn mortality(&self, subdivision: usize) -> Option<f64> {
        self.mortality.get(subdivision).copied()
    }

    /// Cumulative survivorship at each bin of `subdivision`.
    pub fn cumulative_survival(&self, subdivision: usize) -> &[f64] {
        &self.cumulative_survival[subdivision * self.bins..(subdivision + 1) * self.bins]
    }

    /// Spawner-per-recruit contribution at each bin.
    pub fn phi(&self) -> &[f64] {
        &self.phi
    }

    /// Spawner biomass per recruit at virgin conditions, `φ0`.
    pub fn cumulative_phi(&self) -> f64 {
        self.cumulative_phi
    }

    /// Beverton-Holt steepness `h`.
    pub fn steepness(&self) -> f64 {
        self.steepness
    }

    /// Virgin recruits `R0`.
    pub fn virgin_recruits(&self) -> f64 {
        self.virgin_recruits
    }

    /// Growth curve of `subdivision`, if one was supplied.
    pub fn growth(&self, subdivision: usize) -> Option<GrowthCurve> {
        self.growth.get(subdivision).copied()
    }

    /// Spawning stock biomass of a female abundance vector.
    ///
    /// Sums `count × weight × maturity` (times relative fecundity when
    /// `with_fecundity` is set) over bins. Bins whose female weight is not
    /// positive do not contribute. Extra entries in `female` beyond
    /// [`bins`](Self::bins) are ignored.
    pub fn spawning_biomass(&self, female: &[f64], with_fecundity: bool) -> f64 {
        let weights = self.weights(FEMALE.min(self.subdivisions - 1));
        let mut ssb = 0.0;
        for (bin, &count) in female.iter().enumerate().take(self.bins) {
            let weight = weights[bin];
            if weight <= 0.0 {
                continue;
            }
            let mut contribution = count * weight * self.maturity[bin];
            if with_fecundity {
                contribution *= self.relative_fecundity[bin];
            }
            ssb += contribution;
        }
        ssb
    }

    /// Derive meristics from stock-assessment growth parameters.
    ///
    /// Produces `max_age + 1` bins and two subdivisions
    /// ([`FEMALE`], [`MALE`](crate::MALE)).
    ///
    /// # Errors
    ///
    /// Returns [`MeristicsError`] if an age is out of order or any
    /// parameter is non-finite.
    pub fn from_stock_assessment(input: &StockAssessmentInput) -> Result<Self, MeristicsError> {
        input.validate()?;
        let bins = input.max_age as usize + 1;
        let female = input.female.curve(input.age_old)?;
        let male = input.male.curve(input.age_old)?;

        let mut lengths = Vec::with_capacity(2 * bins);
        let mut weights = Vec::with_capacity(2 * bins);
        for (params, curve) in [(&input.female, female), (&input.male, male)] {
            for age in 0..bins {
                let length = curve.length_at(params, age as f64);
                lengths.push(length);
                weights.push(params.weight_a * length.powf(params.weight_b));
            }
        }

        let mut maturity = Vec::with_capacity(bins);
        let mut fecundity = Vec::with_capacity(bins);
        for age in 0..bins {
            let length = lengths[age];
            let weight = weights[age];
            maturity.push(
                1.0 / (1.0 + (input.maturity_slope * (length - input.maturity_inflection)).exp()),
            );
            fecundity.push(weight * (input.fecundity_intercept + input.fecundity_slope * weight));
        }

        MeristicsBuilder::new(2, bins)
            .weights(weights)
            .lengths(lengths)
            .maturity(maturity)
            .relative_fecundity(fecundity)
            .mortality(vec![input.female.mortality, input.male.mortality])
            .steepness(input.steepness)
            .virgin_recruits(input.virgin_recruits)
            .growth(vec![female, male])
            .build()
    }
}

/// Growth, weight and mortality parameters of one sex.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrowthParameters {
    /// Age at which `length_young` is observed.
    pub age_young: f64,
    /// Length at `age_young`.
    pub length_young: f64,
    /// Length at the assessment's old age.
    pub length_max: f64,
    /// Brody growth coefficient.
    pub k: f64,
    /// Allometric weight coefficient `a` in `W = a·L^b`.
    pub weight_a: f64,
    /// Allometric weight exponent `b`.
    pub weight_b: f64,
    /// Annual natural mortality.
    pub mortality: f64,
}

impl GrowthParameters {
    fn curve(&self, age_old: u32) -> Result<GrowthCurve, MeristicsError> {
        let span = f64::from(age_old) - self.age_young;
        let denominator = 1.0 - (-self.k * span).exp();
        if !(denominator > 0.0) {
            return Err(MeristicsError::InvalidAges {
                reason: format!(
                    "growth span {span} with k={} gives no asymptotic length",
                    self.k
                ),
            });
        }
        Ok(GrowthCurve {
            asymptotic_length: self.length_young
                + (self.length_max - self.length_young) / denominator,
            k: self.k,
        })
    }
}

impl GrowthCurve {
    fn length_at(&self, params: &GrowthParameters, age: f64) -> f64 {
        let linf = self.asymptotic_length;
        (linf + (params.length_young - linf) * (-self.k * (age - params.age_young)).exp()).max(0.0)
    }
}

/// Inputs of a two-sex stock assessment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockAssessmentInput {
    /// Oldest age; bins run `0..=max_age`.
    pub max_age: u32,
    /// Age whose length is `length_max`.
    pub age_old: u32,
    /// Female growth.
    pub female: GrowthParameters,
    /// Male growth.
    pub male: GrowthParameters,
    /// Length at 50% maturity.
    pub maturity_inflection: f64,
    /// Slope of the logistic maturity curve.
    pub maturity_slope: f64,
    /// Eggs per unit weight at zero weight.
    pub fecundity_intercept: f64,
    /// Change of eggs per unit weight with weight.
    pub fecundity_slope: f64,
    /// Virgin recruits `R0`.
    pub virgin_recruits: f64,
    /// Beverton-Holt steepness.
    pub steepness: f64,
}

impl StockAssessmentInput {
    fn validate(&self) -> Result<(), MeristicsError> {
        if self.age_old > self.max_age {
            return Err(MeristicsError::InvalidAges {
                reason: format!("age_old {} exceeds max_age {}", self.age_old, self.max_age),
            });
        }
        for params in [&self.female, &self.male] {
            if params.age_young > f64::from(self.max_age) {
                return Err(MeristicsError::InvalidAges {
                    reason: format!(
                        "age_young {} exceeds max_age {}",
                        params.age_young, self.max_age
                    ),
                });
            }
            for (name, value) in [
                ("length_young", params.length_young),
                ("length_max", params.length_max),
                ("k", params.k),
                ("weight_a", params.weight_a),
                ("mortality", params.mortality),
            ] {
                check_non_negative(name, value)?;
            }
            for (name, value) in [("age_young", params.age_young), ("weight_b", params.weight_b)] {
                if !value.is_finite() {
                    return Err(MeristicsError::InvalidValue { name, value });
                }
            }
        }
        for (name, value) in [
            ("maturity_inflection", self.maturity_inflection),
            ("maturity_slope", self.maturity_slope),
            ("fecundity_intercept", self.fecundity_intercept),
            ("fecundity_slope", self.fecundity_slope),
        ] {
            if !value.is_finite() {
                return Err(MeristicsError::InvalidValue { name, value });
            }
        }
        Ok(())
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), MeristicsError> {
    if !(value >= 0.0) || !value.is_finite() {
        return Err(MeristicsError::InvalidValue { name, value });
    }
    Ok(())
}

fn check_len(name: &'static str, values: &[f64], expected: usize) -> Result<(), MeristicsError> {
    if values.len() != expected {
        return Err(MeristicsError::LengthMismatch {
            name,
            expected,
            actual: values.len(),
        });
    }
    values.iter().try_for_each(|&v| check_non_negative(name, v))
}

/// Builder for [`Meristics`] from explicit per-bin arrays.
///
/// Required: `subdivisions` and `bins`. Defaults: weights and lengths `0`,
/// maturity and relative fecundity `1`, mortality `0`, steepness `1`,
/// virgin recruits `0`, and cumulative phi computed from the arrays.
///
/// # Example
///
/// ```
/// use shoal_core::MeristicsBuilder;
///
/// let m = MeristicsBuilder::new(2, 3)
///     .weights(vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0])
///     .mortality(vec![0.2, 0.2])
///     .build()
///     .unwrap();
/// assert_eq!(m.weight(1, 2), 3.0);
/// ```
#[derive(Clone, Debug)]
pub struct MeristicsBuilder {
    subdivisions: usize,
    bins: usize,
    weights: Option<Vec<f64>>,
    lengths: Option<Vec<f64>>,
    maturity: Option<Vec<f64>>,
    relative_fecundity: Option<Vec<f64>>,
    mortality: Option<Vec<f64>>,
    cumulative_phi: Option<f64>,
    steepness: f64,
    virgin_recruits: f64,
    growth: Vec<GrowthCurve>,
}

impl MeristicsBuilder {
    /// Start a builder for the given matrix shape.
    pub fn new(subdivisions: usize, bins: usize) -> Self {
        Self {
            subdivisions,
            bins,
            weights: None,
            lengths: None,
            maturity: None,
            relative_fecundity: None,
            mortality: None,
            cumulative_phi: None,
            steepness: 1.0,
            virgin_recruits: 0.0,
            growth: Vec::new(),
        }
    }

    /// Weights, flattened `[subdivision][bin]`.
    pub fn weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Lengths, flattened `[subdivision][bin]`.
    pub fn lengths(mut self, lengths: Vec<f64>) -> Self {
        self.lengths = Some(lengths);
        self
    }

    /// Maturity per bin.
    pub fn maturity(mut self, maturity: Vec<f64>) -> Self {
        self.maturity = Some(maturity);
        self
    }

    /// Relative fecundity per bin.
    pub fn relative_fecundity(mut self, fecundity: Vec<f64>) -> Self {
        self.relative_fecundity = Some(fecundity);
        self
    }

    /// Annual natural mortality per subdivision.
    pub fn mortality(mut self, mortality: Vec<f64>) -> Self {
        self.mortality = Some(mortality);
        self
    }

    /// Override the computed cumulative phi.
    pub fn cumulative_phi(mut self, phi: f64) -> Self {
        self.cumulative_phi = Some(phi);
        self
    }

    /// Beverton-Holt steepness.
    pub fn steepness(mut self, steepness: f64) -> Self {
        self.steepness = steepness;
        self
    }

    /// Virgin recruits.
    pub fn virgin_recruits(mut self, recruits: f64) -> Self {
        self.virgin_recruits = recruits;
        self
    }

    /// Growth curve per subdivision.
    pub fn growth(mut self, growth: Vec<GrowthCurve>) -> Self {
        self.growth = growth;
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// Returns [`MeristicsError`] if the shape is empty, an array has the
    /// wrong length, or any value is negative or non-finite.
    pub fn build(self) -> Result<Meristics, MeristicsError> {
        let (subdivisions, bins) = (self.subdivisions, self.bins);
        if subdivisions == 0 || bins == 0 {
            return Err(MeristicsError::EmptyShape { subdivisions, bins });
        }
        let cells = subdivisions * bins;

        let weights = self.weights.unwrap_or_else(|| vec![0.0; cells]);
        check_len("weights", &weights, cells)?;
        let lengths = self.lengths.unwrap_or_else(|| vec![0.0; cells]);
        check_len("lengths", &lengths, cells)?;
        let maturity = self.maturity.unwrap_or_else(|| vec![1.0; bins]);
        check_len("maturity", &maturity, bins)?;
        let relative_fecundity = self.relative_fecundity.unwrap_or_else(|| vec![1.0; bins]);
        check_len("relative_fecundity", &relative_fecundity, bins)?;
        let mortality = self.mortality.unwrap_or_else(|| vec![0.0; subdivisions]);
        check_len("mortality", &mortality, subdivisions)?;
        check_non_negative("steepness", self.steepness)?;
        check_non_negative("virgin_recruits", self.virgin_recruits)?;
        if !self.growth.is_empty() && self.growth.len() != subdivisions {
            return Err(MeristicsError::LengthMismatch {
                name: "growth",
                expected: subdivisions,
                actual: self.growth.len(),
            });
        }
        for curve in &self.growth {
            check_non_negative("asymptotic_length", curve.asymptotic_length)?;
            check_non_negative("k", curve.k)?;
        }

        let mut cumulative_survival = Vec::with_capacity(cells);
        for &m in &mortality {
            let mut survival = 1.0;
            for bin in 0..bins {
                if bin > 0 {
                    survival *= (-m).exp();
                }
                cumulative_survival.push(survival);
            }
        }

        let female_survival = &cumulative_survival[FEMALE * bins..(FEMALE + 1) * bins];
        let phi: Vec<f64> = (0..bins)
            .map(|bin| maturity[bin] * relative_fecundity[bin] * female_survival[bin])
            .collect();
        let cumulative_phi = match self.cumulative_phi {
            Some(explicit) => {
                check_non_negative("cumulative_phi", explicit)?;
                explicit
            }
            None => phi.iter().sum(),
        };

        Ok(Meristics {
            subdivisions,
            bins,
            weights,
            lengths,
            maturity,
            relative_fecundity,
            mortality,
            cumulative_survival,
            phi,
            cumulative_phi,
            steepness: self.steepness,
            virgin_recruits: self.virgin_recruits,
            growth: self.growth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::MALE;

    fn shortspine() -> StockAssessmentInput {
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

    fn yelloweye() -> StockAssessmentInput {
        StockAssessmentInput {
            max_age: 100,
            age_old: 70,
            male: GrowthParameters {
                age_young: 1.0,
                length_young: 18.717,
                length_max: 64.594,
                k: 0.047,
                weight_a: 0.000017,
                weight_b: 3.03,
                mortality: 0.045,
            },
            female: GrowthParameters {
                age_young: 1.0,
                length_young: 18.717,
                length_max: 62.265,
                k: 0.047,
                weight_a: 0.00000977,
                weight_b: 3.17,
                mortality: 0.046,
            },
            maturity_inflection: 38.78,
            maturity_slope: -0.437,
            fecundity_intercept: 137_900.0,
            fecundity_slope: 36_500.0,
            virgin_recruits: 228_149.0,
            steepness: 0.44056,
        }
    }

    // ── Stock-assessment construction ───────────────────────────

    #[test]
    fn shortspine_reference_values() {
        let m = Meristics::from_stock_assessment(&shortspine()).unwrap();
        assert_eq!(m.bins(), 101);
        assert_eq!(m.subdivisions(), 2);
        assert!((m.length(FEMALE, 5) - 11.3138255265).abs() < 1e-3);
        assert!((m.length(MALE, 5) - 11.3138255265).abs() < 1e-3);
        assert!((m.weight(FEMALE, 5) - 0.0130770514).abs() < 1e-3);
        assert!((m.maturity()[10] - 0.3900004207).abs() < 1e-4);
        assert!((m.relative_fecundity()[5] - 0.0130770514).abs() < 1e-3);
        assert!((m.relative_fecundity()[20] - 0.3052767163).abs() < 1e-3);
        assert!((m.cumulative_survival(FEMALE)[5] - 0.7768562128).abs() < 1e-3);
        assert!((m.cumulative_survival(FEMALE)[20] - 0.3642189796).abs() < 1e-3);
        assert!((m.phi()[20] - 0.1111875741).abs() < 1e-3);
        assert!((m.cumulative_phi() - 10.9714561805).abs() < 1e-2);
    }

    #[test]
    fn yelloweye_lengths_use_age_old() {
        let m = Meristics::from_stock_assessment(&yelloweye()).unwrap();
        assert!((m.length(FEMALE, 5) - 26.4837518217).abs() < 1e-3);
        assert!((m.length(MALE, 5) - 26.8991271545).abs() < 1e-3);
        assert!((m.weight(FEMALE, 5) - 0.3167667645).abs() < 1e-3);
        assert!((m.weight(MALE, 5) - 0.365220907).abs() < 1e-3);
        assert!((m.cumulative_survival(FEMALE)[5] - 0.7945336025).abs() < 1e-3);
        assert_eq!(m.mortality(MALE), Some(0.045));
        assert!(m.growth(FEMALE).is_some());
    }

    #[test]
    fn age_old_beyond_max_age_rejected() {
        let mut input = shortspine();
        input.age_old = 101;
        assert!(matches!(
            Meristics::from_stock_assessment(&input),
            Err(MeristicsError::InvalidAges { .. })
        ));
    }

    // ── Builder ─────────────────────────────────────────────────

    #[test]
    fn builder_defaults() {
        let m = MeristicsBuilder::new(2, 3).build().unwrap();
        assert_eq!(m.weights(MALE), &[0.0, 0.0, 0.0]);
        assert_eq!(m.maturity(), &[1.0, 1.0, 1.0]);
        assert_eq!(m.cumulative_survival(FEMALE), &[1.0, 1.0, 1.0]);
        assert_eq!(m.cumulative_phi(), 3.0);
        assert_eq!(m.mortality(2), None);
    }

    #[test]
    fn builder_rejects_wrong_length() {
        let err = MeristicsBuilder::new(2, 3)
            .weights(vec![1.0; 5])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            MeristicsError::LengthMismatch {
                name: "weights",
                expected: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn builder_rejects_negative_and_nan() {
        assert!(MeristicsBuilder::new(1, 2)
            .mortality(vec![-0.1])
            .build()
            .is_err());
        assert!(MeristicsBuilder::new(1, 2)
            .maturity(vec![f64::NAN, 1.0])
            .build()
            .is_err());
        assert!(MeristicsBuilder::new(0, 2).build().is_err());
    }

    #[test]
    fn explicit_cumulative_phi_wins() {
        let m = MeristicsBuilder::new(1, 2)
            .cumulative_phi(14.2)
            .build()
            .unwrap();
        assert_eq!(m.cumulative_phi(), 14.2);
    }

    // ── Spawning biomass ────────────────────────────────────────

    #[test]
    fn spawning_biomass_weights_maturity_and_fecundity() {
        let m = MeristicsBuilder::new(2, 3)
            .weights(vec![0.0, 2.0, 4.0, 1.0, 1.0, 1.0])
            .maturity(vec![1.0, 0.5, 1.0])
            .relative_fecundity(vec![1.0, 1.0, 3.0])
            .build()
            .unwrap();
        let female = [100.0, 10.0, 1.0];
        // bin 0 has zero weight and is skipped
        assert_eq!(m.spawning_biomass(&female, false), 10.0 + 4.0);
        assert_eq!(m.spawning_biomass(&female, true), 10.0 + 12.0);
    }
}
