//! Recruitment: how many new individuals enter bin 0 each year.
//!
//! A [`RecruitmentKind`] turns the current spawner state into an expected
//! number of recruits. [`Recruitment`] wraps a kind with optional
//! [`LognormalNoise`] and an optional [`RecruitmentDelay`], and rounds the
//! result to a whole number of individuals.

mod delay;
mod noise;

use std::collections::BTreeMap;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use shoal_core::{Meristics, FEMALE, MALE};

pub use delay::RecruitmentDelay;
pub use noise::LognormalNoise;

use crate::error::{ProcessConfigError, ProcessError};

/// Stock-recruit relationship.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecruitmentKind {
    /// A constant number of recruits, optionally scaled per year.
    Fixed {
        /// Recruits in an unscaled year.
        recruits: f64,
        /// Multiplier for specific years; missing years use `1`.
        #[serde(default)]
        yearly_scale: BTreeMap<u32, f64>,
    },
    /// Logistic growth of total biomass converted into bin-0 individuals.
    Logistic {
        /// Intrinsic growth rate `r`.
        malthusian: f64,
        /// Carrying capacity `K`, in biomass units.
        carrying_capacity: f64,
    },
    /// Beverton-Holt on spawning stock biomass, steepness form:
    /// `R = 4·h·R0·SSB / (R0·φ0·(1 − h) + (5h − 1)·SSB)`.
    BevertonHolt {
        /// Steepness `h`, within `[0.2, 1]`.
        steepness: f64,
        /// Virgin recruits `R0`.
        virgin_recruits: f64,
        /// Spawner biomass per recruit at virgin conditions `φ0`.
        cumulative_phi: f64,
        /// Whether SSB also weighs by relative fecundity.
        #[serde(default)]
        with_fecundity: bool,
    },
}

impl RecruitmentKind {
    /// Beverton-Holt with steepness, `R0` and `φ0` taken from `meristics`.
    pub fn beverton_holt(meristics: &Meristics, with_fecundity: bool) -> Self {
        Self::BevertonHolt {
            steepness: meristics.steepness(),
            virgin_recruits: meristics.virgin_recruits(),
            cumulative_phi: meristics.cumulative_phi(),
            with_fecundity,
        }
    }

    /// Check the kind's own parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessConfigError`] for negative recruits or scales, a
    /// negative growth rate, a non-positive carrying capacity, `R0` or
    /// `φ0`, or steepness outside `[0.2, 1]`.
    pub fn validate(&self) -> Result<(), ProcessConfigError> {
        match self {
            Self::Fixed {
                recruits,
                yearly_scale,
            } => {
                check_non_negative("fixed recruits", *recruits)?;
                yearly_scale
                    .values()
                    .try_for_each(|&s| check_non_negative("yearly recruit scale", s))
            }
            Self::Logistic {
                malthusian,
                carrying_capacity,
            } => {
                check_non_negative("malthusian", *malthusian)?;
                check_positive("carrying_capacity", *carrying_capacity)
            }
            Self::BevertonHolt {
                steepness,
                virgin_recruits,
                cumulative_phi,
                ..
            } => {
                if !(0.2..=1.0).contains(steepness) {
                    return Err(ProcessConfigError::Steepness { value: *steepness });
                }
                check_positive("virgin_recruits", *virgin_recruits)?;
                check_positive("cumulative_phi", *cumulative_phi)
            }
        }
    }

    /// Expected recruits for the given spawners, before noise and
    /// rounding.
    ///
    /// `female` must cover every bin. `male` must also cover every bin, or
    /// be empty for single-subdivision species.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::SpawnerLength`] or
    /// [`ProcessError::InvalidSpawners`] for malformed spawner vectors.
    pub fn expected(
        &self,
        meristics: &Meristics,
        female: &[f64],
        male: &[f64],
        year: u32,
    ) -> Result<f64, ProcessError> {
        check_spawners(meristics.bins(), female, male)?;
        let recruits = match self {
            Self::Fixed {
                recruits,
                yearly_scale,
            } => recruits * yearly_scale.get(&year).copied().unwrap_or(1.0),
            Self::Logistic {
                malthusian,
                carrying_capacity,
            } => logistic(meristics, female, male, *malthusian, *carrying_capacity),
            Self::BevertonHolt {
                steepness,
                virgin_recruits,
                cumulative_phi,
                with_fecundity,
            } => {
                let ssb = meristics.spawning_biomass(female, *with_fecundity);
                if ssb <= 0.0 {
                    0.0
                } else {
                    let h = *steepness;
                    4.0 * h * virgin_recruits * ssb
                        / (virgin_recruits * cumulative_phi * (1.0 - h) + (5.0 * h - 1.0) * ssb)
                }
            }
        };
        Ok(recruits.max(0.0))
    }

    /// Whole recruits from an expected value: the logistic kind floors so
    /// it never overshoots the carrying capacity, the others round.
    fn whole(&self, value: f64) -> f64 {
        match self {
            Self::Logistic { .. } => value.floor(),
            Self::Fixed { .. } | Self::BevertonHolt { .. } => value.round(),
        }
    }
}

fn logistic(meristics: &Meristics, female: &[f64], male: &[f64], r: f64, k: f64) -> f64 {
    let mut biomass: f64 = female
        .iter()
        .zip(meristics.weights(FEMALE.min(meristics.subdivisions() - 1)))
        .map(|(n, w)| n * w)
        .sum();
    if meristics.subdivisions() > MALE {
        biomass += male
            .iter()
            .zip(meristics.weights(MALE))
            .map(|(n, w)| n * w)
            .sum::<f64>();
    }
    if biomass >= k {
        return 0.0;
    }
    let growth = (r * biomass * (1.0 - biomass / k)).min(k - biomass);
    let subdivisions = meristics.subdivisions();
    let recruit_weight =
        (0..subdivisions).map(|s| meristics.weight(s, 0)).sum::<f64>() / subdivisions as f64;
    if recruit_weight <= 0.0 {
        return 0.0;
    }
    growth / recruit_weight
}

fn check_spawners(bins: usize, female: &[f64], male: &[f64]) -> Result<(), ProcessError> {
    if female.len() != bins {
        return Err(ProcessError::SpawnerLength {
            expected: bins,
            actual: female.len(),
        });
    }
    if !male.is_empty() && male.len() != bins {
        return Err(ProcessError::SpawnerLength {
            expected: bins,
            actual: male.len(),
        });
    }
    if let Some((bin, value)) = female
        .iter()
        .chain(male)
        .enumerate()
        .find(|(_, v)| !(**v >= 0.0) || !v.is_finite())
    {
        return Err(ProcessError::InvalidSpawners {
            reason: format!("entry {bin} is {value}"),
        });
    }
    Ok(())
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), ProcessConfigError> {
    if !(value >= 0.0) || !value.is_finite() {
        return Err(ProcessConfigError::Negative { name, value });
    }
    Ok(())
}

fn check_positive(name: &'static str, value: f64) -> Result<(), ProcessConfigError> {
    if !(value > 0.0) || !value.is_finite() {
        return Err(ProcessConfigError::NotPositive { name, value });
    }
    Ok(())
}

/// A stock-recruit relationship with its optional noise and delay.
///
/// ```
/// use shoal_biology::{Recruitment, RecruitmentDelay, RecruitmentKind};
/// use shoal_core::MeristicsBuilder;
/// use rand::SeedableRng;
///
/// let m = MeristicsBuilder::new(2, 3).build().unwrap();
/// let kind = RecruitmentKind::Fixed { recruits: 500.0, yearly_scale: Default::default() };
/// let mut r = Recruitment::new(kind).with_delay(RecruitmentDelay::new(1));
/// let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
/// let spawners = [0.0; 3];
/// assert_eq!(r.recruit(&m, &spawners, &spawners, 0, &mut rng).unwrap(), 0);
/// assert_eq!(r.recruit(&m, &spawners, &spawners, 1, &mut rng).unwrap(), 500);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Recruitment {
    kind: RecruitmentKind,
    noise: Option<LognormalNoise>,
    delay: Option<RecruitmentDelay>,
}

impl Recruitment {
    /// Undelayed, noiseless recruitment.
    pub fn new(kind: RecruitmentKind) -> Self {
        Self {
            kind,
            noise: None,
            delay: None,
        }
    }

    /// Add process noise.
    pub fn with_noise(mut self, noise: LognormalNoise) -> Self {
        self.noise = Some(noise);
        self
    }

    /// Queue recruits for later release.
    pub fn with_delay(mut self, delay: RecruitmentDelay) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The stock-recruit relationship.
    pub fn kind(&self) -> &RecruitmentKind {
        &self.kind
    }

    /// The delay queue, if any.
    pub fn delay(&self) -> Option<&RecruitmentDelay> {
        self.delay.as_ref()
    }

    /// Check the relationship and its noise.
    ///
    /// # Errors
    ///
    /// See [`RecruitmentKind::validate`] and [`LognormalNoise::validate`].
    pub fn validate(&self) -> Result<(), ProcessConfigError> {
        self.kind.validate()?;
        if let Some(noise) = &self.noise {
            noise.validate()?;
        }
        Ok(())
    }

    /// Recruits becoming visible in `year`.
    ///
    /// Computes this year's batch from the spawners, applies noise, rounds
    /// to whole individuals and, with a delay, swaps it for whatever the
    /// queue releases this year.
    ///
    /// # Errors
    ///
    /// See [`RecruitmentKind::expected`].
    pub fn recruit(
        &mut self,
        meristics: &Meristics,
        female: &[f64],
        male: &[f64],
        year: u32,
        rng: &mut dyn RngCore,
    ) -> Result<u64, ProcessError> {
        let mut batch = self.kind.expected(meristics, female, male, year)?;
        if let Some(noise) = &self.noise {
            batch *= noise.multiplier(year, rng);
        }
        let batch = self.kind.whole(batch).max(0.0);
        let visible = match &mut self.delay {
            Some(delay) => {
                delay.submit(year, batch);
                delay.release(year)
            }
            None => batch,
        };
        Ok(visible as u64)
    }
}
