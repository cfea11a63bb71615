//! Engine and per-species configuration, validation, and error types.
//!
//! Every type here is plain data that derives `serde`, so a scenario can
//! be loaded from JSON by the surrounding simulation. Nothing runs until
//! [`SpeciesProcessesConfig::build`] has checked every part against the
//! species it will drive.

use serde::{Deserialize, Serialize};
use shoal_biology::{
    Aging, Allocator, Diffuser, LognormalNoise, NaturalMortality, ProcessConfigError, Recruitment,
    RecruitmentDelay, RecruitmentKind, Rounding,
};
use shoal_core::clock::DAYS_PER_YEAR;
use shoal_core::{Meristics, RegistryError, Species, SpeciesId};

use crate::processes::{ProcessSet, SingleSpeciesProcesses};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while building the engine or a species' processes.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A process rejected its parameters for this species.
    #[error("species '{species}': {source}")]
    Process {
        /// Species name.
        species: String,
        /// What the process rejected.
        #[source]
        source: ProcessConfigError,
    },
    /// Global recruitment with nowhere to place the recruits.
    #[error("species '{species}' recruits globally but has no allocator")]
    MissingAllocator {
        /// Species name.
        species: String,
    },
    /// An interval or cadence of zero days.
    #[error("'{name}' must be at least one day")]
    ZeroInterval {
        /// Setting name.
        name: &'static str,
    },
    /// The species id is not in the registry.
    #[error("unknown species {species}")]
    UnknownSpecies {
        /// The missing id.
        species: SpeciesId,
    },
    /// Processes for this species were already added.
    #[error("species {species} already has processes")]
    DuplicateSpecies {
        /// The repeated id.
        species: SpeciesId,
    },
    /// The species could not be registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

// ── EngineConfig ───────────────────────────────────────────────────

/// Settings shared by every species in a world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed of the world's random number generator. Default: 0.
    pub seed: u64,
    /// Whole-fish or real-valued counts. Default: whole.
    pub rounding: Rounding,
    /// Days between natural-mortality passes. Default: 365.
    pub mortality_interval_days: u32,
    /// Days between diffusion passes. Default: 1.
    pub diffusion_interval_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            rounding: Rounding::Whole,
            mortality_interval_days: DAYS_PER_YEAR,
            diffusion_interval_days: 1,
        }
    }
}

impl EngineConfig {
    /// Check the intervals.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroInterval`] for a zero interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mortality_interval_days == 0 {
            return Err(ConfigError::ZeroInterval {
                name: "mortality_interval_days",
            });
        }
        if self.diffusion_interval_days == 0 {
            return Err(ConfigError::ZeroInterval {
                name: "diffusion_interval_days",
            });
        }
        Ok(())
    }
}

// ── AgingSpec ──────────────────────────────────────────────────────

fn default_transition_cadence() -> u32 {
    2
}

/// Serializable description of an [`Aging`] process and its cadence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgingSpec {
    /// Full one-bin shift once a year.
    Standard {
        /// Whether the oldest bin accumulates.
        #[serde(default)]
        plus_group: bool,
    },
    /// Shift a fraction of each bin once a year.
    Proportional {
        /// Fraction moving per year.
        proportion: f64,
        /// Whether the oldest bin keeps its outflow.
        #[serde(default)]
        plus_group: bool,
    },
    /// Growth-transition matrix applied every `cadence_days`.
    LengthTransition {
        /// Standard deviation of length around the expected growth.
        size_sd: f64,
        /// Days between applications. Default: 2.
        #[serde(default = "default_transition_cadence")]
        cadence_days: u32,
    },
}

impl Default for AgingSpec {
    fn default() -> Self {
        Self::Standard { plus_group: false }
    }
}

impl AgingSpec {
    /// Build the process and return it with its cadence in days.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessConfigError`] for a bad proportion, a zero cadence
    /// or meristics without lengths and growth curves.
    pub fn build(&self, meristics: &Meristics) -> Result<(Aging, u32), ProcessConfigError> {
        match *self {
            Self::Standard { plus_group } => Ok((Aging::Standard { plus_group }, DAYS_PER_YEAR)),
            Self::Proportional {
                proportion,
                plus_group,
            } => Ok((Aging::proportional(proportion, plus_group)?, DAYS_PER_YEAR)),
            Self::LengthTransition {
                size_sd,
                cadence_days,
            } => {
                if cadence_days == 0 {
                    return Err(ProcessConfigError::ZeroInterval {
                        name: "aging cadence_days",
                    });
                }
                let scaling = f64::from(cadence_days) / f64::from(DAYS_PER_YEAR);
                let aging = Aging::length_transition(meristics, size_sd, scaling)?;
                aging.validate(meristics)?;
                Ok((aging, cadence_days))
            }
        }
    }
}

// ── RecruitmentSpec ────────────────────────────────────────────────

/// Serializable description of a [`Recruitment`] process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecruitmentSpec {
    /// Stock-recruit relationship.
    pub kind: RecruitmentKind,
    /// Years between computing a batch and releasing it. Default: 0.
    #[serde(default)]
    pub delay_years: u32,
    /// Batches released in years `0, 1, ...` before any delayed batch
    /// arrives. Only used with a delay.
    #[serde(default)]
    pub backlog: Vec<f64>,
    /// Optional multiplicative noise.
    #[serde(default)]
    pub noise: Option<LognormalNoise>,
}

impl RecruitmentSpec {
    /// Undelayed, noiseless recruitment of `kind`.
    pub fn new(kind: RecruitmentKind) -> Self {
        Self {
            kind,
            delay_years: 0,
            backlog: Vec::new(),
            noise: None,
        }
    }

    /// Build the runtime process.
    ///
    /// # Errors
    ///
    /// See [`Recruitment::validate`].
    pub fn build(&self) -> Result<Recruitment, ProcessConfigError> {
        let mut recruitment = Recruitment::new(self.kind.clone());
        if self.delay_years > 0 || !self.backlog.is_empty() {
            recruitment = recruitment.with_delay(RecruitmentDelay::with_backlog(
                self.delay_years,
                self.backlog.iter().copied(),
            ));
        }
        if let Some(noise) = self.noise {
            recruitment = recruitment.with_noise(noise);
        }
        recruitment.validate()?;
        Ok(recruitment)
    }
}

/// Where spawners are counted and recruits placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecruitmentScope {
    /// Spawners summed over the grid; recruits spread by the allocator.
    #[default]
    Global,
    /// Each cell recruits from its own spawners into itself.
    Local,
}

// ── SpeciesProcessesConfig ─────────────────────────────────────────

/// Every natural process of one species.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesProcessesConfig {
    /// Natural mortality.
    pub mortality: NaturalMortality,
    /// Aging and its cadence.
    #[serde(default)]
    pub aging: AgingSpec,
    /// Recruitment.
    pub recruitment: RecruitmentSpec,
    /// Movement between cells. Default: none.
    #[serde(default)]
    pub diffusion: Diffuser,
    /// Where globally computed recruits go.
    #[serde(default)]
    pub allocator: Option<Allocator>,
    /// Global or per-cell recruitment. Default: global.
    #[serde(default)]
    pub scope: RecruitmentScope,
}

impl SpeciesProcessesConfig {
    /// A configuration with the given mortality and recruitment, standard
    /// die-off aging, no diffusion and a uniform allocator.
    pub fn new(mortality: NaturalMortality, recruitment: RecruitmentSpec) -> Self {
        Self {
            mortality,
            aging: AgingSpec::default(),
            recruitment,
            diffusion: Diffuser::None,
            allocator: Some(Allocator::Uniform),
            scope: RecruitmentScope::Global,
        }
    }

    /// Check every part against `species` and build its orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Process`] naming the species for any process
    /// that rejects its parameters, and [`ConfigError::MissingAllocator`]
    /// for global recruitment without an allocator.
    pub fn build(&self, species: &Species) -> Result<SingleSpeciesProcesses, ConfigError> {
        let meristics = species.meristics();
        let wrap = |source: ProcessConfigError| ConfigError::Process {
            species: species.name().to_owned(),
            source,
        };

        self.mortality.validate(meristics).map_err(wrap)?;
        let (aging, aging_cadence_days) = self.aging.build(meristics).map_err(wrap)?;
        let recruitment = self.recruitment.build().map_err(wrap)?;
        self.diffusion.validate(meristics).map_err(wrap)?;
        match (&self.allocator, self.scope) {
            (None, RecruitmentScope::Global) => {
                return Err(ConfigError::MissingAllocator {
                    species: species.name().to_owned(),
                });
            }
            (Some(allocator), _) => allocator.validate().map_err(wrap)?,
            (None, RecruitmentScope::Local) => {}
        }

        Ok(SingleSpeciesProcesses::new(
            species.clone(),
            ProcessSet {
                mortality: self.mortality.clone(),
                aging,
                aging_cadence_days,
                recruitment,
                diffusion: self.diffusion.clone(),
                allocator: self.allocator.clone(),
                scope: self.scope,
            },
        ))
    }
}
