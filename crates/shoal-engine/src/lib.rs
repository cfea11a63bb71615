//! Orchestration of Shoal's natural processes.
//!
//! Builds each species' processes from serde-friendly configuration,
//! applies them to every registered cell in a fixed daily order, and
//! drives the whole grid through [`BiologyWorld`]:
//!
//! - [`SpeciesProcessesConfig`] validates and builds a
//!   [`SingleSpeciesProcesses`].
//! - [`MultiSpeciesProcesses`] steps several species and shares their
//!   diffusion plans.
//! - [`BiomassProcesses`] runs the biomass-only logistic mode.
//! - [`GridSnapshot`], [`BiomassResetter`] and [`AbundanceResetter`]
//!   capture and restore spatial distributions.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod biomass;
pub mod config;
pub mod error;
pub mod metrics;
pub mod multi;
pub mod processes;
pub mod reset;
pub mod world;

pub use biomass::BiomassProcesses;
pub use config::{
    AgingSpec, ConfigError, EngineConfig, RecruitmentScope, RecruitmentSpec,
    SpeciesProcessesConfig,
};
pub use error::{RegistrationError, ResetError, StepError};
pub use metrics::StepMetrics;
pub use multi::MultiSpeciesProcesses;
pub use processes::{Lifecycle, ProcessSet, SingleSpeciesProcesses, StepContext};
pub use reset::{AbundanceResetter, BiomassResetter, GridSnapshot};
pub use world::BiologyWorld;
