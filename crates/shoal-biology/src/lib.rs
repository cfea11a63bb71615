//! Biological processes for Shoal simulations.
//!
//! Every process is a closed set of variants behind one enum, selected at
//! configuration time and dispatched through a uniform method:
//!
//! - [`NaturalMortality`]: exponential or proportional culling.
//! - [`Aging`]: full shift, proportional shift, or a probabilistic
//!   length transition built by [`GrowthTransition`].
//! - [`Recruitment`]: fixed, logistic or Beverton-Holt recruits, with an
//!   optional [`RecruitmentDelay`] queue and [`LognormalNoise`].
//! - [`Diffuser`]: constant-rate, age-limited or habitability-weighted
//!   movement between Moore neighbours, computed from a frozen snapshot
//!   held by the ping-pong [`AbundanceArena`].
//! - [`Allocator`]: spatial weights used to place recruits or reset stocks.
//! - [`LogisticGrowth`]: scalar growth for the biomass-only mode.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod aging;
pub mod allocator;
pub mod arena;
pub mod diffusion;
pub mod error;
pub mod growth;
pub mod logistic;
pub mod mortality;
pub mod recruitment;
pub mod rounding;

pub use aging::Aging;
pub use allocator::Allocator;
pub use arena::{AbundanceArena, StagingGuard};
pub use diffusion::{DiffusionPlan, Diffuser};
pub use error::{ProcessConfigError, ProcessError};
pub use growth::GrowthTransition;
pub use logistic::LogisticGrowth;
pub use mortality::NaturalMortality;
pub use recruitment::{LognormalNoise, Recruitment, RecruitmentDelay, RecruitmentKind};
pub use rounding::Rounding;
