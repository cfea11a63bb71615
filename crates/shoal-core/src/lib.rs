//! Core types for the Shoal population-dynamics engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the data model shared by every other crate in the workspace:
//! identifiers, the simulation clock, species [`Meristics`], the
//! per-cell [`StructuredAbundance`] matrix and the error types raised
//! when those invariants would be broken.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod abundance;
pub mod clock;
pub mod error;
pub mod id;
pub mod local;
pub mod meristics;
pub mod species;

pub use abundance::{Removal, StructuredAbundance};
pub use clock::SimClock;
pub use error::{AbundanceError, MeristicsError, RegistryError};
pub use id::{CellId, Coord, SpeciesId, FEMALE, MALE};
pub use local::{BiomassPool, LocalBiology};
pub use meristics::{GrowthCurve, GrowthParameters, Meristics, MeristicsBuilder, StockAssessmentInput};
pub use species::{Species, SpeciesRegistry};
