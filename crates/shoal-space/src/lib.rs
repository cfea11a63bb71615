//! Spatial grids for Shoal simulations.
//!
//! This crate defines the [`Space`] trait, through which every process
//! asks for cells, Moore neighbourhoods and per-cell static attributes,
//! along with the [`MooreGrid`] backend used by the ocean models.
//!
//! Cells are identified by [`CellId`](shoal_core::CellId) in canonical
//! row-major order. Land cells stay in the ordering but are never
//! returned as neighbours, so nothing can diffuse into them.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod edge;
pub mod error;
pub(crate) mod grid2d;
pub mod moore;
pub mod space;

#[cfg(test)]
pub(crate) mod compliance;

pub use edge::EdgeBehavior;
pub use error::SpaceError;
pub use moore::MooreGrid;
pub use space::Space;
