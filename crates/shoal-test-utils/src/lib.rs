//! Test fixtures for Shoal development.
//!
//! Small, fully specified species and grids shared by the unit,
//! integration and benchmark suites, so that every crate exercises the
//! same reference scenarios.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    growing_species, open_grid, seeded_abundance, shortspine_input, two_sex_species,
    AbundanceBuilder,
};
