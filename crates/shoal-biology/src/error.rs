//! Error types for process construction and execution.
//!
//! [`ProcessConfigError`] is raised while building a process and is always
//! fatal to setup. [`ProcessError`] is raised while a process runs; the
//! engine treats it as unrecoverable for the tick.

use shoal_core::{AbundanceError, CellId};

/// A process was configured with parameters it cannot honour.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ProcessConfigError {
    /// A rate or proportion fell outside `[0, 1]` or was not finite.
    #[error("'{name}' must be within [0, 1], got {value}")]
    RateOutOfRange {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A parameter that must be strictly positive was not.
    #[error("'{name}' must be finite and positive, got {value}")]
    NotPositive {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A parameter that must be non-negative was not.
    #[error("'{name}' must be finite and non-negative, got {value}")]
    Negative {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// Beverton-Holt steepness outside `[0.2, 1]`.
    #[error("steepness must be within [0.2, 1], got {value}")]
    Steepness {
        /// The rejected steepness.
        value: f64,
    },
    /// The moving-bin window is empty or outside the species' bins.
    #[error("moving bins [{smallest}, {largest}] invalid for {bins} bins")]
    BinRange {
        /// First moving bin.
        smallest: usize,
        /// Last moving bin.
        largest: usize,
        /// Bins of the species.
        bins: usize,
    },
    /// Meristics lack a subdivision the process needs.
    #[error("process '{process}' needs subdivision {subdivision}, species has {subdivisions}")]
    MissingSubdivision {
        /// Process name.
        process: &'static str,
        /// Requested subdivision.
        subdivision: usize,
        /// Subdivisions available.
        subdivisions: usize,
    },
    /// Meristics carry no growth curve for a subdivision.
    #[error("no growth curve for subdivision {subdivision}")]
    MissingGrowth {
        /// The subdivision lacking a curve.
        subdivision: usize,
    },
    /// A per-bin table has the wrong number of bins.
    #[error("'{name}' covers {actual} bins, species has {expected}")]
    BinMismatch {
        /// What was mis-sized.
        name: &'static str,
        /// Bins of the species.
        expected: usize,
        /// Bins supplied.
        actual: usize,
    },
    /// A cadence or interval of zero days.
    #[error("'{name}' must be at least one day")]
    ZeroInterval {
        /// Parameter name.
        name: &'static str,
    },
}

/// A process failed while running.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ProcessError {
    /// Spawner counts were negative or non-finite.
    #[error("invalid spawners: {reason}")]
    InvalidSpawners {
        /// What was wrong.
        reason: String,
    },
    /// A spawner vector did not match the species' bins.
    #[error("spawner vector has {actual} bins, species has {expected}")]
    SpawnerLength {
        /// Bins of the species.
        expected: usize,
        /// Bins supplied.
        actual: usize,
    },
    /// No cell carried positive weight.
    #[error("no cell has positive weight to receive {what}")]
    NoValidCell {
        /// What was being allocated.
        what: &'static str,
    },
    /// An allocator produced a non-finite or negative weight.
    #[error("allocator gave cell {cell} weight {weight}")]
    InvalidWeight {
        /// The cell.
        cell: CellId,
        /// The rejected weight.
        weight: f64,
    },
    /// An abundance operation failed.
    #[error(transparent)]
    Abundance(#[from] AbundanceError),
}
