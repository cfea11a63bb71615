//! Registration and step errors.
//!
//! Configuration problems are [`ConfigError`](crate::ConfigError)s and
//! surface before the first tick. The errors here come from populating
//! cells, from external removals between ticks, and from the tick itself.

use shoal_biology::ProcessError;
use shoal_core::{AbundanceError, CellId, SpeciesId};

/// A cell could not be registered, found or modified.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RegistrationError {
    /// The cell already holds this species.
    #[error("cell {cell} is already registered")]
    DuplicateCell {
        /// The repeated cell.
        cell: CellId,
    },
    /// The cell is not registered, or is land or outside the grid.
    #[error("cell {cell} is not a registered water cell")]
    UnknownCell {
        /// The cell.
        cell: CellId,
    },
    /// No processes exist for this species.
    #[error("species {species} has no processes")]
    UnknownSpecies {
        /// The species.
        species: SpeciesId,
    },
    /// The matrix does not have the species' shape.
    #[error(
        "cell {cell}: abundance is {subdivisions}x{bins}, \
         species needs {expected_subdivisions}x{expected_bins}"
    )]
    ShapeMismatch {
        /// The cell.
        cell: CellId,
        /// Subdivisions required.
        expected_subdivisions: usize,
        /// Bins required.
        expected_bins: usize,
        /// Subdivisions supplied.
        subdivisions: usize,
        /// Bins supplied.
        bins: usize,
    },
    /// Cells can only be added before the first step.
    #[error("cells cannot be added once stepping has started")]
    AlreadyStepping,
    /// The processes were finalized.
    #[error("processes are finalized")]
    Finalized,
    /// An abundance operation failed.
    #[error(transparent)]
    Abundance(#[from] AbundanceError),
}

/// A tick could not complete.
///
/// The simulation must not continue after a step error: part of the
/// tick may already have been applied.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum StepError {
    /// No cell was registered before stepping.
    #[error("species '{species}' has no registered cells")]
    NotStarted {
        /// Species name.
        species: String,
    },
    /// Stepping after finalization.
    #[error("species '{species}' is finalized")]
    Finalized {
        /// Species name.
        species: String,
    },
    /// The world was finalized.
    #[error("the world is finalized")]
    WorldFinalized,
    /// An earlier step failed and the world stopped there.
    #[error("the world halted on day {day} after a failed step")]
    Halted {
        /// The day that failed.
        day: u64,
    },
    /// Global recruitment fired without an allocator.
    #[error("species '{species}' recruited without an allocator")]
    MissingAllocator {
        /// Species name.
        species: String,
    },
    /// A process failed.
    #[error("species '{species}': {source}")]
    Process {
        /// Species name.
        species: String,
        /// The failure.
        #[source]
        source: ProcessError,
    },
}

/// A snapshot or reset could not be applied.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ResetError {
    /// A biomass snapshot was restored onto abundance cells, or the
    /// reverse.
    #[error("snapshot holds {found} but the species is tracked as {expected}")]
    ModeMismatch {
        /// Mode of the target species.
        expected: &'static str,
        /// Mode of the snapshot.
        found: &'static str,
    },
    /// Nothing was recorded before resetting.
    #[error("reset requested before anything was recorded")]
    NothingRecorded,
    /// A cell could not be overwritten.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    /// Weights could not be computed.
    #[error(transparent)]
    Process(#[from] ProcessError),
}
