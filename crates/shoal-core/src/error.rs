//! Error types for the core data model.
//!
//! Organized by the structure whose invariant they protect: meristics
//! construction, abundance mutation and species registration.

/// Errors from building a [`Meristics`](crate::Meristics) parameter set.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum MeristicsError {
    /// The bin or subdivision count was zero.
    #[error("meristics need at least one bin and one subdivision, got {subdivisions}x{bins}")]
    EmptyShape {
        /// Requested subdivisions.
        subdivisions: usize,
        /// Requested bins.
        bins: usize,
    },
    /// A per-bin or per-subdivision array had the wrong length.
    #[error("'{name}' has length {actual}, expected {expected}")]
    LengthMismatch {
        /// Name of the offending array.
        name: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
    /// A parameter was negative, NaN or infinite.
    #[error("'{name}' must be finite and non-negative, got {value}")]
    InvalidValue {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// Age bounds were inconsistent.
    #[error("invalid ages: {reason}")]
    InvalidAges {
        /// What is wrong with the ages.
        reason: String,
    },
}

/// Errors from reading or mutating a [`StructuredAbundance`](crate::StructuredAbundance).
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum AbundanceError {
    /// A matrix had no subdivisions or no bins.
    #[error("abundance matrix must have at least one subdivision and one bin")]
    Empty,
    /// Rows of a matrix had different lengths.
    #[error("row {row} has {actual} bins, expected {expected}")]
    RaggedRows {
        /// Index of the offending row.
        row: usize,
        /// Bins in the first row.
        expected: usize,
        /// Bins in the offending row.
        actual: usize,
    },
    /// A count would have been negative or non-finite.
    #[error("count at subdivision {subdivision}, bin {bin} must be finite and non-negative, got {value}")]
    InvalidCount {
        /// Subdivision index.
        subdivision: usize,
        /// Bin index.
        bin: usize,
        /// The rejected value.
        value: f64,
    },
    /// Two matrices had different shapes.
    #[error("shape mismatch: expected {expected_subdivisions}x{expected_bins}, got {subdivisions}x{bins}")]
    ShapeMismatch {
        /// Subdivisions of the receiving matrix.
        expected_subdivisions: usize,
        /// Bins of the receiving matrix.
        expected_bins: usize,
        /// Subdivisions of the offending input.
        subdivisions: usize,
        /// Bins of the offending input.
        bins: usize,
    },
    /// A subdivision or bin index was outside the matrix.
    #[error("index ({subdivision}, {bin}) outside {subdivisions}x{bins} matrix")]
    OutOfRange {
        /// Requested subdivision.
        subdivision: usize,
        /// Requested bin.
        bin: usize,
        /// Matrix subdivisions.
        subdivisions: usize,
        /// Matrix bins.
        bins: usize,
    },
}

/// Errors from building the species registry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two species shared a name.
    #[error("species '{name}' is already registered")]
    DuplicateName {
        /// The repeated name.
        name: String,
    },
}
