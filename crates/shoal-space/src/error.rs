//! Error types for grid construction and queries.

use shoal_core::CellId;

/// Errors arising from grid construction or cell lookups.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SpaceError {
    /// Attempted to construct a grid with zero cells.
    #[error("space must have at least one cell")]
    EmptySpace,
    /// A dimension exceeds the coordinate range.
    #[error("{name} = {value} exceeds maximum {max}")]
    DimensionTooLarge {
        /// Which dimension.
        name: &'static str,
        /// The requested size.
        value: u32,
        /// The largest allowed size.
        max: u32,
    },
    /// A per-cell attribute vector had the wrong length.
    #[error("'{name}' has {actual} entries, grid has {expected} cells")]
    AttributeLength {
        /// Name of the attribute.
        name: &'static str,
        /// Number of cells.
        expected: usize,
        /// Entries supplied.
        actual: usize,
    },
    /// A habitability weight was negative or non-finite.
    #[error("habitability of cell {cell} must be finite and non-negative, got {value}")]
    InvalidHabitability {
        /// The offending cell.
        cell: CellId,
        /// The rejected weight.
        value: f64,
    },
    /// A cell id outside the grid.
    #[error("cell {cell} is not part of this space")]
    UnknownCell {
        /// The offending cell.
        cell: CellId,
    },
}
