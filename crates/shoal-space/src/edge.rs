//! Boundary behaviour for lattice grids.

use serde::{Deserialize, Serialize};

/// How a grid treats neighbourhoods that run past its edges.
///
/// # Examples
///
/// ```
/// use shoal_core::CellId;
/// use shoal_space::{EdgeBehavior, MooreGrid, Space};
///
/// // Absorb: a corner of a 4x4 grid has 3 neighbours at radius 1.
/// let absorb = MooreGrid::new(4, 4, EdgeBehavior::Absorb).unwrap();
/// assert_eq!(absorb.neighbours(CellId(0), 1).len(), 3);
///
/// // Wrap: every cell has 8 (torus).
/// let wrap = MooreGrid::new(4, 4, EdgeBehavior::Wrap).unwrap();
/// assert_eq!(wrap.neighbours(CellId(0), 1).len(), 8);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeBehavior {
    /// Out-of-bounds cells are omitted (fewer neighbours at the coast).
    #[default]
    Absorb,
    /// Out-of-bounds cells wrap to the opposite side (periodic).
    Wrap,
}
