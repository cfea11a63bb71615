//! Strongly-typed identifiers and the [`Coord`] type alias.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Subdivision index conventionally holding females.
pub const FEMALE: usize = 0;

/// Subdivision index conventionally holding males.
pub const MALE: usize = 1;

/// Identifies a cell within a spatial grid.
///
/// Cells are numbered in canonical (row-major) order, so `CellId(n)` is
/// the n-th cell of the grid it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(pub u32);

impl CellId {
    /// The cell id as a dense index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CellId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a species within the registry.
///
/// Assigned sequentially at registration: `SpeciesId(n)` is the n-th
/// species added to the [`SpeciesRegistry`](crate::SpeciesRegistry).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesId(pub u32);

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SpeciesId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Grid coordinate, `[row, col]` for the square grids used here.
///
/// Uses `SmallVec<[i32; 4]>` so coordinates never touch the heap.
pub type Coord = SmallVec<[i32; 4]>;
