//! The core `Space` trait and `dyn Space` downcast support.

use shoal_core::{CellId, Coord};
use smallvec::SmallVec;
use std::any::Any;

/// Central spatial abstraction for Shoal simulations.
///
/// Diffusion, allocators and the orchestrators see the world only through
/// this trait. Topology is read-only after construction.
pub trait Space: Any + Send + Sync + 'static {
    /// Total number of cells, land included.
    fn cell_count(&self) -> usize;

    /// Coordinate of a cell, or `None` if the id is outside the space.
    fn coord(&self, cell: CellId) -> Option<Coord>;

    /// Cell at a coordinate, or `None` if it is outside the space.
    fn cell_at(&self, coord: &Coord) -> Option<CellId>;

    /// Water cells within Chebyshev distance `radius` of `cell`, excluding
    /// `cell` itself.
    ///
    /// Returned in a deterministic, backend-defined order without
    /// duplicates. A radius of zero yields no neighbours.
    fn neighbours(&self, cell: CellId, radius: u32) -> SmallVec<[CellId; 8]>;

    /// Chebyshev distance between two cells.
    fn distance(&self, a: CellId, b: CellId) -> f64;

    /// All cells in deterministic canonical order.
    fn canonical_ordering(&self) -> Vec<CellId> {
        (0..self.cell_count() as u32).map(CellId).collect()
    }

    /// Whether fish can live in `cell`.
    fn is_water(&self, cell: CellId) -> bool {
        cell.index() < self.cell_count()
    }

    /// Static habitability weight of `cell`; land and unknown cells are `0`.
    fn habitability(&self, cell: CellId) -> f64 {
        if self.is_water(cell) {
            1.0
        } else {
            0.0
        }
    }

    /// Water cells in canonical order.
    fn water_cells(&self) -> Vec<CellId> {
        self.canonical_ordering()
            .into_iter()
            .filter(|&c| self.is_water(c))
            .collect()
    }
}

impl dyn Space {
    /// Attempt to downcast a trait object to a concrete backend.
    pub fn downcast_ref<T: Space>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }
}
