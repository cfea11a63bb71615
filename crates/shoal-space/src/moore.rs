//! 2D ocean grid with Moore neighbourhoods of arbitrary radius.

use crate::edge::EdgeBehavior;
use crate::error::SpaceError;
use crate::grid2d;
use crate::space::Space;
use indexmap::IndexSet;
use shoal_core::{CellId, Coord};
use smallvec::{smallvec, SmallVec};

/// A rectangular grid of square cells with an optional land mask and a
/// per-cell habitability weight.
///
/// Each cell has coordinate `[row, col]` and id `row * cols + col`.
/// Neighbourhoods are Moore (Chebyshev ball) of a caller-chosen radius;
/// distance is Chebyshev, so diagonal steps cost 1.
#[derive(Debug, Clone)]
pub struct MooreGrid {
    rows: u32,
    cols: u32,
    edge: EdgeBehavior,
    land: Vec<bool>,
    habitability: Vec<f64>,
}

impl MooreGrid {
    /// Largest allowed dimension; ids are `u32`, coordinates `i32`.
    pub const MAX_DIM: u32 = u16::MAX as u32;

    /// All-water grid with uniform habitability `1`.
    ///
    /// Returns `Err(SpaceError::EmptySpace)` if either dimension is 0, or
    /// `Err(SpaceError::DimensionTooLarge)` if either exceeds [`MAX_DIM`](Self::MAX_DIM).
    pub fn new(rows: u32, cols: u32, edge: EdgeBehavior) -> Result<Self, SpaceError> {
        if rows == 0 || cols == 0 {
            return Err(SpaceError::EmptySpace);
        }
        for (name, value) in [("rows", rows), ("cols", cols)] {
            if value > Self::MAX_DIM {
                return Err(SpaceError::DimensionTooLarge {
                    name,
                    value,
                    max: Self::MAX_DIM,
                });
            }
        }
        let cells = (rows as usize) * (cols as usize);
        Ok(Self {
            rows,
            cols,
            edge,
            land: vec![false; cells],
            habitability: vec![1.0; cells],
        })
    }

    /// Replace the land mask (`true` = land) in canonical order.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::AttributeLength`] if the mask does not cover
    /// every cell.
    pub fn with_land(mut self, land: Vec<bool>) -> Result<Self, SpaceError> {
        if land.len() != self.land.len() {
            return Err(SpaceError::AttributeLength {
                name: "land",
                expected: self.land.len(),
                actual: land.len(),
            });
        }
        self.land = land;
        Ok(self)
    }

    /// Replace the habitability weights in canonical order.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError`] if the vector does not cover every cell or a
    /// weight is negative or non-finite.
    pub fn with_habitability(mut self, habitability: Vec<f64>) -> Result<Self, SpaceError> {
        if habitability.len() != self.habitability.len() {
            return Err(SpaceError::AttributeLength {
                name: "habitability",
                expected: self.habitability.len(),
                actual: habitability.len(),
            });
        }
        if let Some((i, &value)) = habitability
            .iter()
            .enumerate()
            .find(|(_, v)| !(**v >= 0.0) || !v.is_finite())
        {
            return Err(SpaceError::InvalidHabitability {
                cell: CellId(i as u32),
                value,
            });
        }
        self.habitability = habitability;
        Ok(self)
    }

    /// Number of rows.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Edge behaviour.
    pub fn edge_behavior(&self) -> EdgeBehavior {
        self.edge
    }

    /// Cell at `(row, col)`, if in bounds.
    pub fn cell(&self, row: u32, col: u32) -> Option<CellId> {
        (row < self.rows && col < self.cols).then(|| CellId(row * self.cols + col))
    }

    /// `(row, col)` of a cell, if in bounds.
    pub fn row_col(&self, cell: CellId) -> Option<(u32, u32)> {
        (cell.index() < self.land.len()).then(|| (cell.0 / self.cols, cell.0 % self.cols))
    }
}

impl Space for MooreGrid {
    fn cell_count(&self) -> usize {
        self.land.len()
    }

    fn coord(&self, cell: CellId) -> Option<Coord> {
        self.row_col(cell).map(|(r, c)| smallvec![r as i32, c as i32])
    }

    fn cell_at(&self, coord: &Coord) -> Option<CellId> {
        if coord.len() != 2 || coord[0] < 0 || coord[1] < 0 {
            return None;
        }
        self.cell(coord[0] as u32, coord[1] as u32)
    }

    fn neighbours(&self, cell: CellId, radius: u32) -> SmallVec<[CellId; 8]> {
        let Some((r, c)) = self.row_col(cell) else {
            return SmallVec::new();
        };
        let reach = i64::from(radius);
        // Wrap on a small grid can reach the same cell from two offsets.
        let mut seen: IndexSet<CellId> = IndexSet::new();
        for dr in -reach..=reach {
            let Some(nr) = grid2d::resolve_axis(i64::from(r) + dr, self.rows, self.edge) else {
                continue;
            };
            for dc in -reach..=reach {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let Some(nc) = grid2d::resolve_axis(i64::from(c) + dc, self.cols, self.edge)
                else {
                    continue;
                };
                let id = CellId(nr as u32 * self.cols + nc as u32);
                if id != cell && !self.land[id.index()] {
                    seen.insert(id);
                }
            }
        }
        seen.into_iter().collect()
    }

    fn distance(&self, a: CellId, b: CellId) -> f64 {
        match (self.row_col(a), self.row_col(b)) {
            (Some((ar, ac)), Some((br, bc))) => {
                let dr = grid2d::axis_distance(ar as i32, br as i32, self.rows, self.edge);
                let dc = grid2d::axis_distance(ac as i32, bc as i32, self.cols, self.edge);
                dr.max(dc)
            }
            _ => f64::INFINITY,
        }
    }

    fn is_water(&self, cell: CellId) -> bool {
        self.land.get(cell.index()).is_some_and(|land| !land)
    }

    fn habitability(&self, cell: CellId) -> f64 {
        if self.is_water(cell) {
            self.habitability[cell.index()]
        } else {
            0.0
        }
    }
}
