//! Neighbourhoods on a grid with a coastline and graded habitability.

use shoal_core::CellId;
use shoal_space::{EdgeBehavior, MooreGrid, Space};

/// 3x4 grid whose left column is land.
fn coast() -> MooreGrid {
    let land = (0..12).map(|i| i % 4 == 0).collect();
    let habitability = (0..12).map(|i| f64::from(i % 4) / 3.0).collect();
    MooreGrid::new(3, 4, EdgeBehavior::Absorb)
        .unwrap()
        .with_land(land)
        .unwrap()
        .with_habitability(habitability)
        .unwrap()
}

#[test]
fn coastal_cell_loses_landward_neighbours() {
    let g = coast();
    let cell = g.cell(1, 1).unwrap();
    let nbs = g.neighbours(cell, 1);
    assert_eq!(nbs.len(), 5);
    for nb in nbs {
        let (_, col) = g.row_col(nb).unwrap();
        assert_ne!(col, 0);
    }
}

#[test]
fn habitability_is_zero_on_land_only() {
    let g = coast();
    for cell in g.canonical_ordering() {
        let h = g.habitability(cell);
        if g.is_water(cell) {
            assert!(h > 0.0, "water cell {cell} has habitability {h}");
        } else {
            assert_eq!(h, 0.0);
        }
    }
    assert_eq!(g.water_cells().len(), 9);
}

#[test]
fn works_through_trait_object() {
    let boxed: Box<dyn Space> = Box::new(coast());
    assert_eq!(boxed.cell_count(), 12);
    assert_eq!(boxed.neighbours(CellId(3), 1).len(), 3);
    let grid = boxed.downcast_ref::<MooreGrid>().unwrap();
    assert_eq!(grid.cols(), 4);
}
