//! Space trait compliance test helpers.
//!
//! These functions verify that a Space implementation satisfies the
//! invariants the diffusion and allocation code rely on.

use crate::space::Space;
use indexmap::IndexSet;

/// Assert that `distance(a, a) == 0.0` for all cells.
pub fn assert_distance_reflexive(space: &dyn Space) {
    for cell in space.canonical_ordering() {
        let d = space.distance(cell, cell);
        assert!(d.abs() < f64::EPSILON, "distance({cell}, {cell}) = {d}, expected 0.0");
    }
}

/// Assert that `distance(a, b) == distance(b, a)` for all cell pairs.
pub fn assert_distance_symmetric(space: &dyn Space) {
    let cells = space.canonical_ordering();
    for &a in &cells {
        for &b in &cells {
            let dab = space.distance(a, b);
            let dba = space.distance(b, a);
            assert!(
                (dab - dba).abs() < f64::EPSILON,
                "distance({a}, {b}) = {dab} != distance({b}, {a}) = {dba}"
            );
        }
    }
}

/// Assert that `b in neighbours(a, r)` implies `a in neighbours(b, r)` for
/// water cells.
pub fn assert_neighbours_symmetric(space: &dyn Space, radius: u32) {
    for cell in space.water_cells() {
        for nb in space.neighbours(cell, radius) {
            assert!(
                space.neighbours(nb, radius).contains(&cell),
                "neighbour symmetry violated: {nb} in N({cell}) but {cell} not in N({nb})"
            );
        }
    }
}

/// Assert that neighbour lists hold no duplicates, no self and no land.
pub fn assert_neighbours_clean(space: &dyn Space, radius: u32) {
    for cell in space.canonical_ordering() {
        let nbs = space.neighbours(cell, radius);
        let unique: IndexSet<_> = nbs.iter().copied().collect();
        assert_eq!(unique.len(), nbs.len(), "duplicate neighbours of {cell}");
        assert!(!unique.contains(&cell), "{cell} is its own neighbour");
        for nb in nbs {
            assert!(space.is_water(nb), "land cell {nb} returned as neighbour");
        }
    }
}

/// Assert that `canonical_ordering` returns exactly `cell_count` unique
/// cells, identically on every call.
pub fn assert_canonical_ordering_complete(space: &dyn Space) {
    let ordering = space.canonical_ordering();
    assert_eq!(ordering, space.canonical_ordering(), "ordering is non-deterministic");
    assert_eq!(ordering.len(), space.cell_count());
    let unique: IndexSet<_> = ordering.iter().collect();
    assert_eq!(unique.len(), ordering.len(), "canonical ordering has duplicates");
}

/// Run every compliance check at the given neighbourhood radius.
pub fn run_full_compliance(space: &dyn Space, radius: u32) {
    assert_distance_reflexive(space);
    assert_distance_symmetric(space);
    assert_neighbours_symmetric(space, radius);
    assert_neighbours_clean(space, radius);
    assert_canonical_ordering_complete(space);
}
