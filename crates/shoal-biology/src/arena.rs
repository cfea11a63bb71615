//! Double-buffered per-cell abundance storage.
//!
//! [`AbundanceArena`] keeps two copies of every registered cell's matrix.
//! The published copy is what the rest of the step reads; the staging
//! copy is where a spatial process writes. [`AbundanceArena::stage`]
//! hands out both at once so a process can read the frozen state of
//! every cell while it writes the next one, and
//! [`AbundanceArena::publish`] swaps the roles.
//!
//! ```text
//! published: IndexMap<CellId, StructuredAbundance>   read by everyone
//! staging:   Vec<StructuredAbundance>                same slot order
//! ```

use indexmap::IndexMap;
use shoal_core::{CellId, Meristics, StructuredAbundance};

/// Borrowed view used while a spatial process runs.
///
/// `published` is the frozen snapshot; `staging` starts as an exact copy
/// of it and receives every write. Slots line up: `staging[i]` belongs to
/// the cell at index `i` of `published`.
#[must_use]
pub struct StagingGuard<'a> {
    /// Frozen state at the start of the process.
    pub published: &'a IndexMap<CellId, StructuredAbundance>,
    /// Writable next state.
    pub staging: &'a mut [StructuredAbundance],
}

/// Ping-pong abundance buffers for one species.
#[derive(Clone, Debug, Default)]
pub struct AbundanceArena {
    published: IndexMap<CellId, StructuredAbundance>,
    staging: Vec<StructuredAbundance>,
    generation: u64,
}

impl AbundanceArena {
    /// An arena with no cells.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cell. Returns `false`, leaving the arena unchanged, if
    /// the cell is already present.
    pub fn insert(&mut self, cell: CellId, abundance: StructuredAbundance) -> bool {
        if self.published.contains_key(&cell) {
            return false;
        }
        self.staging.push(abundance.clone());
        self.published.insert(cell, abundance);
        true
    }

    /// Number of registered cells.
    pub fn len(&self) -> usize {
        self.published.len()
    }

    /// Whether no cell is registered.
    pub fn is_empty(&self) -> bool {
        self.published.is_empty()
    }

    /// Whether `cell` is registered.
    pub fn contains(&self, cell: CellId) -> bool {
        self.published.contains_key(&cell)
    }

    /// Slot index of `cell`, in registration order.
    pub fn slot(&self, cell: CellId) -> Option<usize> {
        self.published.get_index_of(&cell)
    }

    /// Published matrix of `cell`.
    pub fn get(&self, cell: CellId) -> Option<&StructuredAbundance> {
        self.published.get(&cell)
    }

    /// Mutable published matrix of `cell`, for non-spatial processes.
    pub fn get_mut(&mut self, cell: CellId) -> Option<&mut StructuredAbundance> {
        self.published.get_mut(&cell)
    }

    /// Registered cells in slot order.
    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.published.keys().copied()
    }

    /// Published matrices in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (CellId, &StructuredAbundance)> {
        self.published.iter().map(|(&cell, a)| (cell, a))
    }

    /// Mutable published matrices in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (CellId, &mut StructuredAbundance)> {
        self.published.iter_mut().map(|(&cell, a)| (cell, a))
    }

    /// Total count over every cell.
    pub fn total(&self) -> f64 {
        self.published.values().map(StructuredAbundance::total).sum()
    }

    /// Total biomass over every cell.
    pub fn biomass(&self, meristics: &Meristics) -> f64 {
        self.published.values().map(|a| a.biomass(meristics)).sum()
    }

    /// Number of completed publishes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reset staging to the published state and borrow both.
    pub fn stage(&mut self) -> StagingGuard<'_> {
        for (staged, published) in self.staging.iter_mut().zip(self.published.values()) {
            staged.clone_from(published);
        }
        StagingGuard {
            published: &self.published,
            staging: &mut self.staging,
        }
    }

    /// Make the staging buffer the published one.
    pub fn publish(&mut self) {
        for (published, staged) in self.published.values_mut().zip(self.staging.iter_mut()) {
            std::mem::swap(published, staged);
        }
        self.generation += 1;
    }
}
