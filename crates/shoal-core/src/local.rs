//! Per-cell biological payload.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::abundance::StructuredAbundance;
use crate::id::SpeciesId;
use crate::meristics::Meristics;

/// Scalar stock of one species in one cell, used by the biomass-only mode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomassPool {
    /// Current biomass.
    pub biomass: f64,
    /// Carrying capacity `K`; the pool never grows above it.
    pub carrying_capacity: f64,
}

impl BiomassPool {
    /// A pool holding `biomass` out of `carrying_capacity`.
    ///
    /// Negative or non-finite inputs are treated as zero and the biomass is
    /// capped at the capacity.
    pub fn new(biomass: f64, carrying_capacity: f64) -> Self {
        let carrying_capacity = sanitize(carrying_capacity);
        Self {
            biomass: sanitize(biomass).min(carrying_capacity),
            carrying_capacity,
        }
    }

    /// Remove up to `amount`, returning the shortfall.
    pub fn remove(&mut self, amount: f64) -> f64 {
        let amount = sanitize(amount);
        let taken = amount.min(self.biomass);
        self.biomass -= taken;
        amount - taken
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// What one cell holds.
///
/// A cell carries either structured abundances (one matrix per species
/// present) or, in the biomass-only mode, one [`BiomassPool`] per species.
/// Cells that hold nothing, such as land, are [`LocalBiology::Empty`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum LocalBiology {
    /// No fish.
    #[default]
    Empty,
    /// Age/size-structured counts per species.
    Abundance(IndexMap<SpeciesId, StructuredAbundance>),
    /// Scalar biomass per species.
    Biomass(IndexMap<SpeciesId, BiomassPool>),
}

impl LocalBiology {
    /// Biomass of one species here.
    ///
    /// Abundance-mode cells need the species' meristics to weigh their
    /// counts; species absent from the cell weigh zero.
    pub fn biomass(&self, species: SpeciesId, meristics: &Meristics) -> f64 {
        match self {
            Self::Empty => 0.0,
            Self::Abundance(map) => map.get(&species).map_or(0.0, |a| a.biomass(meristics)),
            Self::Biomass(map) => map.get(&species).map_or(0.0, |p| p.biomass),
        }
    }

    /// Species present in the cell, in insertion order.
    pub fn species(&self) -> Vec<SpeciesId> {
        match self {
            Self::Empty => Vec::new(),
            Self::Abundance(map) => map.keys().copied().collect(),
            Self::Biomass(map) => map.keys().copied().collect(),
        }
    }
}
