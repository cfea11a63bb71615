//! Species identity and the process-wide registry.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::RegistryError;
use crate::id::SpeciesId;
use crate::meristics::Meristics;

/// An immutable species: its name plus a shared handle to its meristics.
///
/// Cloning a `Species` clones the handle, never the parameter arrays.
#[derive(Clone, Debug)]
pub struct Species {
    id: SpeciesId,
    name: String,
    meristics: Arc<Meristics>,
}

impl Species {
    /// Registry-assigned identifier.
    pub fn id(&self) -> SpeciesId {
        self.id
    }

    /// Human-readable name, unique within the registry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Biological parameters.
    pub fn meristics(&self) -> &Meristics {
        &self.meristics
    }

    /// Shared handle to the biological parameters.
    pub fn meristics_arc(&self) -> Arc<Meristics> {
        Arc::clone(&self.meristics)
    }
}

/// Ordered set of species, built once at scenario setup.
///
/// Iteration order is registration order, which is also the order in
/// which the engine steps species each tick.
#[derive(Clone, Debug, Default)]
pub struct SpeciesRegistry {
    species: IndexMap<String, Species>,
}

impl SpeciesRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a species and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if the name is taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        meristics: Meristics,
    ) -> Result<SpeciesId, RegistryError> {
        let name = name.into();
        if self.species.contains_key(&name) {
            return Err(RegistryError::DuplicateName { name });
        }
        let id = SpeciesId(self.species.len() as u32);
        self.species.insert(
            name.clone(),
            Species {
                id,
                name,
                meristics: Arc::new(meristics),
            },
        );
        Ok(id)
    }

    /// Look up a species by id.
    pub fn get(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get_index(id.0 as usize).map(|(_, s)| s)
    }

    /// Look up a species by name.
    pub fn by_name(&self, name: &str) -> Option<&Species> {
        self.species.get(name)
    }

    /// Species in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Species> {
        self.species.values()
    }

    /// Number of registered species.
    pub fn len(&self) -> usize {
        self.species.len()
    }

    /// Whether no species is registered.
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}
