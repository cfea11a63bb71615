//! Shoal: age and size-structured fish population dynamics on spatial grids.
//!
//! This is the top-level facade crate that re-exports the public API of the
//! Shoal sub-crates. For most users, adding `shoal` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use shoal::prelude::*;
//!
//! // A 2×2 grid of kelp beds, half full, growing logistically.
//! let grid = MooreGrid::new(2, 2, EdgeBehavior::Absorb).unwrap();
//! let mut world = BiologyWorld::new(Box::new(grid), EngineConfig::default()).unwrap();
//! let meristics = MeristicsBuilder::new(1, 1).build().unwrap();
//! let kelp = world
//!     .add_biomass_species("kelp", meristics, LogisticGrowth::new(0.5).unwrap())
//!     .unwrap();
//! world
//!     .populate(|_| {
//!         LocalBiology::Biomass([(kelp, BiomassPool::new(50.0, 100.0))].into_iter().collect())
//!     })
//!     .unwrap();
//!
//! for _ in 0..365 {
//!     world.step().unwrap();
//! }
//! assert_eq!(world.biomass_series(kelp), Some(&[250.0][..]));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `shoal-core` | IDs, meristics, species registry, abundance matrices, clock |
//! | [`space`] | `shoal-space` | The `Space` trait and the Moore grid |
//! | [`biology`] | `shoal-biology` | Mortality, aging, growth, recruitment, diffusion, allocators |
//! | [`engine`] | `shoal-engine` | Process configuration, orchestration, resets, `BiologyWorld` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and IDs (`shoal-core`).
///
/// Contains [`types::Meristics`], [`types::SpeciesRegistry`],
/// [`types::StructuredAbundance`] and the [`types::SimClock`].
pub use shoal_core as types;

/// Spatial backends (`shoal-space`).
///
/// Provides the [`space::Space`] trait and the [`space::MooreGrid`]
/// backend with land cells and habitability.
pub use shoal_space as space;

/// Natural processes (`shoal-biology`).
///
/// Each process works on one species in one or more cells:
/// [`biology::NaturalMortality`], [`biology::Aging`],
/// [`biology::Recruitment`], [`biology::Diffuser`] and
/// [`biology::Allocator`] among them.
pub use shoal_biology as biology;

/// Orchestration (`shoal-engine`).
///
/// [`engine::BiologyWorld`] steps every species through one simulated day
/// at a time.
pub use shoal_engine as engine;

/// Common imports for typical Shoal usage.
///
/// ```rust
/// use shoal::prelude::*;
/// ```
///
/// This imports the world and its configuration, the core value types, the
/// grid, and the process variants most configurations name.
pub mod prelude {
    // Core types
    pub use shoal_core::{
        BiomassPool, CellId, LocalBiology, Meristics, MeristicsBuilder, SimClock, SpeciesId,
        StockAssessmentInput, StructuredAbundance, FEMALE, MALE,
    };

    // Space
    pub use shoal_space::{EdgeBehavior, MooreGrid, Space};

    // Processes
    pub use shoal_biology::{
        Allocator, Diffuser, LogisticGrowth, LognormalNoise, NaturalMortality, RecruitmentKind,
        Rounding,
    };

    // Engine
    pub use shoal_engine::{
        AgingSpec, BiologyWorld, EngineConfig, RecruitmentScope, RecruitmentSpec,
        SpeciesProcessesConfig, StepError, StepMetrics,
    };
}
