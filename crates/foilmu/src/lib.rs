//! foilmu: gamma-ray attenuation coefficients from thin-foil transport runs.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all foilmu sub-crates. A host transport toolkit drives a
//! [`RunController`](engine::RunController) from its run, event and
//! stepping callbacks; at each run end the controller derives one summary
//! row of attenuation and energy-absorption coefficients and appends it to
//! a CSV file.
//!
//! # Quick start
//!
//! ```rust
//! use foilmu::prelude::*;
//!
//! let config = EngineConfig {
//!     summary_path: std::env::temp_dir().join("foilmu-quickstart.csv"),
//!     ..EngineConfig::default()
//! };
//! let mut controller = RunController::new(config, SlabStack::tungsten_foil()).unwrap();
//!
//! controller.begin_run();
//! for i in 0..1000 {
//!     let mut event = controller.begin_event();
//!     event.inject_primary(1000.0);
//!     if i % 10 != 0 {
//!         // The primary leaves the foil untouched.
//!         event.route(&StepRecord {
//!             track_id: TrackId::PRIMARY,
//!             is_gamma: true,
//!             process: Some("Transportation"),
//!             pre: Volume::PRIMARY,
//!             post: Volume::World,
//!             on_boundary: true,
//!             direction_z: 1.0,
//!             kinetic_energy_kev: 1000.0,
//!             energy_deposit_kev: 0.0,
//!         });
//!     }
//! }
//! let derivation = controller.end_run().unwrap();
//! assert_eq!(derivation.row.n_uncollided, 900);
//! assert!(derivation.row.mu_counts_per_mm > 0.0);
//! controller.flush_summary().unwrap();
//! # std::fs::remove_file(&controller.config().summary_path).ok();
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `foilmu-core` | IDs, region tags, slab geometry, units, calculator trait |
//! | [`reference`] | `foilmu-reference` | Reference table parsing, interpolation and discovery |
//! | [`physics`] | `foilmu-physics` | Compton retention and calculator-derived coefficients |
//! | [`summary`] | `foilmu-summary` | Summary row schema and CSV persistence |
//! | [`engine`] | `foilmu-engine` | Accumulation, step routing, derivation, run control |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, geometry and constants (`foilmu-core`).
///
/// Contains run and track IDs, [`types::RegionTag`], the
/// [`types::SlabStack`] geometry, and the [`types::CrossSectionSource`]
/// trait implemented by host toolkits.
pub use foilmu_core as types;

/// Reference coefficient tables (`foilmu-reference`).
///
/// [`reference::ReferenceStore`] finds and lazily loads a table;
/// [`reference::ReferenceTable`] interpolates it.
pub use foilmu_reference as reference;

/// Physics estimators (`foilmu-physics`).
pub use foilmu_physics as physics;

/// Summary CSV schema and persistence (`foilmu-summary`).
///
/// Write rows with [`summary::append_rows`] or [`summary::SummaryWriter`],
/// read them back with [`summary::SummaryReader`].
pub use foilmu_summary as summary;

/// Run accumulation and coefficient derivation (`foilmu-engine`).
pub use foilmu_engine as engine;

/// Common imports for typical foilmu usage.
///
/// ```rust
/// use foilmu::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use foilmu_core::{
        CrossSectionSource, GammaProcess, Layer, LayerIndex, MaterialSpec, RegionTag, RunId,
        SlabStack, TrackId,
    };

    // Errors
    pub use foilmu_core::GeometryError;
    pub use foilmu_engine::ConfigError;
    pub use foilmu_reference::ReferenceError;
    pub use foilmu_summary::SummaryError;

    // Reference data
    pub use foilmu_reference::{Interpolation, ReferenceStore, ReferenceTable};

    // Physics
    pub use foilmu_physics::{CalculatedCoefficients, ComptonRetention};

    // Summary
    pub use foilmu_summary::{ClampFlag, SummaryRow};

    // Engine
    pub use foilmu_engine::{
        Advisory, DepositPolicy, Derivation, EngineConfig, EventScope, RunAccumulator,
        RunController, StepOutcome, StepRecord, Volume,
    };
}
