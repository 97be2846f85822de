//! Reference attenuation tables for cross-checking measured coefficients.
//!
//! A reference table is a small CSV of `(energy_keV, mu_cm2_g, mu_en_cm2_g)`
//! triples, typically transcribed from a published compilation for the
//! foil material. The workspace uses it to report how far the
//! counts-derived μ/ρ and μ_en/ρ are from accepted values, and to scale
//! μ into a charged-particle-equilibrium estimate of μ_en.
//!
//! # Architecture
//!
//! - [`ReferenceTable`] parses and interpolates a table held in memory
//! - [`ReferenceStore`] discovers a table on disk from an ordered list of
//!   candidate paths, loads it at most once, and remembers whether any
//!   candidate produced data
//!
//! Missing or unreadable tables are never fatal: the store reports
//! [`Availability::Absent`] and interpolation returns `None`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod store;
pub mod table;

pub use error::ReferenceError;
pub use store::{Availability, ReferenceStore, FALLBACK_CANDIDATES};
pub use table::{Interpolation, ReferenceRow, ReferenceTable, ReferenceValues};
