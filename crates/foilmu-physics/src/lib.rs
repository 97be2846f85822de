//! Closed-form physics used to cross-check measured attenuation.
//!
//! - [`ComptonRetention`] integrates the Klein–Nishina cross-section to
//!   find what fraction of a photon's energy survives a Compton scatter
//! - [`pair_energy_fraction`] gives the share of photon energy that pair
//!   production hands to the charged pair
//! - [`CalculatedCoefficients`] combines both with per-process
//!   cross-sections from a [`CrossSectionSource`](foilmu_core::CrossSectionSource)
//!   into a total μ and an energy-transfer μ_tr

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod coefficients;
pub mod compton;

pub use coefficients::{pair_energy_fraction, CalculatedCoefficients};
pub use compton::ComptonRetention;
