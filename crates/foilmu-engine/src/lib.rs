//! Run-level aggregation and attenuation-coefficient derivation.
//!
//! The host transport toolkit drives everything. During a run its
//! stepping callback hands each step to a [`StepRouter`], which feeds a
//! [`RunAccumulator`]. At run end, [`derive_run`] turns the accumulated
//! counts and energies into a [`SummaryRow`](foilmu_summary::SummaryRow)
//! of coefficients, uncertainties and deviations from the calculator and
//! reference data.
//!
//! [`RunController`] ties these together with the configuration, the
//! reference store and the summary file, and is what most hosts use.
//!
//! Nothing in this crate returns a hard error for bad physics data.
//! Degenerate inputs degrade to zero-valued results plus an
//! [`Advisory`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod accumulator;
pub mod config;
pub mod controller;
pub mod derive;
pub mod tracking;

pub use accumulator::RunAccumulator;
pub use config::{ConfigError, EngineConfig};
pub use controller::{EventScope, RunController};
pub use derive::{derive_run, Advisory, Derivation, DerivationContext, RunParameters};
pub use tracking::{
    DepositPolicy, StepOutcome, StepRecord, StepRouter, TrackLedger, Volume, TRANSPORT_PROCESS,
};
