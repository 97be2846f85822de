//! Core types and traits for foilmu attenuation runs.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: run and
//! track identifiers, region tags for energy bookkeeping, the planar
//! slab-stack geometry, physical constants, and the
//! [`CrossSectionSource`] seam through which the host transport toolkit
//! supplies per-process cross-sections.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod calculator;
pub mod error;
pub mod geometry;
pub mod id;
pub mod region;
pub mod units;

pub use calculator::{CrossSectionSource, GammaProcess};
pub use error::GeometryError;
pub use geometry::{Layer, MaterialSpec, SlabStack};
pub use id::{LayerIndex, RunId, TrackId};
pub use region::RegionTag;
