//! Per-run summary rows and their CSV persistence.
//!
//! Every completed run produces one [`SummaryRow`] holding the geometry,
//! the raw counts, every derived coefficient and every percent
//! deviation. Rows are appended to a cumulative CSV file whose column
//! order is fixed by [`COLUMNS`] and never changes between appends.
//!
//! # Architecture
//!
//! - [`SummaryWriter`] streams rows to any `Write` sink
//! - [`SummaryReader`] parses rows back from any `BufRead` source,
//!   validating the header first
//! - [`append_rows`] is the file-level entry point: it writes the header
//!   only when the file did not exist before the call
//!
//! # Format
//!
//! ```text
//! run_id,world_half_cm,thickness_nm,...,T_energy_tot
//! 0,5.0000000000e+00,2.5000000000e+02,...,9.9998765432e-01
//! ```
//!
//! `run_id` is a plain integer and `backing_material` is free text; every
//! other field is written in scientific notation with ten fractional
//! mantissa digits and a signed two-digit exponent.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod reader;
pub mod row;
pub mod writer;

pub use error::SummaryError;
pub use reader::{read_rows, SummaryReader};
pub use row::{ClampFlag, SummaryRow, COLUMNS};
pub use writer::{append_rows, SummaryWriter};
