//! Error types for reference-table loading.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that can occur while loading a reference table from disk.
///
/// [`ReferenceStore`](crate::ReferenceStore) swallows these and moves on
/// to the next candidate; they surface only through
/// [`ReferenceTable::load`](crate::ReferenceTable::load).
#[derive(Debug)]
pub enum ReferenceError {
    /// The file could not be opened or read.
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// The file was readable but yielded no valid data rows.
    NoRows {
        /// The path that was read.
        path: PathBuf,
    },
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read reference table {}: {source}", path.display())
            }
            Self::NoRows { path } => {
                write!(f, "reference table {} contained no data", path.display())
            }
        }
    }
}

impl std::error::Error for ReferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::NoRows { .. } => None,
        }
    }
}
