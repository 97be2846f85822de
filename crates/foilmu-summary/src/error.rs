//! Error types for summary persistence.

use std::fmt;
use std::io;

/// Errors that can occur while writing or reading summary CSV.
#[derive(Debug)]
pub enum SummaryError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The first line does not match [`COLUMNS`](crate::COLUMNS).
    HeaderMismatch {
        /// The header line that was found.
        found: String,
    },
    /// A data row could not be parsed.
    MalformedRow {
        /// 1-based line number in the file.
        line: usize,
        /// Human-readable description of what went wrong.
        detail: String,
    },
}

impl fmt::Display for SummaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::HeaderMismatch { found } => {
                write!(f, "summary header does not match the expected columns: {found:?}")
            }
            Self::MalformedRow { line, detail } => {
                write!(f, "malformed summary row at line {line}: {detail}")
            }
        }
    }
}

impl std::error::Error for SummaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SummaryError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
