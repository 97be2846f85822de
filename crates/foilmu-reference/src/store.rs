//! Lazy, load-once discovery of a reference table on disk.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use crate::error::ReferenceError;
use crate::table::{Interpolation, ReferenceTable, ReferenceValues};

/// Fixed relative paths tried after any configured path, in order.
pub const FALLBACK_CANDIDATES: [&str; 2] = ["nist_reference.csv", "../nist_reference.csv"];

/// Whether the store has a table to interpolate from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    /// No load has been attempted yet.
    NotAttempted,
    /// Every candidate was tried and none produced data.
    Absent,
    /// A table was loaded.
    Loaded,
}

#[derive(Debug)]
enum LoadState {
    Absent,
    Loaded {
        source: PathBuf,
        table: ReferenceTable,
    },
}

/// Owns the reference table for the lifetime of a run controller.
///
/// The first call to [`ensure_loaded`](Self::ensure_loaded) (directly or
/// through [`interpolate`](Self::interpolate)) walks the candidate list.
/// The outcome, success or failure, is cached and never retried.
#[derive(Debug)]
pub struct ReferenceStore {
    candidates: Vec<PathBuf>,
    interpolation: Interpolation,
    state: OnceCell<LoadState>,
}

impl ReferenceStore {
    /// Search `configured` (when given and non-empty) and then the
    /// [`FALLBACK_CANDIDATES`].
    pub fn new(configured: Option<&Path>, interpolation: Interpolation) -> Self {
        let mut candidates = Vec::with_capacity(FALLBACK_CANDIDATES.len() + 1);
        if let Some(path) = configured.filter(|p| !p.as_os_str().is_empty()) {
            candidates.push(path.to_path_buf());
        }
        candidates.extend(FALLBACK_CANDIDATES.iter().map(PathBuf::from));
        Self::with_candidates(candidates, interpolation)
    }

    /// Search exactly the given paths, in order.
    pub fn with_candidates(candidates: Vec<PathBuf>, interpolation: Interpolation) -> Self {
        Self {
            candidates,
            interpolation,
            state: OnceCell::new(),
        }
    }

    /// A store that already holds `table`. Nothing is read from disk.
    pub fn preloaded(
        source: impl Into<PathBuf>,
        table: ReferenceTable,
        interpolation: Interpolation,
    ) -> Self {
        let source = source.into();
        let state = OnceCell::new();
        let _ = state.set(if table.is_empty() {
            LoadState::Absent
        } else {
            LoadState::Loaded {
                source: source.clone(),
                table,
            }
        });
        Self {
            candidates: vec![source],
            interpolation,
            state,
        }
    }

    /// Load the table if that has not been attempted yet.
    ///
    /// Returns whether a table is available. Idempotent.
    pub fn ensure_loaded(&self) -> bool {
        matches!(
            self.state.get_or_init(|| self.discover()),
            LoadState::Loaded { .. }
        )
    }

    /// Interpolate at `energy_kev`, loading on first use.
    ///
    /// `None` when no table is available.
    pub fn interpolate(&self, energy_kev: f64) -> Option<ReferenceValues> {
        self.table()?.interpolate(energy_kev, self.interpolation)
    }

    /// Current load state. Never triggers a load.
    pub fn availability(&self) -> Availability {
        match self.state.get() {
            None => Availability::NotAttempted,
            Some(LoadState::Absent) => Availability::Absent,
            Some(LoadState::Loaded { .. }) => Availability::Loaded,
        }
    }

    /// Path of the table that was loaded, if any.
    pub fn source(&self) -> Option<&Path> {
        match self.state.get()? {
            LoadState::Loaded { source, .. } => Some(source),
            LoadState::Absent => None,
        }
    }

    /// The loaded table, loading on first use.
    pub fn table(&self) -> Option<&ReferenceTable> {
        match self.state.get_or_init(|| self.discover()) {
            LoadState::Loaded { table, .. } => Some(table),
            LoadState::Absent => None,
        }
    }

    /// Paths searched, in order.
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Interpolation mode used by [`interpolate`](Self::interpolate).
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    fn discover(&self) -> LoadState {
        for path in &self.candidates {
            match ReferenceTable::load(path) {
                Ok(table) => {
                    tracing::info!(
                        path = %path.display(),
                        rows = table.len(),
                        "loaded reference table"
                    );
                    return LoadState::Loaded {
                        source: path.clone(),
                        table,
                    };
                }
                Err(ReferenceError::Io { source, .. }) => {
                    tracing::debug!(path = %path.display(), %source, "reference candidate unreadable");
                }
                Err(err @ ReferenceError::NoRows { .. }) => {
                    tracing::warn!("{err}");
                }
            }
        }
        tracing::warn!(
            candidates = self.candidates.len(),
            "no reference table found; reference comparisons disabled"
        );
        LoadState::Absent
    }
}
