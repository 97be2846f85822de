//! Test utilities and fixtures for foilmu development.
//!
//! Provides a configurable [`CrossSectionSource`] stand-in, a
//! self-cleaning [`ScratchDir`] for file-based tests, reference-CSV
//! writers, and a one-call tracing subscriber for test output.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use foilmu_core::{CrossSectionSource, GammaProcess};

/// Calculator returning fixed per-process cross-sections (1/mm).
///
/// Processes not configured return zero. When a material filter is set,
/// every other material returns zero too.
#[derive(Clone, Debug, Default)]
pub struct ConstantCrossSections {
    values: [f64; 5],
    material: Option<String>,
}

impl ConstantCrossSections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cross-section for one process.
    pub fn with(mut self, process: GammaProcess, per_mm: f64) -> Self {
        self.values[slot(process)] = per_mm;
        self
    }

    /// Only answer for `material`.
    pub fn for_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// Sum over all processes.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

impl CrossSectionSource for ConstantCrossSections {
    fn cross_section_per_volume(
        &self,
        _energy_kev: f64,
        process: GammaProcess,
        material: &str,
    ) -> f64 {
        match &self.material {
            Some(m) if m != material => 0.0,
            _ => self.values[slot(process)],
        }
    }
}

fn slot(process: GammaProcess) -> usize {
    match process {
        GammaProcess::Photoelectric => 0,
        GammaProcess::Compton => 1,
        GammaProcess::Rayleigh => 2,
        GammaProcess::PairNuclear => 3,
        GammaProcess::PairElectron => 4,
    }
}

// ── Scratch files ──────────────────────────────────────────────────

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A uniquely named temporary directory, removed on drop.
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create a fresh directory under the system temp dir.
    ///
    /// Panics if the directory cannot be created.
    pub fn new(label: &str) -> Self {
        let n = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "foilmu-{label}-{}-{n}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("create scratch dir");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the directory (not created).
    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Header line written by [`write_reference_csv`].
pub const REFERENCE_HEADER: &str = "energy_keV,mu_cm2_g,mu_en_cm2_g";

/// Write a reference table of `(energy_keV, mu_cm2_g, mu_en_cm2_g)` rows.
pub fn write_reference_csv(path: &Path, rows: &[(f64, f64, f64)]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    writeln!(file, "{REFERENCE_HEADER}")?;
    for (e, mu, mu_en) in rows {
        writeln!(file, "{e},{mu},{mu_en}")?;
    }
    Ok(())
}

/// Tungsten values around 1 MeV, for tests that need a realistic table.
pub const TUNGSTEN_REFERENCE: [(f64, f64, f64); 4] = [
    (500.0, 0.1378, 0.08156),
    (800.0, 0.08457, 0.04829),
    (1000.0, 0.06618, 0.03787),
    (1250.0, 0.05656, 0.03247),
];

/// Install a test-friendly `fmt` subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
