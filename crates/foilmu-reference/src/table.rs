//! In-memory reference table: parsing and interpolation.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::ReferenceError;

/// One row of a reference table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceRow {
    /// Photon energy, in keV.
    pub energy_kev: f64,
    /// Mass attenuation coefficient μ/ρ, in cm²/g.
    pub mu_cm2_g: f64,
    /// Mass energy-absorption coefficient μ_en/ρ, in cm²/g.
    pub mu_en_cm2_g: f64,
}

/// Interpolated reference coefficients at a query energy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceValues {
    /// μ/ρ, in cm²/g.
    pub mu_cm2_g: f64,
    /// μ_en/ρ, in cm²/g.
    pub mu_en_cm2_g: f64,
}

impl ReferenceValues {
    /// The μ_en/μ ratio, when both coefficients are strictly positive.
    pub fn absorption_ratio(&self) -> Option<f64> {
        (self.mu_cm2_g > 0.0 && self.mu_en_cm2_g > 0.0).then(|| self.mu_en_cm2_g / self.mu_cm2_g)
    }
}

impl From<ReferenceRow> for ReferenceValues {
    fn from(row: ReferenceRow) -> Self {
        Self {
            mu_cm2_g: row.mu_cm2_g,
            mu_en_cm2_g: row.mu_en_cm2_g,
        }
    }
}

/// How values between two table rows are estimated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// Straight line in (E, μ) space.
    #[default]
    Linear,
    /// Straight line in (ln E, ln μ) space.
    ///
    /// Falls back to [`Linear`](Self::Linear) for any bracket where a
    /// coefficient or energy is not strictly positive.
    LogLog,
}

/// A reference table sorted by ascending energy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceTable {
    rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    /// Build a table from rows in any order.
    pub fn from_rows(mut rows: Vec<ReferenceRow>) -> Self {
        rows.sort_by(|a, b| a.energy_kev.total_cmp(&b.energy_kev));
        Self { rows }
    }

    /// Parse CSV text.
    ///
    /// The first line is a header and is always skipped. Blank lines and
    /// lines starting with `#` are ignored. A data row needs at least
    /// three comma-separated numeric fields; a row with any field that
    /// fails to parse is dropped on its own. The result may be empty.
    pub fn parse<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut rows = Vec::new();
        let mut dropped = 0usize;
        for line in reader.lines().skip(1) {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_row(line) {
                Some(row) => rows.push(row),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            tracing::debug!(dropped, kept = rows.len(), "dropped malformed reference rows");
        }
        Ok(Self::from_rows(rows))
    }

    /// Read and parse a table file, requiring at least one valid row.
    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        let file = File::open(path).map_err(|source| ReferenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(BufReader::new(file)).map_err(|source| ReferenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if table.is_empty() {
            return Err(ReferenceError::NoRows {
                path: path.to_path_buf(),
            });
        }
        Ok(table)
    }

    /// Rows in ascending energy order.
    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Estimate coefficients at `energy_kev`.
    ///
    /// Energies at or beyond either end of the table clamp to the end
    /// row. An energy equal to a row's energy returns that row exactly.
    /// Returns `None` only for an empty table.
    pub fn interpolate(&self, energy_kev: f64, mode: Interpolation) -> Option<ReferenceValues> {
        let first = self.rows.first()?;
        let last = self.rows.last()?;
        if energy_kev <= first.energy_kev {
            return Some((*first).into());
        }
        if energy_kev >= last.energy_kev {
            return Some((*last).into());
        }

        // First row with energy >= query. Never 0 here: the query is
        // strictly above the first energy.
        let hi = self.rows.partition_point(|r| r.energy_kev < energy_kev);
        let upper = self.rows[hi];
        if upper.energy_kev == energy_kev {
            return Some(upper.into());
        }
        let lower = self.rows[hi - 1];

        let log_ok = mode == Interpolation::LogLog
            && lower.energy_kev > 0.0
            && lower.mu_cm2_g > 0.0
            && upper.mu_cm2_g > 0.0
            && lower.mu_en_cm2_g > 0.0
            && upper.mu_en_cm2_g > 0.0;

        let values = if log_ok {
            let t = (energy_kev.ln() - lower.energy_kev.ln())
                / (upper.energy_kev.ln() - lower.energy_kev.ln());
            ReferenceValues {
                mu_cm2_g: log_lerp(lower.mu_cm2_g, upper.mu_cm2_g, t),
                mu_en_cm2_g: log_lerp(lower.mu_en_cm2_g, upper.mu_en_cm2_g, t),
            }
        } else {
            let t = (energy_kev - lower.energy_kev) / (upper.energy_kev - lower.energy_kev);
            ReferenceValues {
                mu_cm2_g: lerp(lower.mu_cm2_g, upper.mu_cm2_g, t),
                mu_en_cm2_g: lerp(lower.mu_en_cm2_g, upper.mu_en_cm2_g, t),
            }
        };
        Some(values)
    }
}

fn parse_row(line: &str) -> Option<ReferenceRow> {
    let mut fields = Vec::with_capacity(3);
    for field in line.split(',') {
        fields.push(field.trim().parse::<f64>().ok()?);
    }
    match fields[..] {
        [energy_kev, mu_cm2_g, mu_en_cm2_g, ..] => Some(ReferenceRow {
            energy_kev,
            mu_cm2_g,
            mu_en_cm2_g,
        }),
        _ => None,
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn log_lerp(a: f64, b: f64, t: f64) -> f64 {
    (a.ln() + (b.ln() - a.ln()) * t).exp()
}
