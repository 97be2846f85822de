//! The summary row and its fixed column schema.

use std::fmt;
use std::io::{self, Write};

use foilmu_core::RunId;

/// Column names, in file order.
pub const COLUMNS: [&str; 50] = [
    "run_id",
    "world_half_cm",
    "thickness_nm",
    "backing_thickness_um",
    "backing_material",
    "density_g_cm3",
    "E_keV",
    "N_injected",
    "N_uncollided",
    "N_scattered",
    "N_trans_total",
    "T_counts",
    "T_counts_scattered",
    "T_counts_clamped",
    "clamp_flag",
    "mu_counts_per_mm",
    "mu_counts_cm2_g",
    "mu_calc_per_mm",
    "mu_calc_cm2_g",
    "mu_tr_per_mm",
    "mu_tr_cm2_g",
    "mu_ref_cm2_g",
    "mu_en_ref_cm2_g",
    "delta_mu_percent",
    "delta_mu_en_percent",
    "sigma_T_counts",
    "sigma_mu_counts_cm2_g",
    "mu_en_cpe_per_mm",
    "mu_en_cpe_cm2_g",
    "delta_mu_en_cpe_percent",
    "delta_mu_counts_vs_mu_calc_percent",
    "delta_mu_en_cpe_vs_mu_tr_percent",
    "absorbed_fraction",
    "absorbed_fraction_slab",
    "mu_en_per_mm",
    "mu_en_cm2_g",
    "mu_en_raw_per_mm",
    "mu_en_raw_cm2_g",
    "mu_en_raw_slab_per_mm",
    "mu_en_raw_slab_cm2_g",
    "mu_eff_per_mm",
    "mu_eff_cm2_g",
    "E_trans_unc_keV",
    "E_trans_tot_keV",
    "E_abs_keV",
    "E_abs_backing_keV",
    "E_abs_slab_keV",
    "E_abs_other_keV",
    "T_energy_unc",
    "T_energy_tot",
];

/// Which side of the logarithm-safe range the transmission fell on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClampFlag {
    /// Strictly inside `(1e-9, 1 − 1e-9)`.
    #[default]
    Unclamped,
    /// At or below the lower bound.
    Low,
    /// At or above the upper bound.
    High,
}

impl ClampFlag {
    /// Numeric code written to the summary: 0, 1 or 2.
    pub fn code(self) -> u8 {
        match self {
            Self::Unclamped => 0,
            Self::Low => 1,
            Self::High => 2,
        }
    }

    /// Inverse of [`code`](Self::code).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Unclamped),
            1 => Some(Self::Low),
            2 => Some(Self::High),
            _ => None,
        }
    }
}

/// Everything recorded about one completed run.
///
/// Field order matches [`COLUMNS`]. Lengths are in the units named by
/// the field; linear coefficients are 1/mm, mass coefficients cm²/g,
/// energies keV.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SummaryRow {
    pub run_id: RunId,
    pub world_half_cm: f64,
    pub thickness_nm: f64,
    pub backing_thickness_um: f64,
    /// Backing material names joined with `+`; empty for a bare foil.
    pub backing_material: String,
    /// Primary absorber density. Zero when unknown.
    pub density_g_cm3: f64,
    /// Mean primary energy.
    pub energy_kev: f64,
    pub n_injected: u64,
    pub n_uncollided: u64,
    pub n_scattered: u64,
    pub n_trans_total: u64,
    /// Uncollided transmission fraction, unclamped.
    pub t_counts: f64,
    pub t_counts_scattered: f64,
    pub t_counts_clamped: f64,
    pub clamp_flag: ClampFlag,
    pub mu_counts_per_mm: f64,
    pub mu_counts_cm2_g: f64,
    pub mu_calc_per_mm: f64,
    pub mu_calc_cm2_g: f64,
    pub mu_tr_per_mm: f64,
    pub mu_tr_cm2_g: f64,
    pub mu_ref_cm2_g: f64,
    pub mu_en_ref_cm2_g: f64,
    pub delta_mu_percent: f64,
    pub delta_mu_en_percent: f64,
    pub sigma_t_counts: f64,
    pub sigma_mu_counts_cm2_g: f64,
    pub mu_en_cpe_per_mm: f64,
    pub mu_en_cpe_cm2_g: f64,
    pub delta_mu_en_cpe_percent: f64,
    pub delta_mu_counts_vs_mu_calc_percent: f64,
    pub delta_mu_en_cpe_vs_mu_tr_percent: f64,
    pub absorbed_fraction: f64,
    pub absorbed_fraction_slab: f64,
    /// Best μ_en estimate; same value as the CPE columns.
    pub mu_en_per_mm: f64,
    pub mu_en_cm2_g: f64,
    pub mu_en_raw_per_mm: f64,
    pub mu_en_raw_cm2_g: f64,
    pub mu_en_raw_slab_per_mm: f64,
    pub mu_en_raw_slab_cm2_g: f64,
    pub mu_eff_per_mm: f64,
    pub mu_eff_cm2_g: f64,
    pub e_trans_unc_kev: f64,
    pub e_trans_tot_kev: f64,
    pub e_abs_kev: f64,
    pub e_abs_backing_kev: f64,
    pub e_abs_slab_kev: f64,
    pub e_abs_other_kev: f64,
    pub t_energy_unc: f64,
    pub t_energy_tot: f64,
}

/// Write the header line.
pub(crate) fn write_header<W: Write>(w: &mut W) -> io::Result<()> {
    writeln!(w, "{}", COLUMNS.join(","))
}

/// Scientific notation with ten fractional mantissa digits and a signed
/// exponent of at least two digits (`2.5000000000e+02`), preceded by the
/// field separator.
struct Sci(f64);

impl fmt::Display for Sci {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plain = format!("{:.10e}", self.0);
        let Some((mantissa, exp)) = plain.split_once('e') else {
            // inf and NaN carry no exponent.
            return write!(f, ",{plain}");
        };
        let exp: i32 = exp.parse().map_err(|_| fmt::Error)?;
        let sign = if exp < 0 { '-' } else { '+' };
        write!(f, ",{mantissa}e{sign}{:02}", exp.unsigned_abs())
    }
}

impl SummaryRow {
    /// Write this row as one CSV line, newline included.
    pub fn write_csv<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let material: String = self
            .backing_material
            .chars()
            .map(|c| if matches!(c, ',' | '\n' | '\r') { '_' } else { c })
            .collect();

        write!(
            w,
            "{}{}{}{},{}",
            self.run_id.0,
            Sci(self.world_half_cm),
            Sci(self.thickness_nm),
            Sci(self.backing_thickness_um),
            material,
        )?;
        for v in self.numeric_tail() {
            write!(w, "{}", Sci(v))?;
        }
        writeln!(w)
    }

    /// Columns after `backing_material`, in order.
    fn numeric_tail(&self) -> [f64; 45] {
        [
            self.density_g_cm3,
            self.energy_kev,
            self.n_injected as f64,
            self.n_uncollided as f64,
            self.n_scattered as f64,
            self.n_trans_total as f64,
            self.t_counts,
            self.t_counts_scattered,
            self.t_counts_clamped,
            f64::from(self.clamp_flag.code()),
            self.mu_counts_per_mm,
            self.mu_counts_cm2_g,
            self.mu_calc_per_mm,
            self.mu_calc_cm2_g,
            self.mu_tr_per_mm,
            self.mu_tr_cm2_g,
            self.mu_ref_cm2_g,
            self.mu_en_ref_cm2_g,
            self.delta_mu_percent,
            self.delta_mu_en_percent,
            self.sigma_t_counts,
            self.sigma_mu_counts_cm2_g,
            self.mu_en_cpe_per_mm,
            self.mu_en_cpe_cm2_g,
            self.delta_mu_en_cpe_percent,
            self.delta_mu_counts_vs_mu_calc_percent,
            self.delta_mu_en_cpe_vs_mu_tr_percent,
            self.absorbed_fraction,
            self.absorbed_fraction_slab,
            self.mu_en_per_mm,
            self.mu_en_cm2_g,
            self.mu_en_raw_per_mm,
            self.mu_en_raw_cm2_g,
            self.mu_en_raw_slab_per_mm,
            self.mu_en_raw_slab_cm2_g,
            self.mu_eff_per_mm,
            self.mu_eff_cm2_g,
            self.e_trans_unc_kev,
            self.e_trans_tot_kev,
            self.e_abs_kev,
            self.e_abs_backing_kev,
            self.e_abs_slab_kev,
            self.e_abs_other_kev,
            self.t_energy_unc,
            self.t_energy_tot,
        ]
    }

    /// Parse one CSV line (without its newline).
    pub fn parse_csv(line: &str) -> Result<Self, String> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != COLUMNS.len() {
            return Err(format!(
                "expected {} fields, found {}",
                COLUMNS.len(),
                fields.len()
            ));
        }
        let mut cur = Fields {
            fields: &fields,
            pos: 0,
        };
        let run_id = cur.field()?;
        let run_id = run_id
            .parse::<u32>()
            .map_err(|e| format!("run_id {run_id:?}: {e}"))?;
        Ok(Self {
            run_id: RunId(run_id),
            world_half_cm: cur.num()?,
            thickness_nm: cur.num()?,
            backing_thickness_um: cur.num()?,
            backing_material: cur.field()?.to_string(),
            density_g_cm3: cur.num()?,
            energy_kev: cur.num()?,
            n_injected: cur.count()?,
            n_uncollided: cur.count()?,
            n_scattered: cur.count()?,
            n_trans_total: cur.count()?,
            t_counts: cur.num()?,
            t_counts_scattered: cur.num()?,
            t_counts_clamped: cur.num()?,
            clamp_flag: cur.clamp_flag()?,
            mu_counts_per_mm: cur.num()?,
            mu_counts_cm2_g: cur.num()?,
            mu_calc_per_mm: cur.num()?,
            mu_calc_cm2_g: cur.num()?,
            mu_tr_per_mm: cur.num()?,
            mu_tr_cm2_g: cur.num()?,
            mu_ref_cm2_g: cur.num()?,
            mu_en_ref_cm2_g: cur.num()?,
            delta_mu_percent: cur.num()?,
            delta_mu_en_percent: cur.num()?,
            sigma_t_counts: cur.num()?,
            sigma_mu_counts_cm2_g: cur.num()?,
            mu_en_cpe_per_mm: cur.num()?,
            mu_en_cpe_cm2_g: cur.num()?,
            delta_mu_en_cpe_percent: cur.num()?,
            delta_mu_counts_vs_mu_calc_percent: cur.num()?,
            delta_mu_en_cpe_vs_mu_tr_percent: cur.num()?,
            absorbed_fraction: cur.num()?,
            absorbed_fraction_slab: cur.num()?,
            mu_en_per_mm: cur.num()?,
            mu_en_cm2_g: cur.num()?,
            mu_en_raw_per_mm: cur.num()?,
            mu_en_raw_cm2_g: cur.num()?,
            mu_en_raw_slab_per_mm: cur.num()?,
            mu_en_raw_slab_cm2_g: cur.num()?,
            mu_eff_per_mm: cur.num()?,
            mu_eff_cm2_g: cur.num()?,
            e_trans_unc_kev: cur.num()?,
            e_trans_tot_kev: cur.num()?,
            e_abs_kev: cur.num()?,
            e_abs_backing_kev: cur.num()?,
            e_abs_slab_kev: cur.num()?,
            e_abs_other_kev: cur.num()?,
            t_energy_unc: cur.num()?,
            t_energy_tot: cur.num()?,
        })
    }
}

struct Fields<'a> {
    fields: &'a [&'a str],
    pos: usize,
}

impl<'a> Fields<'a> {
    fn field(&mut self) -> Result<&'a str, String> {
        let f = self
            .fields
            .get(self.pos)
            .copied()
            .ok_or_else(|| format!("missing column {}", COLUMNS[self.pos.min(COLUMNS.len() - 1)]))?;
        self.pos += 1;
        Ok(f.trim())
    }

    fn num(&mut self) -> Result<f64, String> {
        let column = COLUMNS[self.pos.min(COLUMNS.len() - 1)];
        let raw = self.field()?;
        raw.parse::<f64>()
            .map_err(|e| format!("{column} {raw:?}: {e}"))
    }

    fn count(&mut self) -> Result<u64, String> {
        let column = COLUMNS[self.pos.min(COLUMNS.len() - 1)];
        let v = self.num()?;
        if !(v >= 0.0 && v.is_finite()) {
            return Err(format!("{column} is not a count: {v}"));
        }
        Ok(v.round() as u64)
    }

    fn clamp_flag(&mut self) -> Result<ClampFlag, String> {
        let v = self.num()?;
        let code = v.round();
        if !(0.0..=2.0).contains(&code) {
            return Err(format!("clamp_flag out of range: {v}"));
        }
        ClampFlag::from_code(code as u8).ok_or_else(|| format!("clamp_flag out of range: {v}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SummaryRow {
        SummaryRow {
            run_id: RunId(7),
            world_half_cm: 5.0,
            thickness_nm: 250.0,
            backing_material: "G4_Al".into(),
            density_g_cm3: 19.3,
            energy_kev: 1000.0,
            n_injected: 100_000,
            n_uncollided: 99_500,
            t_counts: 0.995,
            clamp_flag: ClampFlag::High,
            mu_counts_per_mm: 20.050_125_418_4,
            delta_mu_percent: -3.25,
            ..SummaryRow::default()
        }
    }

    #[test]
    fn header_has_fifty_unique_columns() {
        let mut sorted = COLUMNS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 50);
        assert_eq!(COLUMNS[0], "run_id");
        assert_eq!(COLUMNS[49], "T_energy_tot");
    }

    #[test]
    fn line_format() {
        let mut buf = Vec::new();
        sample().write_csv(&mut buf).unwrap();
        let line = String::from_utf8(buf).unwrap();
        assert!(line.starts_with(
            "7,5.0000000000e+00,2.5000000000e+02,0.0000000000e+00,G4_Al,1.9300000000e+01,"
        ));
        assert!(line.ends_with('\n'));
        assert_eq!(line.trim_end().split(',').count(), 50);
    }

    #[test]
    fn exponent_is_signed_and_padded() {
        assert_eq!(Sci(250.0).to_string(), ",2.5000000000e+02");
        assert_eq!(Sci(0.001).to_string(), ",1.0000000000e-03");
        assert_eq!(Sci(0.0).to_string(), ",0.0000000000e+00");
        assert_eq!(Sci(-1.5e-120).to_string(), ",-1.5000000000e-120");
        assert_eq!(Sci(f64::INFINITY).to_string(), ",inf");
    }

    #[test]
    fn parse_inverts_write() {
        let row = sample();
        let mut buf = Vec::new();
        row.write_csv(&mut buf).unwrap();
        let line = String::from_utf8(buf).unwrap();
        let back = SummaryRow::parse_csv(line.trim_end()).unwrap();
        assert_eq!(back.run_id, row.run_id);
        assert_eq!(back.backing_material, "G4_Al");
        assert_eq!(back.n_injected, 100_000);
        assert_eq!(back.clamp_flag, ClampFlag::High);
        assert!((back.mu_counts_per_mm - row.mu_counts_per_mm).abs() < 1e-9);
        assert_eq!(back.delta_mu_percent, -3.25);
    }

    #[test]
    fn material_separators_are_replaced() {
        let row = SummaryRow {
            backing_material: "a,b\nc".into(),
            ..SummaryRow::default()
        };
        let mut buf = Vec::new();
        row.write_csv(&mut buf).unwrap();
        let line = String::from_utf8(buf).unwrap();
        let back = SummaryRow::parse_csv(line.trim_end()).unwrap();
        assert_eq!(back.backing_material, "a_b_c");
    }

    #[test]
    fn short_line_is_rejected() {
        let err = SummaryRow::parse_csv("1,2,3").unwrap_err();
        assert!(err.contains("expected 50 fields"));
    }

    #[test]
    fn clamp_flag_codes() {
        for flag in [ClampFlag::Unclamped, ClampFlag::Low, ClampFlag::High] {
            assert_eq!(ClampFlag::from_code(flag.code()), Some(flag));
        }
        assert_eq!(ClampFlag::from_code(3), None);
    }
}
