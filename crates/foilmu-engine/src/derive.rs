//! End-of-run coefficient derivation.
//!
//! [`derive_run`] is a pure function of the accumulator, the geometry and
//! a [`DerivationContext`]. It never fails: missing density, missing
//! reference data and a missing calculator all degrade the affected
//! columns to zero, and anything noteworthy is returned as an
//! [`Advisory`].

use std::fmt;

use foilmu_core::units::{cm2_g_to_per_mm, per_mm_to_cm2_g, percent_deviation, MM_PER_CM};
use foilmu_core::{CrossSectionSource, RegionTag, RunId, SlabStack};
use foilmu_physics::{CalculatedCoefficients, ComptonRetention};
use foilmu_reference::ReferenceStore;
use foilmu_summary::{ClampFlag, SummaryRow};

use crate::accumulator::RunAccumulator;

/// Lower clamp for the transmission fraction before taking its log.
pub const T_CLAMP_LOW: f64 = 1.0e-9;
/// Upper clamp for the transmission fraction before taking its log.
pub const T_CLAMP_HIGH: f64 = 1.0 - 1.0e-9;
/// Transmission above which the foil is too thin for good statistics.
pub const T_ADVISE_HIGH: f64 = 0.995;
/// Transmission below which the foil is too thick for good statistics.
pub const T_ADVISE_LOW: f64 = 0.005;

const EPSILON: f64 = 1.0e-12;

// ── Inputs ─────────────────────────────────────────────────────────

/// Static parameters of the run being derived.
#[derive(Clone, Copy, Debug)]
pub struct RunParameters<'a> {
    /// Run identifier written to the row.
    pub run_id: RunId,
    /// Geometry the run was simulated with.
    pub stack: &'a SlabStack,
}

/// Shared collaborators consulted during derivation.
#[derive(Clone, Copy)]
pub struct DerivationContext<'a> {
    /// Reference table store. Loaded on first use.
    pub reference: &'a ReferenceStore,
    /// Compton retention estimator.
    pub compton: &'a ComptonRetention,
    /// Cross-section calculator. `None` zeroes the calculator columns.
    pub calculator: Option<&'a dyn CrossSectionSource>,
    /// Fall back to μ_tr for the CPE estimate when no reference ratio exists.
    pub prefer_calculator_mu_tr: bool,
}

impl fmt::Debug for DerivationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivationContext")
            .field("reference", self.reference)
            .field("compton", self.compton)
            .field("calculator", &self.calculator.is_some())
            .field("prefer_calculator_mu_tr", &self.prefer_calculator_mu_tr)
            .finish()
    }
}

// ── Outputs ────────────────────────────────────────────────────────

/// Non-fatal observations about a run.
#[derive(Clone, Debug, PartialEq)]
pub enum Advisory {
    /// Too little absorption for a precise μ.
    HighTransmission {
        /// Raw uncollided transmission.
        t: f64,
    },
    /// Too much absorption for a precise μ.
    LowTransmission {
        /// Raw uncollided transmission.
        t: f64,
    },
    /// The transmission was clamped before taking its logarithm.
    TransmissionClamped {
        /// Raw value.
        raw: f64,
        /// Value used.
        clamped: f64,
        /// Which bound applied.
        flag: ClampFlag,
    },
    /// No reference table could be loaded.
    ReferenceUnavailable,
    /// The primary material has no density; mass coefficients are zero.
    UnknownDensity {
        /// Material name.
        material: String,
    },
}

impl Advisory {
    /// Log this advisory at `warn`.
    pub fn emit(&self, run_id: RunId) {
        tracing::warn!(run = run_id.0, "{self}");
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighTransmission { t } => write!(
                f,
                "T={t} >= {T_ADVISE_HIGH}: increase primaries or foil thickness to reduce counting noise"
            ),
            Self::LowTransmission { t } => write!(
                f,
                "T={t} <= {T_ADVISE_LOW}: decrease foil thickness or increase primaries"
            ),
            Self::TransmissionClamped { raw, clamped, flag } => write!(
                f,
                "transmission fraction {raw} clamped to {clamped} [flag {}]; \
                 consider more statistics or a different thickness",
                flag.code()
            ),
            Self::ReferenceUnavailable => write!(
                f,
                "reference table not loaded; reference columns are zero"
            ),
            Self::UnknownDensity { material } => write!(
                f,
                "material {material:?} has no density; mass coefficients are zero"
            ),
        }
    }
}

/// The derived row plus the advisories raised while deriving it.
#[derive(Clone, Debug, PartialEq)]
pub struct Derivation {
    /// The summary row.
    pub row: SummaryRow,
    /// Advisories, in the order they were raised.
    pub advisories: Vec<Advisory>,
}

impl Derivation {
    /// Whether an advisory matching `pred` was raised.
    pub fn has_advisory(&self, pred: impl Fn(&Advisory) -> bool) -> bool {
        self.advisories.iter().any(pred)
    }
}

// ── Derivation ─────────────────────────────────────────────────────

/// Clamp a raw transmission into the log-safe range and classify it.
pub fn clamp_transmission(raw: f64) -> (f64, ClampFlag) {
    let clamped = raw.clamp(T_CLAMP_LOW, T_CLAMP_HIGH);
    let flag = if raw <= T_CLAMP_LOW {
        ClampFlag::Low
    } else if raw >= T_CLAMP_HIGH {
        ClampFlag::High
    } else {
        ClampFlag::Unclamped
    };
    (clamped, flag)
}

/// Binomial standard error of a transmission fraction over `n` trials.
pub fn transmission_sigma(raw: f64, n: u64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = raw.clamp(0.0, 1.0);
    (p * (1.0 - p).max(0.0) / n as f64).sqrt()
}

fn fraction(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole
    } else {
        0.0
    }
}

/// Derive the summary row for a finished run.
///
/// Returns `None` when no primaries were injected.
pub fn derive_run(
    acc: &RunAccumulator,
    params: RunParameters<'_>,
    ctx: DerivationContext<'_>,
) -> Option<Derivation> {
    let n_injected = acc.injected_count();
    if n_injected == 0 {
        return None;
    }
    let n = n_injected as f64;
    let stack = params.stack;
    let primary = stack.primary();
    let mut advisories = Vec::new();

    // Counts transmission.
    let t_raw = acc.uncollided_count() as f64 / n;
    if t_raw >= T_ADVISE_HIGH {
        advisories.push(Advisory::HighTransmission { t: t_raw });
    }
    if t_raw <= T_ADVISE_LOW {
        advisories.push(Advisory::LowTransmission { t: t_raw });
    }
    let (t_clamped, clamp_flag) = clamp_transmission(t_raw);
    if (t_raw - t_clamped).abs() > EPSILON {
        advisories.push(Advisory::TransmissionClamped {
            raw: t_raw,
            clamped: t_clamped,
            flag: clamp_flag,
        });
    }
    let sigma_t = transmission_sigma(t_raw, n_injected);
    let t_scattered = acc.scattered_count() as f64 / n;

    // Geometry.
    let density = primary.material().density_g_cm3();
    if density <= 0.0 {
        advisories.push(Advisory::UnknownDensity {
            material: primary.material().name().to_string(),
        });
    }
    let thickness_mm = primary.thickness_mm();

    // Counts-derived μ.
    let mu_counts_per_mm = if thickness_mm > 0.0 {
        -t_clamped.ln() / thickness_mm
    } else {
        0.0
    };
    let mu_counts_cm2_g = per_mm_to_cm2_g(mu_counts_per_mm, density);
    let sigma_mu_counts_cm2_g = if thickness_mm > 0.0 && t_raw > 0.0 && density > 0.0 {
        sigma_t * MM_PER_CM / (density * thickness_mm * t_raw.max(EPSILON))
    } else {
        0.0
    };

    // Energy bookkeeping.
    let energy_kev = if acc.incident_energy_kev() > 0.0 {
        acc.incident_energy_kev() / n
    } else {
        0.0
    };
    let fluence_kev = energy_kev * n;
    let e_trans_unc = acc.transmitted_energy_uncollided_kev();
    let e_trans_tot = acc.transmitted_energy_total_kev();
    let e_abs = acc.deposited_kev(RegionTag::PRIMARY);
    let e_abs_backing = acc.deposited_backing_kev();
    let e_abs_slab = e_abs + e_abs_backing;
    let e_abs_other = acc.deposited_kev(RegionTag::Outside);

    let t_energy_unc = fraction(e_trans_unc, fluence_kev);
    let t_energy_tot = fraction(e_trans_tot, fluence_kev).clamp(0.0, 1.0);
    let absorbed_fraction = fraction(e_abs, fluence_kev).clamp(0.0, 1.0);
    let absorbed_fraction_slab = fraction(e_abs_slab, fluence_kev).clamp(0.0, 1.0);

    // Effective μ from absorbed energy.
    let mu_eff_per_mm = if absorbed_fraction > 0.0 && absorbed_fraction < 1.0 {
        -(1.0 - absorbed_fraction).max(EPSILON).ln() / thickness_mm
    } else {
        0.0
    };
    let mu_eff_cm2_g = per_mm_to_cm2_g(mu_eff_per_mm, density);

    // Raw μ_en from deposited energy per mass path. Backing layers with
    // unknown density take the primary density.
    let mass_path_primary = primary.mass_path_g_cm2();
    let (mass_path_slab, thickness_slab_cm) = stack.layers().iter().fold(
        (0.0, 0.0),
        |(mass, cm), layer| {
            let rho = if layer.material().has_density() {
                layer.material().density_g_cm3()
            } else {
                density
            };
            (mass + rho * layer.thickness_cm(), cm + layer.thickness_cm())
        },
    );
    let mu_en_raw_cm2_g = if mass_path_primary > 0.0 {
        fraction(e_abs, fluence_kev) / mass_path_primary
    } else {
        0.0
    };
    let mu_en_raw_per_mm = cm2_g_to_per_mm(mu_en_raw_cm2_g, density);
    let mu_en_raw_slab_cm2_g = if mass_path_slab > 0.0 {
        fraction(e_abs_slab, fluence_kev) / mass_path_slab
    } else {
        0.0
    };
    let rho_eff_slab = if thickness_slab_cm > 0.0 && mass_path_slab > 0.0 {
        mass_path_slab / thickness_slab_cm
    } else {
        0.0
    };
    let mu_en_raw_slab_per_mm = cm2_g_to_per_mm(mu_en_raw_slab_cm2_g, rho_eff_slab);

    // Calculator cross-check.
    let calc = match ctx.calculator {
        Some(source) if energy_kev > 0.0 => {
            CalculatedCoefficients::compute(source, primary.material(), energy_kev, ctx.compton)
        }
        _ => CalculatedCoefficients::default(),
    };

    // Reference cross-check.
    let reference = ctx.reference.interpolate(energy_kev);
    if !ctx.reference.ensure_loaded() {
        advisories.push(Advisory::ReferenceUnavailable);
    }
    let (mu_ref_cm2_g, mu_en_ref_cm2_g) = reference
        .map(|r| (r.mu_cm2_g, r.mu_en_cm2_g))
        .unwrap_or((0.0, 0.0));
    let delta_mu_percent = percent_deviation(mu_counts_cm2_g, mu_ref_cm2_g);
    let delta_mu_en_percent = percent_deviation(mu_en_raw_cm2_g, mu_en_ref_cm2_g);

    // CPE estimate: reference ratio, then μ_tr, then raw.
    let (mu_en_cpe_per_mm, mu_en_cpe_cm2_g) =
        match reference.and_then(|r| r.absorption_ratio()) {
            Some(ratio) => (mu_counts_per_mm * ratio, mu_counts_cm2_g * ratio),
            None if ctx.prefer_calculator_mu_tr && calc.mu_tr_cm2_g > 0.0 => {
                (calc.mu_tr_per_mm, calc.mu_tr_cm2_g)
            }
            None => (mu_en_raw_per_mm, mu_en_raw_cm2_g),
        };
    let delta_mu_en_cpe_percent = percent_deviation(mu_en_cpe_cm2_g, mu_en_ref_cm2_g);
    let delta_mu_counts_vs_mu_calc_percent = percent_deviation(mu_counts_cm2_g, calc.mu_calc_cm2_g);
    let delta_mu_en_cpe_vs_mu_tr_percent = percent_deviation(mu_en_cpe_cm2_g, calc.mu_tr_cm2_g);

    let row = SummaryRow {
        run_id: params.run_id,
        world_half_cm: stack.world_half_cm(),
        thickness_nm: stack.primary_thickness_nm(),
        backing_thickness_um: stack.backing_thickness_um(),
        backing_material: stack.backing_material_label(),
        density_g_cm3: density,
        energy_kev,
        n_injected,
        n_uncollided: acc.uncollided_count(),
        n_scattered: acc.scattered_count(),
        n_trans_total: acc.transmitted_count(),
        t_counts: t_raw,
        t_counts_scattered: t_scattered,
        t_counts_clamped: t_clamped,
        clamp_flag,
        mu_counts_per_mm,
        mu_counts_cm2_g,
        mu_calc_per_mm: calc.mu_calc_per_mm,
        mu_calc_cm2_g: calc.mu_calc_cm2_g,
        mu_tr_per_mm: calc.mu_tr_per_mm,
        mu_tr_cm2_g: calc.mu_tr_cm2_g,
        mu_ref_cm2_g,
        mu_en_ref_cm2_g,
        delta_mu_percent,
        delta_mu_en_percent,
        sigma_t_counts: sigma_t,
        sigma_mu_counts_cm2_g,
        mu_en_cpe_per_mm,
        mu_en_cpe_cm2_g,
        delta_mu_en_cpe_percent,
        delta_mu_counts_vs_mu_calc_percent,
        delta_mu_en_cpe_vs_mu_tr_percent,
        absorbed_fraction,
        absorbed_fraction_slab,
        mu_en_per_mm: mu_en_cpe_per_mm,
        mu_en_cm2_g: mu_en_cpe_cm2_g,
        mu_en_raw_per_mm,
        mu_en_raw_cm2_g,
        mu_en_raw_slab_per_mm,
        mu_en_raw_slab_cm2_g,
        mu_eff_per_mm,
        mu_eff_cm2_g,
        e_trans_unc_kev: e_trans_unc,
        e_trans_tot_kev: e_trans_tot,
        e_abs_kev: e_abs,
        e_abs_backing_kev: e_abs_backing,
        e_abs_slab_kev: e_abs_slab,
        e_abs_other_kev: e_abs_other,
        t_energy_unc,
        t_energy_tot,
    };
    log_report(&row);

    Some(Derivation { row, advisories })
}

fn log_report(row: &SummaryRow) {
    tracing::info!(
        run = row.run_id.0,
        energy_kev = row.energy_kev,
        thickness_nm = row.thickness_nm,
        backing_um = row.backing_thickness_um,
        density_g_cm3 = row.density_g_cm3,
        injected = row.n_injected,
        uncollided = row.n_uncollided,
        scattered = row.n_scattered,
        t_counts = row.t_counts,
        sigma_t = row.sigma_t_counts,
        clamp_flag = row.clamp_flag.code(),
        "run transmission"
    );
    tracing::info!(
        run = row.run_id.0,
        mu_per_mm = row.mu_counts_per_mm,
        mu_cm2_g = row.mu_counts_cm2_g,
        sigma_mu_cm2_g = row.sigma_mu_counts_cm2_g,
        mu_eff_cm2_g = row.mu_eff_cm2_g,
        mu_en_raw_cm2_g = row.mu_en_raw_cm2_g,
        mu_en_raw_slab_cm2_g = row.mu_en_raw_slab_cm2_g,
        mu_en_cpe_cm2_g = row.mu_en_cpe_cm2_g,
        absorbed_fraction = row.absorbed_fraction,
        absorbed_fraction_slab = row.absorbed_fraction_slab,
        "run coefficients"
    );
    if row.mu_calc_cm2_g > 0.0 {
        tracing::info!(
            run = row.run_id.0,
            mu_calc_cm2_g = row.mu_calc_cm2_g,
            mu_tr_cm2_g = row.mu_tr_cm2_g,
            delta_vs_calc_percent = row.delta_mu_counts_vs_mu_calc_percent,
            delta_cpe_vs_tr_percent = row.delta_mu_en_cpe_vs_mu_tr_percent,
            "calculator comparison"
        );
    }
    if row.mu_ref_cm2_g > 0.0 || row.mu_en_ref_cm2_g > 0.0 {
        tracing::info!(
            run = row.run_id.0,
            mu_ref_cm2_g = row.mu_ref_cm2_g,
            mu_en_ref_cm2_g = row.mu_en_ref_cm2_g,
            delta_mu_percent = row.delta_mu_percent,
            delta_mu_en_raw_percent = row.delta_mu_en_percent,
            delta_mu_en_cpe_percent = row.delta_mu_en_cpe_percent,
            "reference comparison"
        );
    }
}
