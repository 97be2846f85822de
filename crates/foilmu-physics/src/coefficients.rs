//! Calculator-derived total and energy-transfer coefficients.

use foilmu_core::units::{per_mm_to_cm2_g, ELECTRON_MASS_KEV};
use foilmu_core::{CrossSectionSource, GammaProcess, MaterialSpec};

use crate::compton::ComptonRetention;

/// Fraction of photon energy given to the e⁺e⁻ pair's kinetic energy.
///
/// `(E − 2mₑc²) / E` above threshold, zero at or below it.
pub fn pair_energy_fraction(energy_kev: f64) -> f64 {
    let threshold = 2.0 * ELECTRON_MASS_KEV;
    if energy_kev > threshold {
        ((energy_kev - threshold) / energy_kev).max(0.0)
    } else {
        0.0
    }
}

/// Per-process cross-sections at one energy, plus the derived totals.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CalculatedCoefficients {
    /// Photoelectric, 1/mm.
    pub photoelectric_per_mm: f64,
    /// Compton, 1/mm.
    pub compton_per_mm: f64,
    /// Rayleigh, 1/mm.
    pub rayleigh_per_mm: f64,
    /// Pair production (nuclear and electron field combined), 1/mm.
    pub pair_per_mm: f64,
    /// Total attenuation μ_calc, 1/mm.
    pub mu_calc_per_mm: f64,
    /// μ_calc/ρ, cm²/g. Zero when density is unknown.
    pub mu_calc_cm2_g: f64,
    /// Energy-transfer coefficient μ_tr, 1/mm.
    pub mu_tr_per_mm: f64,
    /// μ_tr/ρ, cm²/g. Zero when density is unknown.
    pub mu_tr_cm2_g: f64,
}

impl CalculatedCoefficients {
    /// Query `source` for every [`GammaProcess`] in `material` at
    /// `energy_kev` and combine.
    ///
    /// μ_tr counts photoelectric absorption in full, pair production
    /// weighted by [`pair_energy_fraction`], Compton weighted by the
    /// transfer fraction, and Rayleigh not at all.
    pub fn compute<S>(
        source: &S,
        material: &MaterialSpec,
        energy_kev: f64,
        compton: &ComptonRetention,
    ) -> Self
    where
        S: CrossSectionSource + ?Sized,
    {
        let query = |p| source.cross_section_per_volume(energy_kev, p, material.name());
        let photoelectric_per_mm = query(GammaProcess::Photoelectric);
        let compton_per_mm = query(GammaProcess::Compton);
        let rayleigh_per_mm = query(GammaProcess::Rayleigh);
        let pair_per_mm = query(GammaProcess::PairNuclear) + query(GammaProcess::PairElectron);

        let mu_calc_per_mm = photoelectric_per_mm + compton_per_mm + rayleigh_per_mm + pair_per_mm;
        let mu_tr_per_mm = photoelectric_per_mm
            + pair_per_mm * pair_energy_fraction(energy_kev)
            + compton_per_mm * compton.transfer_fraction(energy_kev);

        let density = material.density_g_cm3();
        tracing::trace!(
            material = material.name(),
            energy_kev,
            mu_calc_per_mm,
            mu_tr_per_mm,
            "calculator coefficients"
        );
        Self {
            photoelectric_per_mm,
            compton_per_mm,
            rayleigh_per_mm,
            pair_per_mm,
            mu_calc_per_mm,
            mu_calc_cm2_g: per_mm_to_cm2_g(mu_calc_per_mm, density),
            mu_tr_per_mm,
            mu_tr_cm2_g: per_mm_to_cm2_g(mu_tr_per_mm, density),
        }
    }
}
