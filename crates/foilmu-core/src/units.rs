//! Physical constants and unit conversions.
//!
//! The workspace works in keV for energy and mm for length. Mass
//! coefficients are reported in cm²/g, densities in g/cm³.

/// Electron rest energy mₑc², in keV (CODATA 2018).
pub const ELECTRON_MASS_KEV: f64 = 510.998_950_00;

/// Classical electron radius rₑ, in mm (CODATA 2018).
pub const CLASSICAL_ELECTRON_RADIUS_MM: f64 = 2.817_940_326_2e-12;

/// Millimetres per centimetre; also the 1/mm → 1/cm factor.
pub const MM_PER_CM: f64 = 10.0;

/// Nanometres per millimetre.
pub const NM_PER_MM: f64 = 1.0e6;

/// Micrometres per millimetre.
pub const UM_PER_MM: f64 = 1.0e3;

/// Convert a linear coefficient in 1/mm to a mass coefficient in cm²/g.
///
/// Returns `0.0` when the density is unknown (not strictly positive).
pub fn per_mm_to_cm2_g(mu_per_mm: f64, density_g_cm3: f64) -> f64 {
    if density_g_cm3 > 0.0 {
        mu_per_mm * MM_PER_CM / density_g_cm3
    } else {
        0.0
    }
}

/// Convert a mass coefficient in cm²/g to a linear coefficient in 1/mm.
pub fn cm2_g_to_per_mm(mu_cm2_g: f64, density_g_cm3: f64) -> f64 {
    mu_cm2_g * density_g_cm3 / MM_PER_CM
}

/// Relative deviation of `value` from `reference`, in percent.
///
/// Returns `0.0` when the reference is not strictly positive, so that
/// missing reference data never produces an infinite deviation.
pub fn percent_deviation(value: f64, reference: f64) -> f64 {
    if reference > 0.0 {
        (value - reference) / reference * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_to_mass_round_trip() {
        let mu = 2.5;
        let rho = 19.3;
        let mass = per_mm_to_cm2_g(mu, rho);
        assert!((mass - 25.0 / 19.3).abs() < 1e-12);
        assert!((cm2_g_to_per_mm(mass, rho) - mu).abs() < 1e-12);
    }

    #[test]
    fn unknown_density_gives_zero() {
        assert_eq!(per_mm_to_cm2_g(3.0, 0.0), 0.0);
        assert_eq!(per_mm_to_cm2_g(3.0, -1.0), 0.0);
    }

    #[test]
    fn percent_deviation_guards_reference() {
        assert!((percent_deviation(1.1, 1.0) - 10.0).abs() < 1e-9);
        assert_eq!(percent_deviation(1.1, 0.0), 0.0);
    }
}
