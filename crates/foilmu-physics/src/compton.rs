//! Compton energy-retention fraction.
//!
//! For a photon of energy E scattering off a free electron at rest, the
//! scattered photon keeps a fraction
//!
//! ```text
//! P(θ) = 1 / (1 + α(1 − cos θ)),   α = E / mₑc²
//! ```
//!
//! of its energy. Averaging P over the Klein–Nishina angular
//! distribution gives the mean retained fraction; one minus that is the
//! fraction handed to the recoil electron.

use std::f64::consts::PI;

use foilmu_core::units::{CLASSICAL_ELECTRON_RADIUS_MM, ELECTRON_MASS_KEV};

/// Composite-Simpson estimator of the Klein–Nishina retention fraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComptonRetention {
    steps: usize,
}

impl ComptonRetention {
    /// Default Simpson step count.
    pub const DEFAULT_STEPS: usize = 512;

    /// Smallest step count accepted.
    pub const MIN_STEPS: usize = 32;

    /// Create an estimator. `steps` is rounded up to even, then raised
    /// to at least [`MIN_STEPS`](Self::MIN_STEPS).
    pub fn new(steps: usize) -> Self {
        Self {
            steps: Self::coerce_steps(steps),
        }
    }

    /// Normalise a requested step count the way [`new`](Self::new) does.
    pub fn coerce_steps(steps: usize) -> usize {
        let even = if steps % 2 == 0 {
            steps
        } else {
            steps.saturating_add(1)
        };
        even.max(Self::MIN_STEPS)
    }

    /// The step count actually used.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Mean fraction of photon energy retained after a Compton scatter.
    ///
    /// Returns `1.0` for non-positive energy. The result lies in
    /// `(0, 1]` for every positive energy.
    pub fn retention_fraction(&self, energy_kev: f64) -> f64 {
        if energy_kev <= 0.0 || energy_kev.is_nan() {
            return 1.0;
        }
        let alpha = energy_kev / ELECTRON_MASS_KEV;
        let prefactor = PI * CLASSICAL_ELECTRON_RADIUS_MM * CLASSICAL_ELECTRON_RADIUS_MM;
        let n = self.steps;
        let h = 2.0 / n as f64;

        let mut total = 0.0;
        let mut weighted = 0.0;
        for i in 0..=n {
            let cos_theta = -1.0 + i as f64 * h;
            let weight = if i == 0 || i == n {
                1.0
            } else if i % 2 == 0 {
                2.0
            } else {
                4.0
            };
            let ratio = 1.0 / (1.0 + alpha * (1.0 - cos_theta));
            let sin2 = 1.0 - cos_theta * cos_theta;
            let dsigma = prefactor * ratio * ratio * (ratio + 1.0 / ratio - sin2);
            total += weight * dsigma;
            weighted += weight * dsigma * ratio;
        }

        // The h/3 Simpson factor cancels in the ratio.
        if total <= 0.0 {
            return 1.0;
        }
        weighted / total
    }

    /// Mean fraction of photon energy transferred to the recoil electron.
    pub fn transfer_fraction(&self, energy_kev: f64) -> f64 {
        (1.0 - self.retention_fraction(energy_kev)).max(0.0)
    }
}

impl Default for ComptonRetention {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STEPS)
    }
}
