//! The cross-section calculator seam.
//!
//! The host transport toolkit owns the physics tables. The derivation
//! engine only needs one thing from it: the macroscopic cross-section
//! of a named gamma process in a named material at a given energy.

use std::fmt;

/// Photon interaction processes the engine asks the calculator about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GammaProcess {
    /// Photoelectric absorption. All energy is transferred.
    Photoelectric,
    /// Incoherent (Compton) scattering.
    Compton,
    /// Coherent (Rayleigh) scattering. No energy is transferred.
    Rayleigh,
    /// Pair production in the nuclear field.
    PairNuclear,
    /// Pair production in the electron field (triplet production).
    PairElectron,
}

impl GammaProcess {
    /// Every process, in the order the engine sums them.
    pub const ALL: [Self; 5] = [
        Self::Photoelectric,
        Self::Compton,
        Self::Rayleigh,
        Self::PairNuclear,
        Self::PairElectron,
    ];

    /// Conventional short process name used by transport toolkits.
    pub fn process_name(self) -> &'static str {
        match self {
            Self::Photoelectric => "phot",
            Self::Compton => "compt",
            Self::Rayleigh => "Rayl",
            Self::PairNuclear => "conv",
            Self::PairElectron => "convIoni",
        }
    }
}

impl fmt::Display for GammaProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.process_name())
    }
}

/// Supplies macroscopic photon cross-sections.
///
/// Implementations wrap the host toolkit's calculator. A source that has
/// no data for a process or material returns `0.0`; the engine treats
/// zero as "not contributing" and never fails on it.
pub trait CrossSectionSource {
    /// Cross-section per unit volume (linear coefficient) in 1/mm for
    /// `process` in `material` at `energy_kev`.
    fn cross_section_per_volume(&self, energy_kev: f64, process: GammaProcess, material: &str)
        -> f64;
}

impl<T: CrossSectionSource + ?Sized> CrossSectionSource for &T {
    fn cross_section_per_volume(
        &self,
        energy_kev: f64,
        process: GammaProcess,
        material: &str,
    ) -> f64 {
        (**self).cross_section_per_volume(energy_kev, process, material)
    }
}

impl<T: CrossSectionSource + ?Sized> CrossSectionSource for Box<T> {
    fn cross_section_per_volume(
        &self,
        energy_kev: f64,
        process: GammaProcess,
        material: &str,
    ) -> f64 {
        (**self).cross_section_per_volume(energy_kev, process, material)
    }
}
