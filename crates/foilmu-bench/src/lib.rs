//! Synthetic photon sources for benchmarks and examples.
//!
//! [`SyntheticBeam`] stands in for a real transport toolkit: it samples
//! exponential free paths through each layer of a [`SlabStack`] and feeds
//! the resulting steps to a [`RunController`], exactly the way a host
//! stepping callback would.
//!
//! - [`LayerPhysics::tungsten_1mev`]: rough tungsten interaction rates at 1 MeV
//! - [`SyntheticBeam::run`]: one complete run of `n` events

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use foilmu_core::{CrossSectionSource, GammaProcess, LayerIndex, SlabStack, TrackId};
use foilmu_engine::{Derivation, EventScope, RunController, StepOutcome, StepRecord, Volume};

/// Interaction rates of one layer, in 1/mm.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayerPhysics {
    /// Rate of full absorption (photoelectric).
    pub absorb_per_mm: f64,
    /// Rate of scattering (Compton).
    pub scatter_per_mm: f64,
}

impl LayerPhysics {
    /// Approximate tungsten rates at 1 MeV (μ ≈ 1.28 /cm at 19.3 g/cm³).
    pub fn tungsten_1mev() -> Self {
        Self {
            absorb_per_mm: 0.012,
            scatter_per_mm: 0.1157,
        }
    }

    /// Total interaction rate.
    pub fn total_per_mm(&self) -> f64 {
        self.absorb_per_mm + self.scatter_per_mm
    }
}

/// Answers for every material with the same rates.
impl CrossSectionSource for LayerPhysics {
    fn cross_section_per_volume(&self, _energy_kev: f64, process: GammaProcess, _material: &str) -> f64 {
        match process {
            GammaProcess::Photoelectric => self.absorb_per_mm,
            GammaProcess::Compton => self.scatter_per_mm,
            _ => 0.0,
        }
    }
}

/// A mono-energetic pencil beam along +z with seeded sampling.
///
/// Each photon interacts at most once per layer. A scatter keeps a
/// uniform share between half and all of the energy and redirects the
/// photon with a uniform `cos θ` in (-1, 1]; the rest is deposited locally
/// on the scattering step. Absorption deposits everything.
#[derive(Clone, Debug)]
pub struct SyntheticBeam {
    energy_kev: f64,
    layers: Vec<LayerPhysics>,
    rng: ChaCha8Rng,
}

impl SyntheticBeam {
    /// A beam with per-layer rates. Layers beyond `layers` do not interact.
    pub fn new(energy_kev: f64, layers: Vec<LayerPhysics>, seed: u64) -> Self {
        Self {
            energy_kev,
            layers,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Beam energy, in keV.
    pub fn energy_kev(&self) -> f64 {
        self.energy_kev
    }

    /// Rates of the primary layer.
    pub fn primary_physics(&self) -> LayerPhysics {
        self.layers.first().copied().unwrap_or_default()
    }

    /// Simulate one run of `events` primaries on `controller`.
    pub fn run(&mut self, controller: &mut RunController, events: u64) -> Option<Derivation> {
        let stack = controller.stack().clone();
        let run = controller.begin_run();
        tracing::debug!(run = run.0, events, energy_kev = self.energy_kev, "synthetic run");
        for _ in 0..events {
            let mut scope = controller.begin_event();
            self.event(&mut scope, &stack);
        }
        controller.end_run()
    }

    /// Transport one primary through the stack.
    pub fn event(&mut self, scope: &mut EventScope<'_>, stack: &SlabStack) {
        scope.inject_primary(self.energy_kev);
        let mut energy = self.energy_kev;
        let mut dir_z = 1.0;

        for (i, layer) in stack.layers().iter().enumerate() {
            let here = Volume::Layer(LayerIndex(i as u16));
            let physics = self.layers.get(i).copied().unwrap_or_default();
            let total = physics.total_per_mm();
            let path = layer.thickness_mm() / dir_z;
            let depth = if total > 0.0 {
                -(1.0 - self.rng.random::<f64>()).ln() / total
            } else {
                f64::INFINITY
            };

            if depth < path {
                if self.rng.random::<f64>() * total < physics.absorb_per_mm {
                    let mut step = photon(here, here, "phot", false, dir_z, 0.0);
                    step.energy_deposit_kev = energy;
                    scope.route(&step);
                    return;
                }
                let kept = energy * (0.5 + 0.5 * self.rng.random::<f64>());
                dir_z = 1.0 - 2.0 * self.rng.random::<f64>();
                let mut step = photon(here, here, "compt", false, dir_z, kept);
                step.energy_deposit_kev = energy - kept;
                energy = kept;
                scope.route(&step);
                if dir_z <= 0.0 {
                    scope.route(&photon(here, Volume::World, "Transportation", true, dir_z, energy));
                    return;
                }
            }

            let next = if i + 1 < stack.layer_count() {
                Volume::Layer(LayerIndex(i as u16 + 1))
            } else {
                Volume::World
            };
            let step = photon(here, next, "Transportation", true, dir_z, energy);
            if scope.route(&step) == StepOutcome::Kill {
                return;
            }
        }
    }
}

fn photon(
    pre: Volume,
    post: Volume,
    process: &'static str,
    on_boundary: bool,
    direction_z: f64,
    energy_kev: f64,
) -> StepRecord<'static> {
    StepRecord {
        track_id: TrackId::PRIMARY,
        is_gamma: true,
        process: Some(process),
        pre,
        post,
        on_boundary,
        direction_z,
        kinetic_energy_kev: energy_kev,
        energy_deposit_kev: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foilmu_engine::EngineConfig;
    use foilmu_test_utils::ScratchDir;

    fn controller(scratch: &ScratchDir, thickness_mm: f64) -> RunController {
        let mut stack = SlabStack::tungsten_foil();
        stack.set_primary_thickness(thickness_mm).unwrap();
        let config = EngineConfig {
            summary_path: scratch.join("summary.csv"),
            ..EngineConfig::default()
        };
        RunController::new(config, stack).unwrap()
    }

    #[test]
    fn same_seed_same_counts() {
        let scratch = ScratchDir::new("bench-seed");
        let mut a = controller(&scratch, 2.0);
        let mut b = controller(&scratch, 2.0);
        let ra = SyntheticBeam::new(1000.0, vec![LayerPhysics::tungsten_1mev()], 7)
            .run(&mut a, 2000)
            .unwrap();
        let rb = SyntheticBeam::new(1000.0, vec![LayerPhysics::tungsten_1mev()], 7)
            .run(&mut b, 2000)
            .unwrap();
        assert_eq!(ra.row.n_uncollided, rb.row.n_uncollided);
        assert_eq!(ra.row.n_scattered, rb.row.n_scattered);
        assert_eq!(ra.row.e_abs_kev, rb.row.e_abs_kev);
    }

    #[test]
    fn thick_foil_recovers_attenuation() {
        let scratch = ScratchDir::new("bench-thick");
        let physics = LayerPhysics::tungsten_1mev();
        let mut c = controller(&scratch, 5.0).with_calculator(Box::new(physics));
        let row = SyntheticBeam::new(1000.0, vec![physics], 42)
            .run(&mut c, 20_000)
            .unwrap()
            .row;

        let expected = (-physics.total_per_mm() * 5.0).exp();
        assert!((row.t_counts - expected).abs() < 5.0 * row.sigma_t_counts + 1e-3);
        assert!((row.mu_counts_per_mm - physics.total_per_mm()).abs() < 0.02);
        assert!((row.mu_calc_per_mm - physics.total_per_mm()).abs() < 1e-12);
        assert!(row.e_abs_kev > 0.0);
        assert_eq!(row.n_injected, 20_000);
    }

    #[test]
    fn backing_layer_sees_forward_photons() {
        let scratch = ScratchDir::new("bench-backing");
        let mut c = controller(&scratch, 1.0);
        c.set_backing_thickness(1.0).unwrap();
        let physics = LayerPhysics::tungsten_1mev();
        let row = SyntheticBeam::new(1000.0, vec![physics, physics], 3)
            .run(&mut c, 5000)
            .unwrap()
            .row;

        assert!(row.e_abs_backing_kev > 0.0);
        assert!(row.n_trans_total <= row.n_injected);
        assert_eq!(row.backing_material, "G4_W");
    }
}
