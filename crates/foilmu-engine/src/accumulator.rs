//! Per-run counters and energy sums.

use indexmap::IndexMap;

use foilmu_core::RegionTag;

/// Everything counted during one run.
///
/// Owned by the run controller, reset at run start, mutated by the step
/// router during the run, read once by [`derive_run`](crate::derive_run)
/// at run end. All mutations are total: there are no error cases.
///
/// Energies are in keV.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunAccumulator {
    injected: u64,
    uncollided: u64,
    scattered: u64,
    incident_energy: f64,
    transmitted_energy_uncollided: f64,
    transmitted_energy_total: f64,
    deposited: IndexMap<RegionTag, f64>,
    process_tally: IndexMap<String, u64>,
}

impl RunAccumulator {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every counter and sum.
    pub fn reset(&mut self) {
        self.injected = 0;
        self.uncollided = 0;
        self.scattered = 0;
        self.incident_energy = 0.0;
        self.transmitted_energy_uncollided = 0.0;
        self.transmitted_energy_total = 0.0;
        self.deposited.clear();
        self.process_tally.clear();
    }

    /// Count one injected primary.
    pub fn count_injection(&mut self) {
        self.injected += 1;
    }

    /// Record a photon leaving the stack.
    ///
    /// Only forward exits (`exit_cos_z > 0`) count; anything else is
    /// ignored and returns `false`. Callers must record each track at
    /// most once.
    pub fn record_transmission(&mut self, energy_kev: f64, exit_cos_z: f64, scattered: bool) -> bool {
        if exit_cos_z <= 0.0 || exit_cos_z.is_nan() {
            return false;
        }
        if scattered {
            self.scattered += 1;
        } else {
            self.uncollided += 1;
            self.transmitted_energy_uncollided += energy_kev;
        }
        self.transmitted_energy_total += energy_kev;
        true
    }

    /// Add to the incident energy sum.
    pub fn add_incident_energy(&mut self, energy_kev: f64) {
        self.incident_energy += energy_kev;
    }

    /// Add energy deposited in `region`.
    pub fn add_deposited_energy(&mut self, region: RegionTag, energy_kev: f64) {
        *self.deposited.entry(region).or_insert(0.0) += energy_kev;
    }

    /// Count one occurrence of a named physics process.
    pub fn count_process(&mut self, name: &str) {
        match self.process_tally.get_mut(name) {
            Some(n) => *n += 1,
            None => {
                self.process_tally.insert(name.to_string(), 1);
            }
        }
    }

    // ── Accessors ──────────────────────────────────────────────

    /// Injected primaries.
    pub fn injected_count(&self) -> u64 {
        self.injected
    }

    /// Forward-transmitted photons with no interaction.
    pub fn uncollided_count(&self) -> u64 {
        self.uncollided
    }

    /// Forward-transmitted photons that interacted or were secondaries.
    pub fn scattered_count(&self) -> u64 {
        self.scattered
    }

    /// All forward-transmitted photons.
    pub fn transmitted_count(&self) -> u64 {
        self.uncollided + self.scattered
    }

    /// Sum of primary energies.
    pub fn incident_energy_kev(&self) -> f64 {
        self.incident_energy
    }

    /// Energy carried out by uncollided photons.
    pub fn transmitted_energy_uncollided_kev(&self) -> f64 {
        self.transmitted_energy_uncollided
    }

    /// Energy carried out by all transmitted photons.
    pub fn transmitted_energy_total_kev(&self) -> f64 {
        self.transmitted_energy_total
    }

    /// Energy deposited in one region.
    pub fn deposited_kev(&self, region: RegionTag) -> f64 {
        self.deposited.get(&region).copied().unwrap_or(0.0)
    }

    /// Energy deposited in all backing layers together.
    pub fn deposited_backing_kev(&self) -> f64 {
        self.deposited
            .iter()
            .filter(|(region, _)| region.is_backing())
            .map(|(_, e)| e)
            .sum()
    }

    /// Per-region deposits, in first-touched order.
    pub fn deposits(&self) -> impl Iterator<Item = (RegionTag, f64)> + '_ {
        self.deposited.iter().map(|(r, e)| (*r, *e))
    }

    /// Process occurrence counts, in first-seen order.
    pub fn process_tally(&self) -> &IndexMap<String, u64> {
        &self.process_tally
    }
}
