//! Toolkit-neutral step routing.
//!
//! The host toolkit's stepping callback translates each step into a
//! [`StepRecord`] and hands it to [`StepRouter::route`]. The router
//! classifies the step, updates the [`RunAccumulator`] and the per-track
//! [`TrackLedger`], and tells the callback whether to kill the track.

use std::collections::HashMap;

use foilmu_core::{LayerIndex, RegionTag, SlabStack, TrackId};

use crate::accumulator::RunAccumulator;

/// Process name the toolkit reports for pure geometric transport.
pub const TRANSPORT_PROCESS: &str = "Transportation";

/// A physical volume as seen by the router.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Volume {
    /// One absorber layer of the slab stack.
    Layer(LayerIndex),
    /// The surrounding world.
    World,
}

impl Volume {
    /// The primary absorber.
    pub const PRIMARY: Self = Self::Layer(LayerIndex::PRIMARY);

    /// Region that deposits in this volume are booked against.
    pub fn region(self) -> RegionTag {
        match self {
            Self::Layer(idx) => RegionTag::Layer(idx),
            Self::World => RegionTag::Outside,
        }
    }
}

/// One simulation step, in workspace units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepRecord<'a> {
    /// Track the step belongs to.
    pub track_id: TrackId,
    /// Whether the particle is a photon.
    pub is_gamma: bool,
    /// Process that limited the step, if the toolkit reports one.
    pub process: Option<&'a str>,
    /// Volume at the start of the step.
    pub pre: Volume,
    /// Volume at the end of the step.
    pub post: Volume,
    /// Whether both step points lie on a geometric boundary.
    pub on_boundary: bool,
    /// z-component of the post-step momentum direction.
    pub direction_z: f64,
    /// Post-step kinetic energy, keV.
    pub kinetic_energy_kev: f64,
    /// Energy deposited along the step, keV.
    pub energy_deposit_kev: f64,
}

/// What the callback should do with the track after this step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Keep tracking.
    Continue,
    /// Stop and kill the track; it has left the stack into the world.
    Kill,
}

/// Which particles' energy deposits are booked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DepositPolicy {
    /// Deposits from photon steps only. Energy handed to secondary
    /// electrons is not booked.
    #[default]
    GammasOnly,
    /// Deposits from every particle, including secondary electrons.
    AllParticles,
}

// ── TrackLedger ────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default)]
struct TrackFlags {
    scattered: bool,
    transmission_logged: bool,
}

/// Per-track flags for the current event, keyed by track ID.
///
/// Toolkit track IDs are normally small and dense within an event, so IDs
/// below [`DENSE_TRACK_LIMIT`](TrackLedger::DENSE_TRACK_LIMIT) live in a vector
/// indexed by ID. Larger IDs go to a map, so one stray ID never sizes the
/// vector. Each flag is only ever set, never cleared, until
/// [`clear`](Self::clear) at the next event.
#[derive(Clone, Debug, Default)]
pub struct TrackLedger {
    flags: Vec<TrackFlags>,
    sparse: HashMap<TrackId, TrackFlags>,
}

impl TrackLedger {
    /// Track IDs below this are stored densely.
    pub const DENSE_TRACK_LIMIT: u32 = 1 << 16;

    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every track. Call at each event boundary.
    pub fn clear(&mut self) {
        self.flags.clear();
        self.sparse.clear();
    }

    fn entry(&mut self, track: TrackId) -> &mut TrackFlags {
        if track.0 >= Self::DENSE_TRACK_LIMIT {
            return self.sparse.entry(track).or_default();
        }
        let idx = track.0 as usize;
        if idx >= self.flags.len() {
            self.flags.resize(idx + 1, TrackFlags::default());
        }
        &mut self.flags[idx]
    }

    fn get(&self, track: TrackId) -> Option<&TrackFlags> {
        if track.0 >= Self::DENSE_TRACK_LIMIT {
            self.sparse.get(&track)
        } else {
            self.flags.get(track.0 as usize)
        }
    }

    /// Number of slots held in dense storage.
    pub fn dense_len(&self) -> usize {
        self.flags.len()
    }

    /// Mark a track as having interacted.
    pub fn mark_scattered(&mut self, track: TrackId) {
        self.entry(track).scattered = true;
    }

    /// Whether a track has interacted.
    pub fn is_scattered(&self, track: TrackId) -> bool {
        self.get(track).is_some_and(|f| f.scattered)
    }

    /// Whether a transmission has been recorded for this track.
    pub fn transmission_logged(&self, track: TrackId) -> bool {
        self.get(track).is_some_and(|f| f.transmission_logged)
    }

    /// Claim the track's single transmission record.
    ///
    /// Returns `true` the first time for each track, `false` afterwards.
    pub fn claim_transmission(&mut self, track: TrackId) -> bool {
        let flags = self.entry(track);
        if flags.transmission_logged {
            return false;
        }
        flags.transmission_logged = true;
        true
    }
}

// ── StepRouter ─────────────────────────────────────────────────────

/// Classifies steps and feeds the accumulator.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepRouter {
    deposits: DepositPolicy,
}

impl StepRouter {
    /// A router with the given deposit policy.
    pub fn new(deposits: DepositPolicy) -> Self {
        Self { deposits }
    }

    /// The deposit policy in use.
    pub fn deposit_policy(&self) -> DepositPolicy {
        self.deposits
    }

    /// Route one step.
    ///
    /// 1. Any named process is tallied.
    /// 2. Deposits allowed by the [`DepositPolicy`] are booked against the
    ///    pre-step volume.
    /// 3. Non-photons stop here.
    /// 4. A secondary photon, or a step limited by anything other than
    ///    transport, marks the track scattered.
    /// 5. A boundary step leaving a layer forward, into a later layer or
    ///    into the world, records the track's transmission once.
    /// 6. A forward exit into the world kills the track.
    pub fn route(
        &self,
        ledger: &mut TrackLedger,
        acc: &mut RunAccumulator,
        stack: &SlabStack,
        step: &StepRecord<'_>,
    ) -> StepOutcome {
        if let Some(name) = step.process {
            acc.count_process(name);
        }

        let book_deposit = step.is_gamma || self.deposits == DepositPolicy::AllParticles;
        if book_deposit && step.energy_deposit_kev > 0.0 {
            acc.add_deposited_energy(self.region_of(stack, step.pre), step.energy_deposit_kev);
        }

        if !step.is_gamma {
            return StepOutcome::Continue;
        }

        if !step.track_id.is_primary() || step.process.is_some_and(|p| p != TRANSPORT_PROCESS) {
            ledger.mark_scattered(step.track_id);
        }

        if !step.on_boundary {
            return StepOutcome::Continue;
        }

        let leaves_to_world = match (step.pre, step.post) {
            (Volume::Layer(_), Volume::World) => true,
            (Volume::Layer(from), Volume::Layer(to)) if to > from => false,
            _ => return StepOutcome::Continue,
        };

        if step.direction_z <= 0.0 {
            return StepOutcome::Continue;
        }

        if ledger.claim_transmission(step.track_id) {
            let scattered = ledger.is_scattered(step.track_id);
            acc.record_transmission(step.kinetic_energy_kev, step.direction_z, scattered);
        }

        if leaves_to_world {
            StepOutcome::Kill
        } else {
            StepOutcome::Continue
        }
    }

    /// Layers the stack does not have are booked as outside.
    fn region_of(&self, stack: &SlabStack, volume: Volume) -> RegionTag {
        match volume {
            Volume::Layer(idx) if idx.get() < stack.layer_count() => RegionTag::Layer(idx),
            _ => RegionTag::Outside,
        }
    }
}
