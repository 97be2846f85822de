//! Run-lifecycle controller.
//!
//! [`RunController`] is what a host toolkit's run and event callbacks
//! talk to. It owns the configuration, the geometry, the reference store,
//! the per-run accumulator and the in-memory summary rows.
//!
//! # Lifecycle
//!
//! ```text
//! begin_run ─┬─ begin_event ─ inject_primary ─ route* ─┐
//!            └──────────────── (repeat per event) ─────┘
//! end_run ── row appended in memory
//! flush_summary / drop ── pending rows appended to the summary CSV
//! ```
//!
//! # Errors
//!
//! Only [`new`](RunController::new) and
//! [`flush_summary`](RunController::flush_summary) return errors.
//! Geometry setters reject bad values, log a warning and keep the
//! previous geometry. Dropping the controller flushes pending rows and
//! logs, rather than returns, any failure.

use std::fmt::Write as _;

use foilmu_core::{
    CrossSectionSource, GeometryError, Layer, LayerIndex, MaterialSpec, RunId, SlabStack,
};
use foilmu_physics::ComptonRetention;
use foilmu_reference::ReferenceStore;
use foilmu_summary::{append_rows, SummaryError, SummaryRow};

use crate::accumulator::RunAccumulator;
use crate::config::{ConfigError, EngineConfig};
use crate::derive::{derive_run, Advisory, Derivation, DerivationContext, RunParameters};
use crate::tracking::{DepositPolicy, StepOutcome, StepRecord, StepRouter, TrackLedger};

// ── EventScope ─────────────────────────────────────────────────────

/// Borrowed view for feeding one event into the current run.
///
/// Created by [`RunController::begin_event`], which has already cleared
/// the per-track ledger.
pub struct EventScope<'c> {
    ledger: &'c mut TrackLedger,
    acc: &'c mut RunAccumulator,
    stack: &'c SlabStack,
    router: StepRouter,
}

impl EventScope<'_> {
    /// Count one primary of `energy_kev` entering the stack.
    pub fn inject_primary(&mut self, energy_kev: f64) {
        self.acc.count_injection();
        self.acc.add_incident_energy(energy_kev);
    }

    /// Route one step of this event.
    pub fn route(&mut self, step: &StepRecord<'_>) -> StepOutcome {
        self.router.route(self.ledger, self.acc, self.stack, step)
    }

    /// The run accumulator, read-only.
    pub fn accumulator(&self) -> &RunAccumulator {
        self.acc
    }
}

// ── RunController ──────────────────────────────────────────────────

/// Owns one experiment's state across runs.
pub struct RunController {
    config: EngineConfig,
    stack: SlabStack,
    reference: ReferenceStore,
    compton: ComptonRetention,
    calculator: Option<Box<dyn CrossSectionSource>>,
    router: StepRouter,
    accumulator: RunAccumulator,
    ledger: TrackLedger,
    next_run: RunId,
    current_run: Option<RunId>,
    rows: Vec<SummaryRow>,
    flushed: usize,
    reference_reported: bool,
}

impl RunController {
    /// Create a controller for `stack`.
    ///
    /// The reference table is not read until the first run ends.
    pub fn new(config: EngineConfig, stack: SlabStack) -> Result<Self, ConfigError> {
        config.validate()?;
        let reference = ReferenceStore::new(config.reference_path.as_deref(), config.interpolation);
        let compton = ComptonRetention::new(config.compton_steps);
        tracing::debug!(
            compton_steps = compton.steps(),
            interpolation = ?config.interpolation,
            prefer_calculator_mu_tr = config.prefer_calculator_mu_tr,
            summary = %config.summary_path.display(),
            "run controller configured"
        );
        Ok(Self {
            config,
            stack,
            reference,
            compton,
            calculator: None,
            router: StepRouter::default(),
            accumulator: RunAccumulator::new(),
            ledger: TrackLedger::new(),
            next_run: RunId(0),
            current_run: None,
            rows: Vec::new(),
            flushed: 0,
            reference_reported: false,
        })
    }

    /// Attach the host toolkit's cross-section calculator.
    pub fn with_calculator(mut self, calculator: Box<dyn CrossSectionSource>) -> Self {
        self.calculator = Some(calculator);
        self
    }

    /// Replace the reference store built from the configuration.
    pub fn with_reference_store(mut self, reference: ReferenceStore) -> Self {
        self.reference = reference;
        self
    }

    /// Choose which particles' deposits are booked.
    pub fn with_deposit_policy(mut self, policy: DepositPolicy) -> Self {
        self.router = StepRouter::new(policy);
        self
    }

    // ── Run lifecycle ──────────────────────────────────────────

    /// Start a run: reset the accumulator and assign the next run ID.
    pub fn begin_run(&mut self) -> RunId {
        let id = self.next_run;
        self.next_run = id.next();
        self.current_run = Some(id);
        self.accumulator.reset();
        self.ledger.clear();
        tracing::debug!(run = id.0, "run started");
        id
    }

    /// Start an event within the current run.
    pub fn begin_event(&mut self) -> EventScope<'_> {
        self.ledger.clear();
        EventScope {
            ledger: &mut self.ledger,
            acc: &mut self.accumulator,
            stack: &self.stack,
            router: self.router,
        }
    }

    /// Route one step outside an [`EventScope`].
    pub fn route_step(&mut self, step: &StepRecord<'_>) -> StepOutcome {
        self.router
            .route(&mut self.ledger, &mut self.accumulator, &self.stack, step)
    }

    /// End the current run and derive its summary row.
    ///
    /// Returns `None`, and records nothing, when the run injected no
    /// primaries. [`Advisory::ReferenceUnavailable`] appears in the first
    /// derivation that lacks reference data and in no later one.
    pub fn end_run(&mut self) -> Option<Derivation> {
        let run_id = match self.current_run.take() {
            Some(id) => id,
            None => {
                let id = self.next_run;
                self.next_run = id.next();
                id
            }
        };
        tracing::debug!(run = run_id.0, processes = %self.process_report(), "process tally");

        let ctx = DerivationContext {
            reference: &self.reference,
            compton: &self.compton,
            calculator: self.calculator.as_deref(),
            prefer_calculator_mu_tr: self.config.prefer_calculator_mu_tr,
        };
        let params = RunParameters {
            run_id,
            stack: &self.stack,
        };
        let Some(mut derivation) = derive_run(&self.accumulator, params, ctx) else {
            tracing::debug!(run = run_id.0, "run had no events; no summary row");
            return None;
        };

        // A missing reference table is reported on the first run only.
        if self.reference_reported {
            derivation
                .advisories
                .retain(|a| *a != Advisory::ReferenceUnavailable);
        }
        for advisory in &derivation.advisories {
            if *advisory == Advisory::ReferenceUnavailable {
                self.reference_reported = true;
            }
            advisory.emit(run_id);
        }
        self.rows.push(derivation.row.clone());
        Some(derivation)
    }

    // ── Summary ────────────────────────────────────────────────

    /// Every row derived so far, flushed or not.
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Rows not yet written to the summary file.
    pub fn pending_rows(&self) -> &[SummaryRow] {
        &self.rows[self.flushed..]
    }

    /// Append pending rows to the configured summary file.
    ///
    /// On failure the rows stay pending and the error is logged and
    /// returned.
    pub fn flush_summary(&mut self) -> Result<usize, SummaryError> {
        let path = &self.config.summary_path;
        match append_rows(path, &self.rows[self.flushed..]) {
            Ok(written) => {
                self.flushed += written;
                if written > 0 {
                    tracing::info!(path = %path.display(), rows = written, "summary written");
                }
                Ok(written)
            }
            Err(err) => {
                tracing::error!(path = %path.display(), "cannot write summary: {err}");
                Err(err)
            }
        }
    }

    /// Process occurrence counts of the current run, one `name: count`
    /// per line in first-seen order.
    pub fn process_report(&self) -> String {
        let mut out = String::new();
        for (name, count) in self.accumulator.process_tally() {
            let _ = writeln!(out, "{name}: {count}");
        }
        out
    }

    // ── Geometry ───────────────────────────────────────────────

    /// Current geometry.
    pub fn stack(&self) -> &SlabStack {
        &self.stack
    }

    /// Set the foil thickness in mm.
    pub fn set_primary_thickness(&mut self, thickness_mm: f64) -> Result<(), GeometryError> {
        let result = self.stack.set_primary_thickness(thickness_mm);
        warn_rejected(result)
    }

    /// Set the first backing layer's thickness in mm. Zero removes backing.
    pub fn set_backing_thickness(&mut self, thickness_mm: f64) -> Result<(), GeometryError> {
        let result = self.stack.set_backing_thickness(thickness_mm);
        warn_rejected(result)
    }

    /// Set the world half-length in mm.
    pub fn set_world_half_mm(&mut self, world_half_mm: f64) -> Result<(), GeometryError> {
        let result = self.stack.set_world_half_mm(world_half_mm);
        warn_rejected(result)
    }

    /// Replace a layer's material.
    pub fn set_layer_material(
        &mut self,
        index: LayerIndex,
        material: MaterialSpec,
    ) -> Result<(), GeometryError> {
        let result = self.stack.set_layer_material(index, material);
        warn_rejected(result)
    }

    /// Append a backing layer.
    pub fn push_backing(&mut self, layer: Layer) -> Result<(), GeometryError> {
        let result = self.stack.push_backing(layer);
        warn_rejected(result)
    }

    /// Remove a backing layer. The primary absorber cannot be removed.
    pub fn remove_layer(&mut self, index: LayerIndex) -> Result<Layer, GeometryError> {
        let result = self.stack.remove_layer(index);
        if let Err(err) = &result {
            tracing::warn!("{err}");
        }
        result
    }

    // ── Accessors ──────────────────────────────────────────────

    /// The current run's accumulator.
    pub fn accumulator(&self) -> &RunAccumulator {
        &self.accumulator
    }

    /// Mutable access to the current run's accumulator.
    pub fn accumulator_mut(&mut self) -> &mut RunAccumulator {
        &mut self.accumulator
    }

    /// Both the track ledger and the accumulator, for hosts that route
    /// steps themselves.
    pub fn ledger_and_accumulator_mut(&mut self) -> (&mut TrackLedger, &mut RunAccumulator) {
        (&mut self.ledger, &mut self.accumulator)
    }

    /// The reference store.
    pub fn reference(&self) -> &ReferenceStore {
        &self.reference
    }

    /// The configuration this controller was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The Compton retention estimator.
    pub fn compton(&self) -> &ComptonRetention {
        &self.compton
    }
}

fn warn_rejected(result: Result<(), GeometryError>) -> Result<(), GeometryError> {
    if let Err(err) = &result {
        tracing::warn!("{err}");
    }
    result
}

impl Drop for RunController {
    fn drop(&mut self) {
        if self.flushed < self.rows.len() {
            // Errors are already logged by flush_summary.
            let _ = self.flush_summary();
        }
    }
}
