//! End-to-end runs through the controller: routing, derivation, and the
//! summary file.

use std::fs;

use foilmu_core::{Layer, LayerIndex, MaterialSpec, RegionTag, RunId, SlabStack, TrackId};
use foilmu_engine::{
    Advisory, DepositPolicy, EngineConfig, RunController, StepOutcome, StepRecord, Volume,
    TRANSPORT_PROCESS,
};
use foilmu_reference::{Interpolation, ReferenceStore, ReferenceTable};
use foilmu_summary::{read_rows, ClampFlag};
use foilmu_test_utils::fixtures::{bare_tungsten, unknown_density_foil};
use foilmu_test_utils::{init_tracing, ScratchDir};

const ENERGY_KEV: f64 = 1000.0;

fn no_reference() -> ReferenceStore {
    ReferenceStore::preloaded("absent.csv", ReferenceTable::default(), Interpolation::Linear)
}

fn controller(scratch: &ScratchDir, stack: SlabStack) -> RunController {
    init_tracing();
    let config = EngineConfig {
        summary_path: scratch.join("summary.csv"),
        ..EngineConfig::default()
    };
    RunController::new(config, stack)
        .unwrap()
        .with_reference_store(no_reference())
}

fn exit_step(track: u32, pre: Volume, post: Volume, energy: f64) -> StepRecord<'static> {
    StepRecord {
        track_id: TrackId(track),
        is_gamma: true,
        process: Some(TRANSPORT_PROCESS),
        pre,
        post,
        on_boundary: true,
        direction_z: 1.0,
        kinetic_energy_kev: energy,
        energy_deposit_kev: 0.0,
    }
}

/// A secondary photon absorbed in `pre`, depositing `deposit_kev` locally.
fn deposit_step(pre: Volume, deposit_kev: f64) -> StepRecord<'static> {
    StepRecord {
        track_id: TrackId(3),
        is_gamma: true,
        process: Some("phot"),
        pre,
        post: pre,
        on_boundary: false,
        direction_z: 0.3,
        kinetic_energy_kev: 0.0,
        energy_deposit_kev: deposit_kev,
    }
}

fn electron_step(pre: Volume, deposit_kev: f64) -> StepRecord<'static> {
    StepRecord {
        track_id: TrackId(2),
        is_gamma: false,
        process: Some("eIoni"),
        ..deposit_step(pre, deposit_kev)
    }
}

/// Inject `n` primaries, of which the first `uncollided` leave the foil
/// straight into the world.
fn run_uncollided(c: &mut RunController, n: u64, uncollided: u64) {
    c.begin_run();
    for i in 0..n {
        let mut event = c.begin_event();
        event.inject_primary(ENERGY_KEV);
        if i < uncollided {
            let step = exit_step(1, Volume::PRIMARY, Volume::World, ENERGY_KEV);
            assert_eq!(event.route(&step), StepOutcome::Kill);
        }
    }
}

#[test]
fn thin_tungsten_foil_at_one_mev() {
    let scratch = ScratchDir::new("thin-foil");
    let mut c = controller(&scratch, bare_tungsten());
    run_uncollided(&mut c, 100_000, 99_500);
    let d = c.end_run().unwrap();
    let row = &d.row;

    assert_eq!(row.run_id, RunId(0));
    assert_eq!(row.n_injected, 100_000);
    assert_eq!(row.n_uncollided, 99_500);
    assert!((row.t_counts - 0.995).abs() < 1e-12);
    assert_eq!(row.clamp_flag, ClampFlag::Unclamped);
    assert!((row.energy_kev - ENERGY_KEV).abs() < 1e-9);
    assert!((row.thickness_nm - 250.0).abs() < 1e-9);

    let expected_mu = -(0.995f64).ln() / 2.5e-4;
    assert!((row.mu_counts_per_mm - expected_mu).abs() < 1e-6);
    assert!((row.mu_counts_per_mm - 20.05).abs() < 0.01);
    assert!((row.mu_counts_cm2_g - expected_mu * 10.0 / 19.3).abs() < 1e-6);

    let sigma = (0.995 * 0.005 / 100_000.0f64).sqrt();
    assert!((row.sigma_t_counts - sigma).abs() < 1e-12);
    assert!(row.sigma_mu_counts_cm2_g > 0.0);

    assert!(d.has_advisory(|a| matches!(a, Advisory::HighTransmission { .. })));
    assert!(!d.has_advisory(|a| matches!(a, Advisory::TransmissionClamped { .. })));
    assert!(d.has_advisory(|a| *a == Advisory::ReferenceUnavailable));
}

#[test]
fn header_only_reference_zeroes_reference_columns() {
    let scratch = ScratchDir::new("header-only");
    let reference = scratch.join("reference.csv");
    fs::write(&reference, "energy_keV,mu_cm2_g,mu_en_cm2_g\n").unwrap();

    let config = EngineConfig {
        reference_path: Some(reference.clone()),
        summary_path: scratch.join("summary.csv"),
        ..EngineConfig::default()
    };
    let store = ReferenceStore::with_candidates(vec![reference], Interpolation::Linear);
    let mut c = RunController::new(config, bare_tungsten())
        .unwrap()
        .with_reference_store(store);

    run_uncollided(&mut c, 1000, 900);
    let row = c.end_run().unwrap().row;

    assert_eq!(row.mu_ref_cm2_g, 0.0);
    assert_eq!(row.mu_en_ref_cm2_g, 0.0);
    assert_eq!(row.delta_mu_percent, 0.0);
    assert_eq!(row.delta_mu_en_percent, 0.0);
    assert_eq!(row.delta_mu_en_cpe_percent, 0.0);
    assert_eq!(row.delta_mu_counts_vs_mu_calc_percent, 0.0);
    assert_eq!(row.delta_mu_en_cpe_vs_mu_tr_percent, 0.0);
    assert!(row.mu_counts_per_mm > 0.0);
}

#[test]
fn zero_event_run_writes_nothing() {
    let scratch = ScratchDir::new("zero-events");
    let mut c = controller(&scratch, bare_tungsten());
    c.begin_run();
    assert!(c.end_run().is_none());
    assert_eq!(c.flush_summary().unwrap(), 0);
    assert!(!scratch.join("summary.csv").exists());
}

#[test]
fn end_run_without_begin_takes_next_id() {
    let scratch = ScratchDir::new("no-begin");
    let mut c = controller(&scratch, bare_tungsten());
    run_uncollided(&mut c, 10, 5);
    assert_eq!(c.end_run().unwrap().row.run_id, RunId(0));

    c.begin_event().inject_primary(ENERGY_KEV);
    assert_eq!(c.end_run().unwrap().row.run_id, RunId(1));
    assert_eq!(c.begin_run(), RunId(2));
}

#[test]
fn repeated_flush_writes_header_once() {
    let scratch = ScratchDir::new("flush");
    let path = scratch.join("summary.csv");
    let mut c = controller(&scratch, bare_tungsten());

    run_uncollided(&mut c, 100, 50);
    c.end_run().unwrap();
    assert_eq!(c.flush_summary().unwrap(), 1);

    run_uncollided(&mut c, 100, 25);
    c.end_run().unwrap();
    assert_eq!(c.flush_summary().unwrap(), 1);
    assert_eq!(c.flush_summary().unwrap(), 0);
    assert!(c.pending_rows().is_empty());

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("run_id")).count(), 1);
    let rows = read_rows(text.as_bytes()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].run_id, RunId(0));
    assert_eq!(rows[1].run_id, RunId(1));
    assert_eq!(rows[1].n_uncollided, 25);
}

#[test]
fn drop_flushes_pending_rows() {
    let scratch = ScratchDir::new("drop");
    let path = scratch.join("summary.csv");
    {
        let mut c = controller(&scratch, bare_tungsten());
        run_uncollided(&mut c, 10, 9);
        c.end_run().unwrap();
    }
    let rows = read_rows(fs::read_to_string(&path).unwrap().as_bytes()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].n_injected, 10);
}

#[test]
fn electron_deposits_need_opt_in() {
    let scratch = ScratchDir::new("deposit-policy");
    let mut gammas_only = controller(&scratch, bare_tungsten());
    let mut all =
        controller(&scratch, bare_tungsten()).with_deposit_policy(DepositPolicy::AllParticles);

    for c in [&mut gammas_only, &mut all] {
        c.begin_run();
        let mut event = c.begin_event();
        event.inject_primary(ENERGY_KEV);
        event.route(&electron_step(Volume::PRIMARY, 5.0));
        event.route(&deposit_step(Volume::PRIMARY, 1.0));
    }
    let default_row = gammas_only.end_run().unwrap().row;
    let all_row = all.end_run().unwrap().row;

    assert!((default_row.e_abs_kev - 1.0).abs() < 1e-12);
    assert!((all_row.e_abs_kev - 6.0).abs() < 1e-12);
    assert!(all_row.mu_en_raw_cm2_g > default_row.mu_en_raw_cm2_g);
}

#[test]
fn missing_reference_reported_on_first_run_only() {
    let scratch = ScratchDir::new("reference-once");
    let mut c = controller(&scratch, bare_tungsten());
    run_uncollided(&mut c, 10, 5);
    assert!(c.end_run().unwrap().has_advisory(|a| *a == Advisory::ReferenceUnavailable));
    run_uncollided(&mut c, 10, 5);
    assert!(!c.end_run().unwrap().has_advisory(|a| *a == Advisory::ReferenceUnavailable));
}

#[test]
fn one_transmission_per_track_through_backing() {
    let scratch = ScratchDir::new("backing-route");
    let mut stack = bare_tungsten();
    stack.set_backing_thickness(0.05).unwrap();
    let mut c = controller(&scratch, stack);
    let backing = Volume::Layer(LayerIndex(1));

    c.begin_run();
    for _ in 0..3 {
        let mut event = c.begin_event();
        event.inject_primary(ENERGY_KEV);
        let into_backing = exit_step(1, Volume::PRIMARY, backing, ENERGY_KEV);
        assert_eq!(event.route(&into_backing), StepOutcome::Continue);
        let into_world = exit_step(1, backing, Volume::World, ENERGY_KEV);
        assert_eq!(event.route(&into_world), StepOutcome::Kill);
    }
    let row = c.end_run().unwrap().row;
    assert_eq!(row.n_trans_total, 3);
    assert_eq!(row.n_uncollided, 3);
}

#[test]
fn single_layer_slab_matches_primary() {
    let scratch = ScratchDir::new("single-layer");
    let mut c = controller(&scratch, bare_tungsten());
    c.begin_run();
    for _ in 0..1000 {
        let mut event = c.begin_event();
        event.inject_primary(ENERGY_KEV);
        event.route(&deposit_step(Volume::PRIMARY, 0.4));
        event.route(&exit_step(1, Volume::PRIMARY, Volume::World, ENERGY_KEV));
    }
    let row = c.end_run().unwrap().row;

    assert!(row.e_abs_kev > 0.0);
    assert_eq!(row.e_abs_backing_kev, 0.0);
    assert_eq!(row.e_abs_slab_kev, row.e_abs_kev);
    assert_eq!(row.absorbed_fraction_slab, row.absorbed_fraction);
    assert!((row.mu_en_raw_slab_cm2_g - row.mu_en_raw_cm2_g).abs() <= 1e-12 * row.mu_en_raw_cm2_g);
    assert!((row.mu_en_raw_slab_per_mm - row.mu_en_raw_per_mm).abs() <= 1e-12 * row.mu_en_raw_per_mm);

    let fraction = 0.4 / ENERGY_KEV;
    let mass_path = 19.3 * 2.5e-5;
    assert!((row.mu_en_raw_cm2_g - fraction / mass_path).abs() < 1e-9);
    assert!(row.mu_eff_per_mm > 0.0);
}

#[test]
fn backing_without_density_inherits_primary_density() {
    let scratch = ScratchDir::new("inherit-density");
    let backing = Layer::new(0.01, MaterialSpec::new("unlisted", 0.0).unwrap()).unwrap();
    let stack = bare_tungsten().with_backing(backing).unwrap();
    let mut c = controller(&scratch, stack);
    let backing = Volume::Layer(LayerIndex(1));

    c.begin_run();
    for _ in 0..100 {
        let mut event = c.begin_event();
        event.inject_primary(ENERGY_KEV);
        event.route(&deposit_step(Volume::PRIMARY, 1.0));
        event.route(&deposit_step(backing, 3.0));
    }
    let row = c.end_run().unwrap().row;

    assert!((row.e_abs_backing_kev - 300.0).abs() < 1e-9);
    assert!((row.e_abs_slab_kev - 400.0).abs() < 1e-9);
    assert_eq!(row.backing_material, "unlisted");
    assert!((row.backing_thickness_um - 10.0).abs() < 1e-9);

    let slab_cm = 2.5e-5 + 1.0e-3;
    let mass_path = 19.3 * slab_cm;
    let fraction = 400.0 / (100.0 * ENERGY_KEV);
    assert!((row.mu_en_raw_slab_cm2_g - fraction / mass_path).abs() < 1e-9);
    assert!((row.mu_en_raw_slab_per_mm - row.mu_en_raw_slab_cm2_g * 19.3 / 10.0).abs() < 1e-9);
}

#[test]
fn unknown_density_zeroes_mass_coefficients() {
    let scratch = ScratchDir::new("unknown-density");
    let mut c = controller(&scratch, unknown_density_foil(0.001));
    c.begin_run();
    for i in 0..100 {
        let mut event = c.begin_event();
        event.inject_primary(ENERGY_KEV);
        event.route(&deposit_step(Volume::PRIMARY, 2.0));
        if i < 90 {
            event.route(&exit_step(1, Volume::PRIMARY, Volume::World, ENERGY_KEV));
        }
    }
    let d = c.end_run().unwrap();
    let row = &d.row;

    assert!(row.mu_counts_per_mm > 0.0);
    assert_eq!(row.mu_counts_cm2_g, 0.0);
    assert_eq!(row.sigma_mu_counts_cm2_g, 0.0);
    assert_eq!(row.mu_en_raw_cm2_g, 0.0);
    assert_eq!(row.mu_en_raw_per_mm, 0.0);
    assert_eq!(row.mu_en_raw_slab_cm2_g, 0.0);
    assert_eq!(row.mu_eff_cm2_g, 0.0);
    assert!(d.has_advisory(|a| matches!(a, Advisory::UnknownDensity { material } if material == "mystery")));
}

#[test]
fn geometry_changes_between_runs_reach_the_row() {
    let scratch = ScratchDir::new("geometry-change");
    let mut c = controller(&scratch, bare_tungsten());

    run_uncollided(&mut c, 10, 5);
    let first = c.end_run().unwrap().row;

    c.set_primary_thickness(5.0e-4).unwrap();
    assert!(c.set_primary_thickness(0.0).is_err());
    run_uncollided(&mut c, 10, 5);
    let second = c.end_run().unwrap().row;

    assert!((first.thickness_nm - 250.0).abs() < 1e-9);
    assert!((second.thickness_nm - 500.0).abs() < 1e-9);
    assert!((first.mu_counts_per_mm - 2.0 * second.mu_counts_per_mm).abs() < 1e-6);
}

#[test]
fn secondary_photons_count_as_scattered() {
    let scratch = ScratchDir::new("secondary");
    let mut c = controller(&scratch, bare_tungsten());
    c.begin_run();
    {
        let mut event = c.begin_event();
        event.inject_primary(ENERGY_KEV);
        event.route(&exit_step(1, Volume::PRIMARY, Volume::World, ENERGY_KEV));
        event.route(&exit_step(4, Volume::PRIMARY, Volume::World, 59.3));
        assert_eq!(event.accumulator().transmitted_count(), 2);
    }
    let row = c.end_run().unwrap().row;
    assert_eq!(row.n_uncollided, 1);
    assert_eq!(row.n_scattered, 1);
    assert!((row.e_trans_tot_kev - 1059.3).abs() < 1e-9);
    assert!((row.t_counts_scattered - 1.0).abs() < 1e-12);
    assert_eq!(c.accumulator().deposited_kev(RegionTag::PRIMARY), 0.0);
}
