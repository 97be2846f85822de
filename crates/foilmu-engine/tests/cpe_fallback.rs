//! Which estimate ends up in the CPE μ_en columns.
//!
//! Order: reference μ_en/μ ratio applied to the counts μ, then the
//! calculator's μ_tr when preferred, then the raw deposited-energy μ_en.

use foilmu_core::{GammaProcess, TrackId};
use foilmu_engine::{EngineConfig, RunController, StepRecord, Volume, TRANSPORT_PROCESS};
use foilmu_reference::{Interpolation, ReferenceRow, ReferenceStore, ReferenceTable};
use foilmu_summary::SummaryRow;
use foilmu_test_utils::fixtures::bare_tungsten;
use foilmu_test_utils::{
    init_tracing, write_reference_csv, ConstantCrossSections, ScratchDir, TUNGSTEN_REFERENCE,
};

const ENERGY_KEV: f64 = 1000.0;

fn calculator() -> ConstantCrossSections {
    ConstantCrossSections::new()
        .with(GammaProcess::Photoelectric, 0.4)
        .with(GammaProcess::Compton, 0.8)
        .with(GammaProcess::Rayleigh, 0.05)
}

fn store(rows: &[(f64, f64, f64)]) -> ReferenceStore {
    let rows = rows
        .iter()
        .map(|&(energy_kev, mu_cm2_g, mu_en_cm2_g)| ReferenceRow {
            energy_kev,
            mu_cm2_g,
            mu_en_cm2_g,
        })
        .collect();
    ReferenceStore::preloaded(
        "reference.csv",
        ReferenceTable::from_rows(rows),
        Interpolation::Linear,
    )
}

/// Run 1000 primaries with 800 uncollided and 0.5 keV deposited each by
/// an absorbed secondary photon.
fn derive(
    scratch: &ScratchDir,
    reference: ReferenceStore,
    calculator: Option<ConstantCrossSections>,
    prefer_mu_tr: bool,
) -> SummaryRow {
    init_tracing();
    let config = EngineConfig {
        prefer_calculator_mu_tr: prefer_mu_tr,
        summary_path: scratch.join("summary.csv"),
        ..EngineConfig::default()
    };
    let mut c = RunController::new(config, bare_tungsten())
        .unwrap()
        .with_reference_store(reference);
    if let Some(calc) = calculator {
        c = c.with_calculator(Box::new(calc));
    }

    c.begin_run();
    for i in 0..1000 {
        let mut event = c.begin_event();
        event.inject_primary(ENERGY_KEV);
        event.route(&StepRecord {
            track_id: TrackId(3),
            is_gamma: true,
            process: Some("phot"),
            pre: Volume::PRIMARY,
            post: Volume::PRIMARY,
            on_boundary: false,
            direction_z: 0.0,
            kinetic_energy_kev: 0.0,
            energy_deposit_kev: 0.5,
        });
        if i < 800 {
            event.route(&StepRecord {
                track_id: TrackId::PRIMARY,
                is_gamma: true,
                process: Some(TRANSPORT_PROCESS),
                pre: Volume::PRIMARY,
                post: Volume::World,
                on_boundary: true,
                direction_z: 1.0,
                kinetic_energy_kev: ENERGY_KEV,
                energy_deposit_kev: 0.0,
            });
        }
    }
    c.end_run().unwrap().row
}

#[test]
fn reference_ratio_wins() {
    let scratch = ScratchDir::new("cpe-ref");
    let row = derive(&scratch, store(&TUNGSTEN_REFERENCE), Some(calculator()), true);

    let ratio = 0.03787 / 0.06618;
    assert!((row.mu_ref_cm2_g - 0.06618).abs() < 1e-12);
    assert!((row.mu_en_ref_cm2_g - 0.03787).abs() < 1e-12);
    assert!((row.mu_en_cpe_cm2_g - row.mu_counts_cm2_g * ratio).abs() < 1e-9);
    assert!((row.mu_en_cpe_per_mm - row.mu_counts_per_mm * ratio).abs() < 1e-9);
    assert_eq!(row.mu_en_cm2_g, row.mu_en_cpe_cm2_g);
    assert_eq!(row.mu_en_per_mm, row.mu_en_cpe_per_mm);

    let expected_delta = (row.mu_counts_cm2_g - 0.06618) / 0.06618 * 100.0;
    assert!((row.delta_mu_percent - expected_delta).abs() < 1e-9);
    assert!(row.delta_mu_counts_vs_mu_calc_percent != 0.0);
}

#[test]
fn calculator_mu_tr_when_no_reference() {
    let scratch = ScratchDir::new("cpe-mu-tr");
    let row = derive(&scratch, store(&[]), Some(calculator()), true);

    assert_eq!(row.mu_ref_cm2_g, 0.0);
    assert!(row.mu_tr_cm2_g > 0.0);
    assert!(row.mu_tr_per_mm < row.mu_calc_per_mm);
    assert!((row.mu_calc_per_mm - 1.25).abs() < 1e-12);
    assert_eq!(row.mu_en_cpe_cm2_g, row.mu_tr_cm2_g);
    assert_eq!(row.mu_en_cpe_per_mm, row.mu_tr_per_mm);
    assert_eq!(row.delta_mu_en_cpe_vs_mu_tr_percent, 0.0);
}

#[test]
fn raw_when_mu_tr_not_preferred() {
    let scratch = ScratchDir::new("cpe-raw-pref");
    let row = derive(&scratch, store(&[]), Some(calculator()), false);

    assert!(row.mu_tr_cm2_g > 0.0);
    assert_eq!(row.mu_en_cpe_cm2_g, row.mu_en_raw_cm2_g);
    assert_eq!(row.mu_en_cpe_per_mm, row.mu_en_raw_per_mm);
}

#[test]
fn raw_without_calculator() {
    let scratch = ScratchDir::new("cpe-raw-calc");
    let row = derive(&scratch, store(&[]), None, true);

    assert_eq!(row.mu_calc_cm2_g, 0.0);
    assert_eq!(row.mu_tr_cm2_g, 0.0);
    assert_eq!(row.mu_en_cpe_cm2_g, row.mu_en_raw_cm2_g);
    assert!(row.mu_en_raw_cm2_g > 0.0);
    assert_eq!(row.delta_mu_counts_vs_mu_calc_percent, 0.0);
}

#[test]
fn zero_mu_en_reference_falls_through() {
    let scratch = ScratchDir::new("cpe-zero-ref");
    let row = derive(
        &scratch,
        store(&[(500.0, 0.1, 0.0), (1500.0, 0.05, 0.0)]),
        Some(calculator()),
        true,
    );

    assert!(row.mu_ref_cm2_g > 0.0);
    assert_eq!(row.mu_en_ref_cm2_g, 0.0);
    assert_eq!(row.mu_en_cpe_cm2_g, row.mu_tr_cm2_g);
    assert_eq!(row.delta_mu_en_cpe_percent, 0.0);
}

#[test]
fn calculator_for_other_material_counts_as_absent() {
    let scratch = ScratchDir::new("cpe-other-material");
    let calc = calculator().for_material("G4_Al");
    let row = derive(&scratch, store(&[]), Some(calc), true);

    assert_eq!(row.mu_calc_cm2_g, 0.0);
    assert_eq!(row.mu_en_cpe_cm2_g, row.mu_en_raw_cm2_g);
}

#[test]
fn reference_loaded_from_configured_file() {
    let scratch = ScratchDir::new("cpe-file");
    let path = scratch.join("tungsten.csv");
    write_reference_csv(&path, &TUNGSTEN_REFERENCE).unwrap();

    let config = EngineConfig {
        reference_path: Some(path.clone()),
        summary_path: scratch.join("summary.csv"),
        ..EngineConfig::default()
    };
    let mut c = RunController::new(config, bare_tungsten()).unwrap();
    c.begin_run();
    c.begin_event().inject_primary(900.0);
    let row = c.end_run().unwrap().row;

    assert_eq!(c.reference().source(), Some(path.as_path()));
    let expected_mu = 0.08457 + (0.06618 - 0.08457) * 0.5;
    assert!((row.mu_ref_cm2_g - expected_mu).abs() < 1e-12);
}
