//! Foil thickness sweep with a synthetic 1 MeV beam.
//!
//! Demonstrates: read configuration from `FOILMU_*` variables → build a
//! controller → run one synthetic run per thickness → write the summary.
//!
//! ```text
//! RUST_LOG=info FOILMU_SUMMARY_CSV=sweep.csv cargo run -p foilmu-bench --example thickness_sweep
//! ```

use foilmu_bench::{LayerPhysics, SyntheticBeam};
use foilmu_core::SlabStack;
use foilmu_engine::{EngineConfig, RunController};
use tracing_subscriber::EnvFilter;

const THICKNESSES_MM: [f64; 5] = [0.1, 0.25, 0.5, 1.0, 2.0];
const EVENTS: u64 = 50_000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = EngineConfig::from_env();
    let summary = config.summary_path.clone();
    let physics = LayerPhysics::tungsten_1mev();
    let mut controller = RunController::new(config, SlabStack::tungsten_foil())
        .unwrap()
        .with_calculator(Box::new(physics));
    let mut beam = SyntheticBeam::new(1000.0, vec![physics], 2024);

    println!("=== foilmu thickness sweep ({EVENTS} primaries per run) ===\n");
    println!(
        "{:>10} {:>10} {:>12} {:>12} {:>12}",
        "t [mm]", "T", "mu [1/mm]", "sigma_mu", "mu_calc"
    );

    for thickness in THICKNESSES_MM {
        if controller.set_primary_thickness(thickness).is_err() {
            continue;
        }
        let Some(d) = beam.run(&mut controller, EVENTS) else {
            continue;
        };
        let row = &d.row;
        let sigma_mu_per_mm = row.sigma_mu_counts_cm2_g * row.density_g_cm3 / 10.0;
        println!(
            "{:>10.3} {:>10.5} {:>12.5} {:>12.5} {:>12.5}",
            thickness, row.t_counts, row.mu_counts_per_mm, sigma_mu_per_mm, row.mu_calc_per_mm
        );
    }

    match controller.flush_summary() {
        Ok(n) => println!("\n{n} rows appended to {}", summary.display()),
        Err(err) => eprintln!("\nsummary not written: {err}"),
    }
}
