//! Criterion benchmarks for a full synthetic run through the controller.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use foilmu_bench::{LayerPhysics, SyntheticBeam};
use foilmu_core::SlabStack;
use foilmu_engine::{EngineConfig, RunController};
use foilmu_test_utils::ScratchDir;

/// Benchmark: 10K events on a 1 mm tungsten foil, routing and derivation included.
fn bench_synthetic_run_10k(c: &mut Criterion) {
    let scratch = ScratchDir::new("bench-run");
    let mut stack = SlabStack::tungsten_foil();
    stack.set_primary_thickness(1.0).unwrap();
    let config = EngineConfig {
        summary_path: scratch.join("summary.csv"),
        ..EngineConfig::default()
    };
    let mut controller = RunController::new(config, stack).unwrap();
    let mut beam = SyntheticBeam::new(1000.0, vec![LayerPhysics::tungsten_1mev()], 42);

    c.bench_function("synthetic_run_10k", |b| {
        b.iter(|| black_box(beam.run(&mut controller, 10_000)));
    });
}

criterion_group!(benches, bench_synthetic_run_10k);
criterion_main!(benches);
