// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use wellcp_bench::falling_population;
use wellcp_core::{Direction, ExecutionContext};
use wellcp_eval::{SweepConfig, sweep_thresholds};
use wellcp_events::{extract_event_times, population_threshold};

fn benchmark_extract_events_384x5e3(c: &mut Criterion) {
    let signals = falling_population(5_000, 384);

    c.bench_function("extract_events_384x5e3", |b| {
        b.iter(|| {
            let threshold = population_threshold(black_box(&signals), 1.0)
                .expect("population threshold should succeed");
            extract_event_times(&signals, &threshold, Direction::Falling)
                .expect("event extraction should succeed");
        })
    });
}

fn benchmark_sweep_plate_96x2e3(c: &mut Criterion) {
    let signals = falling_population(2_000, 96);
    let config = SweepConfig::default();
    let ctx = ExecutionContext::new();

    let mut group = c.benchmark_group("sweep_thresholds");
    group.sample_size(10);
    group.bench_function("plate_96x2e3", |b| {
        b.iter(|| {
            sweep_thresholds(black_box(&signals), Direction::Falling, &config, &ctx)
                .expect("threshold sweep should succeed");
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_extract_events_384x5e3,
    benchmark_sweep_plate_96x2e3
);
criterion_main!(benches);
