//! Staircase hot-path benchmarks
//!
//! - recording a full 50-trial run
//! - convergence analysis over histories of increasing length
//! - threshold statistics over reversal windows

use std::time::Duration;

use adaptive_staircase::domain::models::convergence::{ConvergenceAnalyzer, ConvergenceConfig};
use adaptive_staircase::domain::models::staircase::{StaircaseConfig, StaircaseController, Trial};
use adaptive_staircase::domain::models::statistics::{threshold_from_reversals, StatisticsConfig};
use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

// =============================================================================
// Helper Functions
// =============================================================================

/// Responses from an observer with a threshold at `threshold`.
fn observed_run(config: StaircaseConfig, threshold: f64) -> StaircaseController {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut controller = StaircaseController::starting_at(config, start).unwrap();
    let mut n = 0;
    while !controller.is_complete() {
        n += 1;
        let correct = controller.current_level() >= threshold;
        controller
            .record_trial_at(correct, None, start + chrono::Duration::seconds(n))
            .unwrap();
    }
    controller
}

fn history(trials: u32) -> Vec<Trial> {
    let config = StaircaseConfig {
        target_reversals: 1000,
        threshold_reversals: Some(6),
        max_trials: trials,
        min_trials: trials,
        ..StaircaseConfig::default()
    };
    observed_run(config, 37.0).trials().to_vec()
}

fn reversal_levels(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 40.0 + ((i as f64) * 0.7).sin() * 4.0)
        .collect()
}

// =============================================================================
// Controller Benchmarks
// =============================================================================

fn bench_full_run(c: &mut Criterion) {
    let config = StaircaseConfig {
        target_reversals: 1000,
        ..StaircaseConfig::default()
    };

    c.bench_function("record_50_trials", |b| {
        b.iter(|| observed_run(black_box(config.clone()), black_box(37.0)))
    });
}

// =============================================================================
// Analyzer Benchmarks
// =============================================================================

fn bench_analyze(c: &mut Criterion) {
    let analyzer = ConvergenceAnalyzer::new(ConvergenceConfig::default()).unwrap();
    let mut group = c.benchmark_group("analyze");

    for trials in [10u32, 50, 200] {
        let history = history(trials);
        group.throughput(Throughput::Elements(u64::from(trials)));
        group.bench_with_input(BenchmarkId::from_parameter(trials), &history, |b, h| {
            b.iter(|| analyzer.analyze(black_box(h), Duration::from_secs(120), 37.0))
        });
    }
    group.finish();
}

// =============================================================================
// Statistics Benchmarks
// =============================================================================

fn bench_threshold(c: &mut Criterion) {
    let config = StatisticsConfig::default();
    let mut group = c.benchmark_group("threshold_from_reversals");

    for count in [6usize, 20, 100] {
        let levels = reversal_levels(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &levels, |b, l| {
            b.iter(|| threshold_from_reversals(black_box(l), &config))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_full_run, bench_analyze, bench_threshold);
criterion_main!(benches);
