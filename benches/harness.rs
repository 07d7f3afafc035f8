//! Benchmarks for the metric suite and the full evaluation harness.

#![allow(clippy::cast_precision_loss)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hurdle_eval::synthetic::{generate, SyntheticConfig};
use hurdle_eval::{metrics, EvaluationHarness};

fn benchmark_metric_suite(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");

    for size in &[100_usize, 1000, 10_000] {
        let y_true: Vec<f64> = (0..*size).map(|i| (i % 97) as f64).collect();
        let y_pred: Vec<f64> = (0..*size).map(|i| (i % 89) as f64 + 0.5).collect();

        group.bench_function(format!("regression_report_{size}"), |b| {
            b.iter(|| metrics::regression_report("bench", black_box(&y_true), black_box(&y_pred)));
        });

        group.bench_function(format!("spearman_{size}"), |b| {
            b.iter(|| metrics::spearman(black_box(&y_true), black_box(&y_pred)));
        });
    }

    group.finish();
}

fn benchmark_full_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("harness");
    group.sample_size(10);

    for rows in &[200_usize, 1000] {
        let data = generate(&SyntheticConfig {
            rows: *rows,
            ..SyntheticConfig::default()
        })
        .expect("synthetic data");
        let harness = EvaluationHarness::default();

        group.bench_function(format!("evaluate_{rows}_rows"), |b| {
            b.iter(|| harness.evaluate(black_box(&data)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_metric_suite, benchmark_full_evaluation);
criterion_main!(benches);
