//! Criterion benchmarks for the distribution metrics.
//! Sample sizes: n in {100, 1000, 5000}; KS sweep at granularity 100.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use geojitter::compare::{ks_statistic, wasserstein_1d};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn sample(n: usize, shift: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen::<f64>() * 10.0 + shift).collect()
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");
    for &n in &[100usize, 1000, 5000] {
        let a = sample(n, 0.0, 3);
        let b = sample(n, 0.5, 4);
        group.bench_with_input(BenchmarkId::new("wasserstein", n), &n, |bch, _| {
            bch.iter(|| wasserstein_1d(&a, &b).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("ks_g100", n), &n, |bch, _| {
            bch.iter(|| ks_statistic(&a, &b, 100).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_metrics);
criterion_main!(benches);
