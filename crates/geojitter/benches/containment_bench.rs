//! Criterion benchmarks for point-in-polygon.
//! Ring sizes: {4, 16, 64, 256, 1024} vertices on a jittered circle.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use geojitter::geom::{Coord, Polygon};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn star_polygon(n: usize, seed: u64) -> Polygon {
    let mut rng = StdRng::seed_from_u64(seed);
    let ring = (0..n)
        .map(|k| {
            let theta = std::f64::consts::TAU * k as f64 / n as f64;
            let r = rng.gen_range(0.6..1.0);
            Coord::new(r * theta.cos(), r * theta.sin())
        })
        .collect();
    Polygon::new(ring).unwrap()
}

fn queries(m: usize, seed: u64) -> Vec<Coord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..m)
        .map(|_| Coord::new(rng.gen_range(-1.2..1.2), rng.gen_range(-1.2..1.2)))
        .collect()
}

fn bench_contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("contains");
    let pts = queries(1000, 7);
    for &n in &[4usize, 16, 64, 256, 1024] {
        let poly = star_polygon(n, 42);
        group.bench_with_input(BenchmarkId::new("crossing_number", n), &n, |b, _| {
            b.iter(|| pts.iter().filter(|p| poly.contains(**p)).count())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_contains);
criterion_main!(benches);
