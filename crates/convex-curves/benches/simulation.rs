//! Benchmarks for curve simulation.
//!
//! Run with: cargo bench -p convex-curves

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;

use convex_curves::HullWhiteSimulator;

const OFFSETS: [f64; 10] = [
    1.0 / 365.0,
    0.5,
    1.0,
    2.0,
    3.0,
    5.0,
    7.0,
    10.0,
    15.0,
    20.0,
];

fn bench_simulate(c: &mut Criterion) {
    let model = HullWhiteSimulator::new(0.15, 0.0075).unwrap();
    let mut group = c.benchmark_group("simulate");

    for n in [256_usize, 1024, 16_384] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut rng = StdRng::seed_from_u64(42);
            b.iter(|| {
                let curves = model.simulate(10.0, &OFFSETS, n, &mut rng).unwrap();
                black_box(curves)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_simulate);
criterion_main!(benches);
