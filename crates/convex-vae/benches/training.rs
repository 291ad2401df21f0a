//! Benchmarks for VAE forward/backward passes.
//!
//! Run with: cargo bench -p convex-vae

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::SeedableRng;

use convex_config::{ConditionalVaeConfig, VaeConfig};
use convex_curves::HullWhiteSimulator;
use convex_vae::reparam::standard_normal;
use convex_vae::{ConditionalVae, Vae};

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

fn bench_vae_gradients(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let model = HullWhiteSimulator::new(0.15, 0.0075).unwrap();
    let vae = Vae::new(VaeConfig::new(10, 16, 1).with_alpha(5e-5), &mut rng).unwrap();

    let mut group = c.benchmark_group("vae_loss_and_gradients");
    for n in [64_usize, 1024] {
        let rates = model.simulate(10.0, &OFFSETS, n, &mut rng).unwrap().into_rates();
        let noise = standard_normal(n, 1, &mut rng);

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| vae.loss_and_gradients_with_noise(black_box(&rates), &noise).unwrap());
        });
    }
    group.finish();
}

fn bench_cartesian_generation(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let cvae = ConditionalVae::new(ConditionalVaeConfig::default(), &mut rng).unwrap();
    let conditions = DMatrix::from_column_slice(10, 1, &OFFSETS);

    c.bench_function("cvae_generate_100x10", |b| {
        let noise = standard_normal(100, 1, &mut rng);
        b.iter(|| cvae.generate_from_noise(black_box(&noise), &conditions).unwrap());
    });
}

criterion_group!(benches, bench_vae_gradients, bench_cartesian_generation);
criterion_main!(benches);
