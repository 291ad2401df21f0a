//! Integration test: Monte Carlo moments of simulated zero rates.
//!
//! With `a = 0.15`, `sigma = 0.0075` and `t = 10`, every simulated rate is
//! Gaussian with mean `0.5 G^2 y / Delta` and variance `(G / Delta)^2 y`.
//! A large batch must reproduce both within sampling error.

use std::sync::Arc;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use convex_config::{SimulatorConfig, ZeroCurveConfig};
use convex_curves::prelude::*;

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

#[test]
fn test_state_variance_closed_form() {
    let model = HullWhiteSimulator::new(0.15, 0.0075).unwrap();
    let a: f64 = 0.15;
    let sigma: f64 = 0.0075;
    let t: f64 = 10.0;
    let expected = sigma * sigma * (1.0 - (-2.0 * a * t).exp()) / (2.0 * a);

    assert_relative_eq!(model.y(t), expected, max_relative = 1e-14);
}

#[test]
fn test_worked_example_shape() {
    let model = HullWhiteSimulator::new(0.15, 0.0075).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let curves = model.simulate(10.0, &OFFSETS, 1024, &mut rng).unwrap();

    assert_eq!(curves.rates().shape(), (1024, 10));
    assert_eq!(curves.states().len(), 1024);
    assert!(curves.rates().iter().all(|r| r.is_finite()));
}

#[test]
fn test_monte_carlo_moments() {
    let model = HullWhiteSimulator::new(0.15, 0.0075).unwrap();
    let mut rng = StdRng::seed_from_u64(2024);
    let n = 200_000;
    let curves = model.simulate(10.0, &OFFSETS, n, &mut rng).unwrap();

    println!("offset | mean | expected | variance | expected");
    for (i, &delta) in OFFSETS.iter().enumerate() {
        let mean = curves.column_mean(i);
        let variance = curves.column_variance(i);
        let expected_mean = model.expected_rate(10.0, delta).unwrap();
        let expected_variance = model.theoretical_variance(10.0, delta).unwrap();

        println!(
            "{delta:8.4} | {mean:+.6} | {expected_mean:+.6} | {variance:.4e} | {:.4e}",
            expected_variance
        );

        // Five standard errors of the sample mean.
        let tolerance = 5.0 * (expected_variance / n as f64).sqrt();
        assert!(
            (mean - expected_mean).abs() < tolerance,
            "mean at offset {delta}: {mean} vs {expected_mean}"
        );
        // The convexity term is tiny, so the mean is close to zero.
        assert!(mean.abs() < 1e-3);

        assert_relative_eq!(variance, expected_variance, max_relative = 0.02);
    }
}

#[test]
fn test_config_with_pillar_curve() {
    let config = SimulatorConfig::default()
        .with_zero_curve(ZeroCurveConfig::Pillars {
            tenors: vec![0.0, 30.0],
            rates: vec![0.01, 0.04],
        })
        .with_num_samples(50_000);

    let model = HullWhiteSimulator::from_config(&config).unwrap();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let curves = model.simulate_config(&config, &mut rng).unwrap();

    // z0(30) - z0(10) = 0.02 at the 20y offset.
    let plain = HullWhiteSimulator::new(0.15, 0.0075).unwrap();
    let expected = model.expected_rate(10.0, 20.0).unwrap();
    let shift = expected - plain.expected_rate(10.0, 20.0).unwrap();
    assert_relative_eq!(shift, 0.02, epsilon = 1e-12);

    let last = curves.num_offsets() - 1;
    assert!((curves.column_mean(last) - expected).abs() < 5e-4);
}

#[test]
fn test_closure_curve_is_accepted() {
    let model = HullWhiteSimulator::new(0.05, 0.01)
        .unwrap()
        .with_zero_curve(Arc::new(|t: f64| 0.03 - 0.01 * (-0.2 * t).exp()));
    let mut rng = StdRng::seed_from_u64(5);
    let curves = model.simulate(1.0, &[1.0, 5.0], 10, &mut rng).unwrap();
    assert_eq!(curves.num_samples(), 10);
}

#[test]
fn test_invalid_config_rejected() {
    let config = SimulatorConfig::new(0.0, 0.01);
    assert!(matches!(
        HullWhiteSimulator::from_config(&config),
        Err(CurveError::InvalidParameter { name: "mean_reversion", .. })
    ));
}
