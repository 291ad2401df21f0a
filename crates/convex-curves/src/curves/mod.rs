//! Deterministic zero curve implementations.
//!
//! - [`FlatCurve`]: one rate for every maturity
//! - [`PillarCurve`]: linear interpolation between pillars, flat beyond them

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use convex_config::{Validate, ZeroCurveConfig};

use crate::error::{CurveError, CurveResult};
use crate::traits::DeterministicCurve;

/// A flat zero curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatCurve {
    rate: f64,
}

impl FlatCurve {
    /// Creates a flat curve.
    pub fn new(rate: f64) -> CurveResult<Self> {
        if !rate.is_finite() {
            return Err(CurveError::invalid_value(format!("flat rate {rate} is not finite")));
        }
        Ok(Self { rate })
    }

    /// Returns the rate.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl DeterministicCurve for FlatCurve {
    fn zero_rate(&self, _t: f64) -> f64 {
        self.rate
    }

    fn description(&self) -> String {
        format!("flat({})", self.rate)
    }
}

/// Zero curve defined by pillar points.
///
/// Rates are interpolated linearly between pillars and held flat before the
/// first and after the last pillar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarCurve {
    tenors: Vec<f64>,
    rates: Vec<f64>,
}

impl PillarCurve {
    /// Creates a pillar curve.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no pillars, the lengths differ, a value is
    /// not finite, or tenors are not strictly increasing.
    pub fn new(tenors: Vec<f64>, rates: Vec<f64>) -> CurveResult<Self> {
        if tenors.is_empty() {
            return Err(CurveError::insufficient_points(1, 0));
        }
        if tenors.len() != rates.len() {
            return Err(CurveError::invalid_value(format!(
                "tenors and rates must have same length: {} vs {}",
                tenors.len(),
                rates.len()
            )));
        }
        if tenors.iter().chain(&rates).any(|v| !v.is_finite()) {
            return Err(CurveError::invalid_value("pillar values must be finite"));
        }
        for i in 1..tenors.len() {
            if tenors[i] <= tenors[i - 1] {
                return Err(CurveError::non_monotonic_tenors(i, tenors[i - 1], tenors[i]));
            }
        }

        Ok(Self { tenors, rates })
    }

    /// Returns the pillar tenors.
    #[must_use]
    pub fn tenors(&self) -> &[f64] {
        &self.tenors
    }

    /// Returns the pillar rates.
    #[must_use]
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }
}

impl DeterministicCurve for PillarCurve {
    fn zero_rate(&self, t: f64) -> f64 {
        let last = self.tenors.len() - 1;
        if t <= self.tenors[0] {
            return self.rates[0];
        }
        if t >= self.tenors[last] {
            return self.rates[last];
        }

        // First pillar strictly after t; guaranteed in 1..=last by the checks above.
        let hi = self.tenors.partition_point(|&x| x <= t);
        let lo = hi - 1;
        let w = (t - self.tenors[lo]) / (self.tenors[hi] - self.tenors[lo]);
        self.rates[lo] + w * (self.rates[hi] - self.rates[lo])
    }

    fn description(&self) -> String {
        format!("pillars({} points)", self.tenors.len())
    }
}

/// Builds a deterministic curve from its configuration.
pub fn from_config(config: &ZeroCurveConfig) -> CurveResult<Arc<dyn DeterministicCurve>> {
    config.validate_or_error()?;

    let curve: Arc<dyn DeterministicCurve> = match config {
        ZeroCurveConfig::Flat { rate } => Arc::new(FlatCurve::new(*rate)?),
        ZeroCurveConfig::Pillars { tenors, rates } => {
            Arc::new(PillarCurve::new(tenors.clone(), rates.clone())?)
        }
    };
    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_flat_curve() {
        let curve = FlatCurve::new(0.03).unwrap();
        assert_relative_eq!(curve.zero_rate(0.0), 0.03);
        assert_relative_eq!(curve.zero_rate(50.0), 0.03);
        assert!(FlatCurve::new(f64::NAN).is_err());
    }

    #[test]
    fn test_pillar_interpolation() {
        let curve = PillarCurve::new(vec![1.0, 2.0, 5.0], vec![0.02, 0.03, 0.06]).unwrap();

        assert_relative_eq!(curve.zero_rate(1.5), 0.025, epsilon = 1e-12);
        assert_relative_eq!(curve.zero_rate(2.0), 0.03, epsilon = 1e-12);
        assert_relative_eq!(curve.zero_rate(3.5), 0.045, epsilon = 1e-12);
    }

    #[test]
    fn test_pillar_flat_extrapolation() {
        let curve = PillarCurve::new(vec![1.0, 2.0], vec![0.02, 0.03]).unwrap();
        assert_relative_eq!(curve.zero_rate(0.1), 0.02);
        assert_relative_eq!(curve.zero_rate(30.0), 0.03);
    }

    #[test]
    fn test_single_pillar_is_flat() {
        let curve = PillarCurve::new(vec![5.0], vec![0.04]).unwrap();
        assert_relative_eq!(curve.zero_rate(1.0), 0.04);
        assert_relative_eq!(curve.zero_rate(10.0), 0.04);
    }

    #[test]
    fn test_pillar_validation() {
        assert!(matches!(
            PillarCurve::new(vec![], vec![]),
            Err(CurveError::InsufficientPoints { .. })
        ));
        assert!(matches!(
            PillarCurve::new(vec![1.0, 1.0], vec![0.01, 0.02]),
            Err(CurveError::NonMonotonicTenors { index: 1, .. })
        ));
        assert!(PillarCurve::new(vec![1.0], vec![0.01, 0.02]).is_err());
    }

    #[test]
    fn test_from_config() {
        let curve = from_config(&ZeroCurveConfig::Pillars {
            tenors: vec![0.0, 10.0],
            rates: vec![0.01, 0.02],
        })
        .unwrap();
        assert_relative_eq!(curve.zero_rate(5.0), 0.015, epsilon = 1e-12);

        let bad = from_config(&ZeroCurveConfig::Flat { rate: f64::INFINITY });
        assert!(matches!(bad, Err(CurveError::Configuration { .. })));
    }

    proptest! {
        #[test]
        fn prop_pillar_rejects_repeated_tenor(
            steps in prop::collection::vec(0.1..5.0f64, 2..8),
            at in 1usize..8,
        ) {
            let mut tenors: Vec<f64> = steps
                .iter()
                .scan(0.0, |acc, step| {
                    *acc += step;
                    Some(*acc)
                })
                .collect();
            let at = at.min(tenors.len() - 1);
            tenors[at] = tenors[at - 1];
            let rates = vec![0.02; tenors.len()];

            let result = PillarCurve::new(tenors, rates);
            prop_assert!(
                matches!(result, Err(CurveError::NonMonotonicTenors { index, .. }) if index == at),
                "expected non-monotonic error at {}, got {:?}",
                at,
                result
            );
        }

        #[test]
        fn prop_pillar_rate_within_pillar_range(
            rates in prop::collection::vec(-0.05..0.10f64, 1..8),
            t in -5.0..60.0f64,
        ) {
            let tenors: Vec<f64> = (0..rates.len()).map(|i| 5.0 * i as f64).collect();
            let curve = PillarCurve::new(tenors, rates.clone()).unwrap();
            let lo = rates.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = rates.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            let z = curve.zero_rate(t);
            prop_assert!(z >= lo - 1e-15 && z <= hi + 1e-15);
        }
    }
}
