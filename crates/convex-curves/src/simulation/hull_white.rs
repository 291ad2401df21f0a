//! One-factor Hull-White curve simulator in state-variable form.

use std::fmt;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use tracing::debug;

use convex_config::SimulatorConfig;
use convex_math::linear_algebra::ensure_finite;

use super::samples::SimulatedCurves;
use crate::curves;
use crate::error::{CurveError, CurveResult};
use crate::traits::DeterministicCurve;

/// Closed-form simulator for zero-rate curves under a mean-reverting short rate.
///
/// The model is written in terms of a Gaussian state `x(t) ~ N(0, y(t))`:
///
/// ```text
/// G(t, T) = (1 - exp(-a (T - t))) / a
/// y(t)    = sigma^2 (1 - exp(-2 a t)) / (2 a)
/// z(t, T) = G/(T-t) * x + 0.5 * G^2 * y(t) / (T-t) + [z0(T) - z0(t)]
/// ```
///
/// The bracketed term is present only when a deterministic curve is supplied.
/// The simulator is immutable once built and every stochastic call takes an
/// explicit random source.
///
/// # Example
///
/// ```rust
/// use convex_curves::simulation::HullWhiteSimulator;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let model = HullWhiteSimulator::new(0.15, 0.0075).unwrap();
/// let mut rng = StdRng::seed_from_u64(1);
/// let curves = model.simulate(10.0, &[0.5, 1.0, 5.0], 64, &mut rng).unwrap();
/// assert_eq!(curves.rates().shape(), (64, 3));
/// ```
#[derive(Clone)]
pub struct HullWhiteSimulator {
    mean_reversion: f64,
    volatility: f64,
    zero_curve: Option<Arc<dyn DeterministicCurve>>,
}

impl HullWhiteSimulator {
    /// Creates a simulator without a deterministic curve.
    ///
    /// # Errors
    ///
    /// Rejects `mean_reversion <= 0`, negative volatility, and non-finite values.
    pub fn new(mean_reversion: f64, volatility: f64) -> CurveResult<Self> {
        if !(mean_reversion.is_finite() && mean_reversion > 0.0) {
            return Err(CurveError::invalid_parameter(
                "mean_reversion",
                mean_reversion,
                "must be positive and finite",
            ));
        }
        if !(volatility.is_finite() && volatility >= 0.0) {
            return Err(CurveError::invalid_parameter(
                "volatility",
                volatility,
                "must be non-negative and finite",
            ));
        }

        Ok(Self {
            mean_reversion,
            volatility,
            zero_curve: None,
        })
    }

    /// Builds a simulator from configuration, including its deterministic curve.
    pub fn from_config(config: &SimulatorConfig) -> CurveResult<Self> {
        let model = Self::new(config.mean_reversion, config.volatility)?;
        match &config.zero_curve {
            Some(curve) => Ok(model.with_zero_curve(curves::from_config(curve)?)),
            None => Ok(model),
        }
    }

    /// Attaches a deterministic zero curve `z0`.
    #[must_use]
    pub fn with_zero_curve(mut self, curve: Arc<dyn DeterministicCurve>) -> Self {
        self.zero_curve = Some(curve);
        self
    }

    /// Returns the mean reversion speed `a`.
    pub fn mean_reversion(&self) -> f64 {
        self.mean_reversion
    }

    /// Returns the volatility `sigma`.
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Returns the deterministic curve, if any.
    pub fn zero_curve(&self) -> Option<&Arc<dyn DeterministicCurve>> {
        self.zero_curve.as_ref()
    }

    /// `G(t, T) = (1 - exp(-a (T - t))) / a`.
    pub fn g(&self, t: f64, maturity: f64) -> f64 {
        let a = self.mean_reversion;
        -(-a * (maturity - t)).exp_m1() / a
    }

    /// Variance of the state variable at time `t`.
    pub fn y(&self, t: f64) -> f64 {
        let a = self.mean_reversion;
        self.volatility.powi(2) * -(-2.0 * a * t).exp_m1() / (2.0 * a)
    }

    fn deterministic_shift(&self, t: f64, maturity: f64) -> f64 {
        self.zero_curve
            .as_ref()
            .map_or(0.0, |curve| curve.zero_rate(maturity) - curve.zero_rate(t))
    }

    /// Loadings `(slope, intercept)` such that `z(t, t + offset) = slope * x + intercept`.
    fn loadings(&self, t: f64, offset: f64) -> (f64, f64) {
        let maturity = t + offset;
        let g = self.g(t, maturity);
        let slope = g / offset;
        let intercept = 0.5 * g * g * self.y(t) / offset + self.deterministic_shift(t, maturity);
        (slope, intercept)
    }

    /// Zero rate `z(t, T)` for a given state `x`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidMaturity`] unless `T > t`, and
    /// [`CurveError::InvalidValue`] if the result is not finite.
    pub fn zero_rate(&self, x: f64, t: f64, maturity: f64) -> CurveResult<f64> {
        let offset = maturity - t;
        check_offset(offset)?;

        let (slope, intercept) = self.loadings(t, offset);
        let rate = slope * x + intercept;
        if !rate.is_finite() {
            return Err(CurveError::invalid_value(format!(
                "zero rate at t={t}, T={maturity} is not finite"
            )));
        }
        Ok(rate)
    }

    /// Mean of `z(t, t + offset)` under the model measure.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidMaturity`] unless `offset > 0`.
    pub fn expected_rate(&self, t: f64, offset: f64) -> CurveResult<f64> {
        check_offset(offset)?;
        Ok(self.loadings(t, offset).1)
    }

    /// Variance of `z(t, t + offset)`: `(G / offset)^2 * y(t)`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidMaturity`] unless `offset > 0`.
    pub fn theoretical_variance(&self, t: f64, offset: f64) -> CurveResult<f64> {
        check_offset(offset)?;
        let slope = self.g(t, t + offset) / offset;
        Ok(slope * slope * self.y(t))
    }

    /// Simulates `num_samples` curves on the grid `t + offsets`.
    ///
    /// Row `k` of the result is the curve generated from the `k`-th state draw;
    /// column `i` corresponds to `offsets[i]`.
    ///
    /// # Errors
    ///
    /// Fails if `t` is negative, any offset is not strictly positive, no
    /// samples or offsets are requested, or a non-finite rate is produced.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        t: f64,
        offsets: &[f64],
        num_samples: usize,
        rng: &mut R,
    ) -> CurveResult<SimulatedCurves> {
        if !(t.is_finite() && t >= 0.0) {
            return Err(CurveError::invalid_parameter(
                "observation_time",
                t,
                "must be non-negative and finite",
            ));
        }
        if offsets.is_empty() {
            return Err(CurveError::insufficient_points(1, 0));
        }
        if num_samples == 0 {
            return Err(CurveError::invalid_value("num_samples must be positive"));
        }
        if let Some(index) = offsets.iter().position(|d| !(d.is_finite() && *d > 0.0)) {
            return Err(CurveError::invalid_maturity(index, offsets[index]));
        }

        let std_dev = self.y(t).sqrt();
        let loadings: Vec<(f64, f64)> = offsets.iter().map(|&d| self.loadings(t, d)).collect();

        let states = DVector::from_fn(num_samples, |_, _| {
            let eps: f64 = StandardNormal.sample(&mut *rng);
            std_dev * eps
        });

        let rates = DMatrix::from_fn(num_samples, offsets.len(), |k, i| {
            let (slope, intercept) = loadings[i];
            slope * states[k] + intercept
        });
        ensure_finite(&rates, "curve simulation")?;

        debug!(
            t,
            num_samples,
            num_offsets = offsets.len(),
            state_std = std_dev,
            "simulated zero curves"
        );

        Ok(SimulatedCurves::new(t, offsets.to_vec(), states, rates))
    }

    /// Simulates using the grid and sample count stored in `config`.
    pub fn simulate_config<R: Rng + ?Sized>(
        &self,
        config: &SimulatorConfig,
        rng: &mut R,
    ) -> CurveResult<SimulatedCurves> {
        self.simulate(
            config.observation_time,
            &config.offsets,
            config.num_samples,
            rng,
        )
    }
}

fn check_offset(offset: f64) -> CurveResult<()> {
    if offset.is_finite() && offset > 0.0 {
        Ok(())
    } else {
        Err(CurveError::invalid_maturity(0, offset))
    }
}

impl fmt::Debug for HullWhiteSimulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HullWhiteSimulator")
            .field("mean_reversion", &self.mean_reversion)
            .field("volatility", &self.volatility)
            .field(
                "zero_curve",
                &self.zero_curve.as_ref().map(|c| c.description()),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::curves::FlatCurve;

    fn model() -> HullWhiteSimulator {
        HullWhiteSimulator::new(0.15, 0.0075).unwrap()
    }

    #[test]
    fn test_y_closed_form() {
        let m = model();
        let expected = 0.0075_f64.powi(2) * (1.0 - (-2.0 * 0.15 * 10.0_f64).exp()) / (2.0 * 0.15);
        assert_relative_eq!(m.y(10.0), expected, max_relative = 1e-14);
        assert_relative_eq!(m.y(10.0), 1.781_649e-4, max_relative = 1e-5);
        assert_relative_eq!(m.y(0.0), 0.0);
    }

    #[test]
    fn test_g_closed_form() {
        let m = model();
        let expected = (1.0 - (-0.15_f64 * 2.0).exp()) / 0.15;
        assert_relative_eq!(m.g(10.0, 12.0), expected, max_relative = 1e-14);
        // Short maturities behave like T - t.
        assert_relative_eq!(m.g(1.0, 1.0 + 1e-6), 1e-6, max_relative = 1e-6);
    }

    #[test]
    fn test_zero_rate_formula() {
        let m = model();
        let (t, big_t, x) = (10.0, 13.0, 0.01);
        let g = m.g(t, big_t);
        let expected = g / 3.0 * x + 0.5 * g * g * m.y(t) / 3.0;
        assert_relative_eq!(m.zero_rate(x, t, big_t).unwrap(), expected, max_relative = 1e-14);
    }

    #[test]
    fn test_zero_rate_rejects_zero_offset() {
        let m = model();
        assert!(matches!(
            m.zero_rate(0.0, 5.0, 5.0),
            Err(CurveError::InvalidMaturity { .. })
        ));
    }

    #[test]
    fn test_moments_reject_zero_offset() {
        let m = model();
        assert_eq!(m.expected_rate(10.0, 0.0), Err(CurveError::invalid_maturity(0, 0.0)));
        assert!(matches!(
            m.theoretical_variance(10.0, 0.0),
            Err(CurveError::InvalidMaturity { .. })
        ));
        assert!(m.expected_rate(10.0, -1.0).is_err());
        assert!(m.theoretical_variance(10.0, f64::NAN).is_err());

        // Short offsets approach the state variance.
        let variance = m.theoretical_variance(10.0, 1e-4).unwrap();
        assert!(variance.is_finite());
        assert_relative_eq!(variance, m.y(10.0), max_relative = 1e-4);
    }

    #[test]
    fn test_deterministic_shift() {
        let curve = Arc::new(|t: f64| 0.01 + 0.001 * t);
        let m = model().with_zero_curve(curve);
        let plain = model();

        let shifted = m.zero_rate(0.0, 10.0, 12.0).unwrap();
        let base = plain.zero_rate(0.0, 10.0, 12.0).unwrap();
        assert_relative_eq!(shifted - base, 0.002, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_curve_cancels() {
        let m = model().with_zero_curve(Arc::new(FlatCurve::new(0.05).unwrap()));
        assert_relative_eq!(
            m.expected_rate(10.0, 2.0).unwrap(),
            model().expected_rate(10.0, 2.0).unwrap()
        );
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            HullWhiteSimulator::new(0.0, 0.01),
            Err(CurveError::InvalidParameter { name: "mean_reversion", .. })
        ));
        assert!(HullWhiteSimulator::new(-0.1, 0.01).is_err());
        assert!(matches!(
            HullWhiteSimulator::new(0.1, -0.01),
            Err(CurveError::InvalidParameter { name: "volatility", .. })
        ));
        assert!(HullWhiteSimulator::new(0.1, 0.0).is_ok());
    }

    #[test]
    fn test_simulate_shape_and_seed_determinism() {
        let m = model();
        let offsets = [0.5, 1.0, 2.0];
        let a = m.simulate(10.0, &offsets, 16, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = m.simulate(10.0, &offsets, 16, &mut StdRng::seed_from_u64(3)).unwrap();

        assert_eq!(a.rates().shape(), (16, 3));
        assert_eq!(a.rates(), b.rates());
    }

    #[test]
    fn test_simulate_rows_follow_states() {
        let m = model();
        let offsets = [0.5, 3.0];
        let curves = m.simulate(10.0, &offsets, 8, &mut StdRng::seed_from_u64(11)).unwrap();

        for k in 0..8 {
            for (i, d) in offsets.iter().enumerate() {
                let direct = m.zero_rate(curves.states()[k], 10.0, 10.0 + d).unwrap();
                assert_relative_eq!(curves.rates()[(k, i)], direct, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_simulate_rejects_zero_offset() {
        let m = model();
        let err = m
            .simulate(10.0, &[1.0, 0.0], 4, &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(err, CurveError::invalid_maturity(1, 0.0));
    }

    #[test]
    fn test_simulate_rejects_empty_requests() {
        let m = model();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(m.simulate(10.0, &[], 4, &mut rng).is_err());
        assert!(m.simulate(10.0, &[1.0], 0, &mut rng).is_err());
        assert!(m.simulate(-1.0, &[1.0], 4, &mut rng).is_err());
    }

    #[test]
    fn test_zero_volatility_is_deterministic() {
        let m = HullWhiteSimulator::new(0.1, 0.0).unwrap();
        let curves = m.simulate(5.0, &[1.0, 2.0], 10, &mut StdRng::seed_from_u64(9)).unwrap();
        assert!(curves.rates().iter().all(|r| *r == 0.0));
    }

    #[test]
    fn test_debug_output() {
        let m = model().with_zero_curve(Arc::new(FlatCurve::new(0.02).unwrap()));
        let text = format!("{m:?}");
        assert!(text.contains("flat(0.02)"));
    }
}
