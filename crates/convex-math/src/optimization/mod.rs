//! Optimization algorithms.
//!
//! Gradient-based update rules operating on flat parameter vectors, plus a
//! central-difference numerical gradient used to check analytic gradients.

use serde::{Deserialize, Serialize};

use crate::error::{MathError, MathResult};

/// An optimizer that consumes a gradient and updates parameters in place.
pub trait GradientOptimizer: Send {
    /// Applies one update step.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` and `gradient` have different lengths, or
    /// if the gradient contains non-finite values.
    fn step(&mut self, params: &mut [f64], gradient: &[f64]) -> MathResult<()>;

    /// Returns the optimizer name.
    fn name(&self) -> &'static str;
}

fn check_step_inputs(expected: usize, params: &[f64], gradient: &[f64]) -> MathResult<()> {
    if params.len() != expected {
        return Err(MathError::length_mismatch(expected, params.len()));
    }
    if gradient.len() != expected {
        return Err(MathError::length_mismatch(expected, gradient.len()));
    }
    if gradient.iter().any(|g| !g.is_finite()) {
        return Err(MathError::non_finite("gradient"));
    }
    Ok(())
}

/// Plain stochastic gradient descent.
#[derive(Debug, Clone, Copy)]
pub struct Sgd {
    learning_rate: f64,
}

impl Sgd {
    /// Creates a new SGD optimizer.
    pub fn new(learning_rate: f64) -> MathResult<Self> {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(MathError::invalid_input("learning rate must be positive"));
        }
        Ok(Self { learning_rate })
    }
}

impl GradientOptimizer for Sgd {
    fn step(&mut self, params: &mut [f64], gradient: &[f64]) -> MathResult<()> {
        check_step_inputs(params.len(), params, gradient)?;
        for (p, g) in params.iter_mut().zip(gradient) {
            *p -= self.learning_rate * g;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sgd"
    }
}

/// Configuration for the Adam optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdamConfig {
    /// Step size.
    pub learning_rate: f64,
    /// Decay rate of the first moment estimate.
    pub beta1: f64,
    /// Decay rate of the second moment estimate.
    pub beta2: f64,
    /// Numerical stabilizer added to the denominator.
    pub epsilon: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
        }
    }
}

/// Adam optimizer (Kingma & Ba, 2015) with bias-corrected moments.
#[derive(Debug, Clone)]
pub struct Adam {
    config: AdamConfig,
    first_moment: Vec<f64>,
    second_moment: Vec<f64>,
    steps: u32,
}

impl Adam {
    /// Creates an Adam optimizer for `parameter_count` parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the learning rate is not positive or a decay rate
    /// lies outside `[0, 1)`.
    pub fn new(config: AdamConfig, parameter_count: usize) -> MathResult<Self> {
        if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
            return Err(MathError::invalid_input("learning rate must be positive"));
        }
        for (name, beta) in [("beta1", config.beta1), ("beta2", config.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(MathError::invalid_input(format!(
                    "{name} must lie in [0, 1), got {beta}"
                )));
            }
        }
        if !(config.epsilon > 0.0) {
            return Err(MathError::invalid_input("epsilon must be positive"));
        }

        Ok(Self {
            config,
            first_moment: vec![0.0; parameter_count],
            second_moment: vec![0.0; parameter_count],
            steps: 0,
        })
    }

    /// Returns the number of steps taken so far.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AdamConfig {
        &self.config
    }
}

impl GradientOptimizer for Adam {
    fn step(&mut self, params: &mut [f64], gradient: &[f64]) -> MathResult<()> {
        check_step_inputs(self.first_moment.len(), params, gradient)?;

        self.steps += 1;
        let AdamConfig {
            learning_rate,
            beta1,
            beta2,
            epsilon,
        } = self.config;
        let t = i32::try_from(self.steps).unwrap_or(i32::MAX);
        let correction1 = 1.0 - beta1.powi(t);
        let correction2 = 1.0 - beta2.powi(t);

        for i in 0..params.len() {
            let g = gradient[i];
            self.first_moment[i] = beta1 * self.first_moment[i] + (1.0 - beta1) * g;
            self.second_moment[i] = beta2 * self.second_moment[i] + (1.0 - beta2) * g * g;

            let m_hat = self.first_moment[i] / correction1;
            let v_hat = self.second_moment[i] / correction2;
            params[i] -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "adam"
    }
}

/// Central-difference gradient of `f` at `params`.
pub fn numerical_gradient<F>(f: F, params: &[f64], step_size: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut probe = params.to_vec();
    let mut gradient = vec![0.0; params.len()];

    for i in 0..params.len() {
        let original = probe[i];
        probe[i] = original + step_size;
        let up = f(&probe);
        probe[i] = original - step_size;
        let down = f(&probe);
        probe[i] = original;

        gradient[i] = (up - down) / (2.0 * step_size);
    }

    gradient
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quadratic(params: &[f64]) -> f64 {
        (params[0] - 2.0).powi(2) + (params[1] - 3.0).powi(2)
    }

    fn quadratic_gradient(params: &[f64]) -> Vec<f64> {
        vec![2.0 * (params[0] - 2.0), 2.0 * (params[1] - 3.0)]
    }

    #[test]
    fn test_numerical_gradient_quadratic() {
        let grad = numerical_gradient(quadratic, &[0.5, -1.0], 1e-6);
        assert_relative_eq!(grad[0], -3.0, epsilon = 1e-6);
        assert_relative_eq!(grad[1], -8.0, epsilon = 1e-6);
    }

    #[test]
    fn test_sgd_converges() {
        let mut sgd = Sgd::new(0.1).unwrap();
        let mut params = vec![0.0, 0.0];
        for _ in 0..200 {
            let g = quadratic_gradient(&params);
            sgd.step(&mut params, &g).unwrap();
        }
        assert_relative_eq!(params[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(params[1], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_adam_converges() {
        let config = AdamConfig {
            learning_rate: 0.05,
            ..AdamConfig::default()
        };
        let mut adam = Adam::new(config, 2).unwrap();
        let mut params = vec![0.0, 0.0];
        for _ in 0..2000 {
            let g = quadratic_gradient(&params);
            adam.step(&mut params, &g).unwrap();
        }
        assert_eq!(adam.steps(), 2000);
        assert_relative_eq!(params[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(params[1], 3.0, epsilon = 1e-3);
    }

    #[test]
    fn test_adam_first_step_size() {
        // Bias correction makes the first step exactly learning_rate in magnitude.
        let mut adam = Adam::new(AdamConfig::default(), 1).unwrap();
        let mut params = vec![1.0];
        adam.step(&mut params, &[42.0]).unwrap();
        assert_relative_eq!(params[0], 1.0 - 1e-3, epsilon = 1e-9);
    }

    #[test]
    fn test_step_length_mismatch() {
        let mut adam = Adam::new(AdamConfig::default(), 3).unwrap();
        let mut params = vec![0.0; 3];
        assert!(matches!(
            adam.step(&mut params, &[1.0, 2.0]),
            Err(MathError::LengthMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_non_finite_gradient_rejected() {
        let mut sgd = Sgd::new(0.1).unwrap();
        let mut params = vec![0.0];
        assert!(sgd.step(&mut params, &[f64::NAN]).is_err());
    }

    #[test]
    fn test_invalid_adam_config() {
        let config = AdamConfig {
            beta1: 1.0,
            ..AdamConfig::default()
        };
        assert!(Adam::new(config, 1).is_err());
    }
}
