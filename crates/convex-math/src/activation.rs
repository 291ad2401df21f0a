//! Activation functions.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{MathError, MathResult};

/// Leaky rectified linear unit.
///
/// ```text
/// f(u) = u            if u > 0
///      = slope * u    otherwise
/// ```
///
/// The derivative at exactly zero is taken from the negative branch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeakyRelu {
    negative_slope: f64,
}

impl LeakyRelu {
    /// Default slope for negative inputs.
    pub const DEFAULT_SLOPE: f64 = 0.3;

    /// Creates a leaky ReLU with the given negative slope.
    ///
    /// # Errors
    ///
    /// Returns an error if the slope is negative or not finite.
    pub fn new(negative_slope: f64) -> MathResult<Self> {
        if !negative_slope.is_finite() || negative_slope < 0.0 {
            return Err(MathError::invalid_input(format!(
                "negative slope must be finite and non-negative, got {negative_slope}"
            )));
        }
        Ok(Self { negative_slope })
    }

    /// Returns the slope used for negative inputs.
    pub fn negative_slope(&self) -> f64 {
        self.negative_slope
    }

    /// Applies the activation to a scalar.
    #[inline]
    pub fn apply_scalar(&self, u: f64) -> f64 {
        if u > 0.0 {
            u
        } else {
            self.negative_slope * u
        }
    }

    /// Derivative of the activation at a scalar pre-activation.
    #[inline]
    pub fn derivative_scalar(&self, u: f64) -> f64 {
        if u > 0.0 {
            1.0
        } else {
            self.negative_slope
        }
    }

    /// Applies the activation element-wise.
    pub fn apply(&self, pre_activation: &DMatrix<f64>) -> DMatrix<f64> {
        pre_activation.map(|u| self.apply_scalar(u))
    }

    /// Back-propagates `upstream` through the activation evaluated at `pre_activation`.
    pub fn backward(&self, pre_activation: &DMatrix<f64>, upstream: &DMatrix<f64>) -> DMatrix<f64> {
        upstream.zip_map(pre_activation, |g, u| g * self.derivative_scalar(u))
    }
}

impl Default for LeakyRelu {
    fn default() -> Self {
        Self {
            negative_slope: Self::DEFAULT_SLOPE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_leaky_relu_values() {
        let act = LeakyRelu::new(0.1).unwrap();
        assert_relative_eq!(act.apply_scalar(2.0), 2.0);
        assert_relative_eq!(act.apply_scalar(-2.0), -0.2);
        assert_relative_eq!(act.apply_scalar(0.0), 0.0);
    }

    #[test]
    fn test_leaky_relu_backward() {
        let act = LeakyRelu::default();
        let pre = DMatrix::from_row_slice(1, 3, &[1.5, -0.5, 0.0]);
        let upstream = DMatrix::from_row_slice(1, 3, &[2.0, 2.0, 2.0]);
        let grad = act.backward(&pre, &upstream);

        assert_relative_eq!(grad[(0, 0)], 2.0);
        assert_relative_eq!(grad[(0, 1)], 0.6);
        assert_relative_eq!(grad[(0, 2)], 0.6);
    }

    #[test]
    fn test_invalid_slope() {
        assert!(LeakyRelu::new(-0.1).is_err());
        assert!(LeakyRelu::new(f64::NAN).is_err());
    }
}
