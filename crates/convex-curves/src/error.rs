//! Error types for curve operations.
//!
//! Covers deterministic curve construction, simulator configuration and the
//! numerical failures a simulation can surface.

use thiserror::Error;

/// A specialized Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Error types for curve operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    /// A model parameter is outside its admissible range.
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// Admissible range description.
        reason: &'static str,
    },

    /// Maturity does not lie strictly after the observation time.
    #[error("Maturity offset at index {index} must be strictly positive, got {offset}")]
    InvalidMaturity {
        /// Position of the offset in the request.
        index: usize,
        /// The offending offset `T - t`.
        offset: f64,
    },

    /// Not enough data points.
    #[error("Insufficient points: need at least {required}, got {got}")]
    InsufficientPoints {
        /// Minimum required points.
        required: usize,
        /// Actual number of points provided.
        got: usize,
    },

    /// Tenors are not monotonically increasing.
    #[error("Non-monotonic tenors at index {index}: {prev:.4} >= {current:.4}")]
    NonMonotonicTenors {
        /// Index where monotonicity violation occurred.
        index: usize,
        /// Previous tenor value.
        prev: f64,
        /// Current tenor value.
        current: f64,
    },

    /// Invalid value (NaN, Inf, or domain error).
    #[error("Invalid value: {reason}")]
    InvalidValue {
        /// Description of why value is invalid.
        reason: String,
    },

    /// Configuration rejected at construction.
    #[error("Configuration error: {reason}")]
    Configuration {
        /// Validation failure description.
        reason: String,
    },

    /// Underlying numerical failure.
    #[error("Math error: {reason}")]
    MathError {
        /// Description of the failure.
        reason: String,
    },
}

impl CurveError {
    /// Creates an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason,
        }
    }

    /// Creates an invalid maturity error.
    #[must_use]
    pub fn invalid_maturity(index: usize, offset: f64) -> Self {
        Self::InvalidMaturity { index, offset }
    }

    /// Creates an insufficient points error.
    #[must_use]
    pub fn insufficient_points(required: usize, got: usize) -> Self {
        Self::InsufficientPoints { required, got }
    }

    /// Creates a non-monotonic tenors error.
    #[must_use]
    pub fn non_monotonic_tenors(index: usize, prev: f64, current: f64) -> Self {
        Self::NonMonotonicTenors {
            index,
            prev,
            current,
        }
    }

    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}

impl From<convex_math::MathError> for CurveError {
    fn from(err: convex_math::MathError) -> Self {
        Self::MathError {
            reason: err.to_string(),
        }
    }
}

impl From<convex_config::ConfigError> for CurveError {
    fn from(err: convex_config::ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CurveError::invalid_parameter("mean_reversion", -0.1, "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid parameter mean_reversion = -0.1: must be positive"
        );

        let err = CurveError::invalid_maturity(3, 0.0);
        assert!(err.to_string().contains("index 3"));
    }

    #[test]
    fn test_from_math_error() {
        let err: CurveError = convex_math::MathError::non_finite("simulate").into();
        assert!(matches!(err, CurveError::MathError { .. }));
    }
}
