//! Error types for the generative models.

use thiserror::Error;

use convex_math::MathError;

/// A specialized Result type for model operations.
pub type VaeResult<T> = Result<T, VaeError>;

/// Errors raised while building, evaluating or training a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VaeError {
    /// A batch does not have the width or row count the model expects.
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// What was being checked.
        what: &'static str,
        /// Expected size.
        expected: usize,
        /// Actual size.
        actual: usize,
    },

    /// Invalid argument.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the problem.
        reason: String,
    },

    /// Model configuration rejected at construction.
    #[error("Configuration error: {reason}")]
    Configuration {
        /// Validation failure description.
        reason: String,
    },

    /// A forward or loss computation produced NaN or an infinity.
    #[error("Non-finite value produced in {operation}")]
    NonFinite {
        /// The operation that produced the value.
        operation: String,
    },

    /// Underlying numerical failure.
    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

impl VaeError {
    /// Creates a dimension mismatch error.
    #[must_use]
    pub fn dimension_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
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

    /// Creates a non-finite error.
    #[must_use]
    pub fn non_finite(operation: impl Into<String>) -> Self {
        Self::NonFinite {
            operation: operation.into(),
        }
    }
}

impl From<convex_config::ConfigError> for VaeError {
    fn from(err: convex_config::ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

impl From<convex_curves::CurveError> for VaeError {
    fn from(err: convex_curves::CurveError) -> Self {
        Self::invalid_input(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VaeError::dimension_mismatch("condition columns", 1, 3);
        assert_eq!(
            err.to_string(),
            "Dimension mismatch for condition columns: expected 1, got 3"
        );
    }

    #[test]
    fn test_from_math_error() {
        let err: VaeError = MathError::length_mismatch(4, 2).into();
        assert!(matches!(err, VaeError::Math(MathError::LengthMismatch { .. })));
    }
}
