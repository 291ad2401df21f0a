//! Error types for mathematical operations.

use thiserror::Error;

/// A specialized Result type for mathematical operations.
pub type MathResult<T> = Result<T, MathError>;

/// Errors that can occur during mathematical operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// Matrix dimensions are incompatible.
    #[error("Incompatible matrix dimensions: ({rows1}x{cols1}) and ({rows2}x{cols2})")]
    DimensionMismatch {
        /// Rows in first matrix.
        rows1: usize,
        /// Columns in first matrix.
        cols1: usize,
        /// Rows in second matrix.
        rows2: usize,
        /// Columns in second matrix.
        cols2: usize,
    },

    /// Vector lengths are incompatible.
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Invalid input parameter.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },

    /// A computation produced NaN or an infinity.
    #[error("Non-finite value produced in {operation}")]
    NonFinite {
        /// The operation that produced the value.
        operation: String,
    },
}

impl MathError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates a length mismatch error.
    #[must_use]
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }

    /// Creates a non-finite value error.
    #[must_use]
    pub fn non_finite(operation: impl Into<String>) -> Self {
        Self::NonFinite {
            operation: operation.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MathError::length_mismatch(10, 7);
        assert!(err.to_string().contains("expected 10"));

        let err = MathError::DimensionMismatch {
            rows1: 3,
            cols1: 2,
            rows2: 4,
            cols2: 2,
        };
        assert_eq!(
            err.to_string(),
            "Incompatible matrix dimensions: (3x2) and (4x2)"
        );
    }

    #[test]
    fn test_non_finite_display() {
        let err = MathError::non_finite("adam step");
        assert!(err.to_string().contains("adam step"));
    }
}
