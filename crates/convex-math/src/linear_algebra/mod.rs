//! Linear algebra utilities.
//!
//! Batched helpers used by the generative models. All batches are dense
//! matrices with **one row per sample** and one column per feature.
//!
//! # Layout contracts
//!
//! - [`flatten_row_major`]: entry `(r, c)` of an `R x C` matrix lands at
//!   flat index `r * C + c`. [`reshape_row_major`] is its exact inverse.
//! - [`tile_rows`]: the whole block is stacked `times` times, so output row
//!   `k * R + r` is input row `r`.
//! - [`repeat_rows`]: every row is repeated `times` times in place, so output
//!   row `r * times + k` is input row `r`.
//!
//! Pairing `tile_rows(a, m)` with `repeat_rows(b, n)` (where `a` has `n` rows and
//! `b` has `m` rows) enumerates the Cartesian product in block-major order:
//! output row `j * n + i` pairs `a[i]` with `b[j]`.

use crate::error::{MathError, MathResult};
use nalgebra::{DMatrix, DVector};

/// Concatenates two batches side by side (`[left | right]`).
///
/// # Errors
///
/// Returns [`MathError::DimensionMismatch`] if the row counts differ.
pub fn hconcat(left: &DMatrix<f64>, right: &DMatrix<f64>) -> MathResult<DMatrix<f64>> {
    if left.nrows() != right.nrows() {
        return Err(MathError::DimensionMismatch {
            rows1: left.nrows(),
            cols1: left.ncols(),
            rows2: right.nrows(),
            cols2: right.ncols(),
        });
    }

    let rows = left.nrows();
    let split = left.ncols();
    Ok(DMatrix::from_fn(rows, split + right.ncols(), |r, c| {
        if c < split {
            left[(r, c)]
        } else {
            right[(r, c - split)]
        }
    }))
}

/// Splits a batch into its first `at` columns and the remaining columns.
///
/// # Errors
///
/// Returns an error if `at` exceeds the column count.
pub fn split_columns(
    matrix: &DMatrix<f64>,
    at: usize,
) -> MathResult<(DMatrix<f64>, DMatrix<f64>)> {
    if at > matrix.ncols() {
        return Err(MathError::invalid_input(format!(
            "cannot split {} columns at {}",
            matrix.ncols(),
            at
        )));
    }

    let left = matrix.columns(0, at).into_owned();
    let right = matrix.columns(at, matrix.ncols() - at).into_owned();
    Ok((left, right))
}

/// Stacks the whole batch `times` times vertically.
pub fn tile_rows(matrix: &DMatrix<f64>, times: usize) -> DMatrix<f64> {
    let rows = matrix.nrows();
    DMatrix::from_fn(rows * times, matrix.ncols(), |r, c| matrix[(r % rows, c)])
}

/// Repeats every row `times` times consecutively.
pub fn repeat_rows(matrix: &DMatrix<f64>, times: usize) -> DMatrix<f64> {
    DMatrix::from_fn(matrix.nrows() * times, matrix.ncols(), |r, c| {
        matrix[(r / times, c)]
    })
}

/// Flattens a matrix in row-major order.
pub fn flatten_row_major(matrix: &DMatrix<f64>) -> DVector<f64> {
    let cols = matrix.ncols();
    DVector::from_fn(matrix.len(), |k, _| matrix[(k / cols, k % cols)])
}

/// Rebuilds a `rows x cols` matrix from a row-major flat vector.
///
/// # Errors
///
/// Returns [`MathError::LengthMismatch`] if `values.len() != rows * cols`.
pub fn reshape_row_major(
    values: &DVector<f64>,
    rows: usize,
    cols: usize,
) -> MathResult<DMatrix<f64>> {
    if values.len() != rows * cols {
        return Err(MathError::length_mismatch(rows * cols, values.len()));
    }
    Ok(DMatrix::from_row_slice(rows, cols, values.as_slice()))
}

/// Sums each column over the batch dimension.
pub fn column_sums(matrix: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_fn(matrix.ncols(), |c, _| matrix.column(c).sum())
}

/// Checks that every entry is finite.
///
/// # Errors
///
/// Returns [`MathError::NonFinite`] naming `operation` otherwise.
pub fn ensure_finite(matrix: &DMatrix<f64>, operation: &str) -> MathResult<()> {
    if matrix.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(MathError::non_finite(operation))
    }
}
