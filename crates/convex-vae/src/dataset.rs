//! Flattening curves into (value, covariate) pairs for the conditional model.
//!
//! The conditional model treats every curve point as an independent example.
//! A `R x C` curve matrix and its covariate matrix of the same shape are both
//! flattened row-major, so flat row `r * C + c` holds `curves[(r, c)]` next to
//! `covariates[(r, c)]`. [`ConditionalDataset::unflatten`] inverts the mapping.

use nalgebra::DMatrix;

use convex_curves::SimulatedCurves;
use convex_math::linear_algebra::{flatten_row_major, reshape_row_major};

use crate::error::{VaeError, VaeResult};
use crate::training::Batch;

/// Paired observations and covariates, one scalar of each per row.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalDataset {
    observations: DMatrix<f64>,
    covariates: DMatrix<f64>,
    rows: usize,
    cols: usize,
}

impl ConditionalDataset {
    /// Flattens a curve matrix and a same-shaped covariate matrix.
    pub fn from_matrices(values: &DMatrix<f64>, covariates: &DMatrix<f64>) -> VaeResult<Self> {
        if values.nrows() != covariates.nrows() {
            return Err(VaeError::dimension_mismatch(
                "covariate rows",
                values.nrows(),
                covariates.nrows(),
            ));
        }
        if values.ncols() != covariates.ncols() {
            return Err(VaeError::dimension_mismatch(
                "covariate columns",
                values.ncols(),
                covariates.ncols(),
            ));
        }

        let n = values.len();
        let flat_values = flatten_row_major(values);
        let flat_covariates = flatten_row_major(covariates);
        Ok(Self {
            observations: DMatrix::from_column_slice(n, 1, flat_values.as_slice()),
            covariates: DMatrix::from_column_slice(n, 1, flat_covariates.as_slice()),
            rows: values.nrows(),
            cols: values.ncols(),
        })
    }

    /// Pairs every simulated rate with its time to maturity.
    pub fn from_curves(curves: &SimulatedCurves) -> VaeResult<Self> {
        Self::from_matrices(curves.rates(), &curves.maturity_grid())
    }

    /// Flat observations, `len x 1`.
    pub fn observations(&self) -> &DMatrix<f64> {
        &self.observations
    }

    /// Flat covariates, `len x 1`.
    pub fn covariates(&self) -> &DMatrix<f64> {
        &self.covariates
    }

    /// Shape of the matrices the dataset was flattened from.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.observations.nrows()
    }

    /// Returns true if there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `k`-th (value, covariate) pair.
    pub fn pair(&self, k: usize) -> Option<(f64, f64)> {
        (k < self.len()).then(|| (self.observations[(k, 0)], self.covariates[(k, 0)]))
    }

    /// Restores a flat `len x 1` column to the original `rows x cols` layout.
    pub fn unflatten(&self, flat: &DMatrix<f64>) -> VaeResult<DMatrix<f64>> {
        if flat.ncols() != 1 {
            return Err(VaeError::dimension_mismatch("flat columns", 1, flat.ncols()));
        }
        Ok(reshape_row_major(
            &flat.column(0).into_owned(),
            self.rows,
            self.cols,
        )?)
    }

    /// Training batch with covariates as conditions.
    pub fn to_batch(&self) -> VaeResult<Batch> {
        Batch::with_conditions(self.observations.clone(), self.covariates.clone())
    }
}
