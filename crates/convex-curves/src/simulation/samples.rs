//! Simulated curve batches.

use nalgebra::{DMatrix, DVector};

/// A batch of simulated zero curves on a common grid.
///
/// `rates` has one row per sample and one column per maturity offset. The
/// covariate matrix returned by [`maturity_grid`](Self::maturity_grid) has the
/// same shape and ordering, so entry `(k, i)` pairs `rates[(k, i)]` with its
/// time to maturity `offsets[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedCurves {
    observation_time: f64,
    offsets: Vec<f64>,
    states: DVector<f64>,
    rates: DMatrix<f64>,
}

impl SimulatedCurves {
    pub(crate) fn new(
        observation_time: f64,
        offsets: Vec<f64>,
        states: DVector<f64>,
        rates: DMatrix<f64>,
    ) -> Self {
        Self {
            observation_time,
            offsets,
            states,
            rates,
        }
    }

    /// Observation time `t`.
    pub fn observation_time(&self) -> f64 {
        self.observation_time
    }

    /// Maturity offsets `Delta`.
    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    /// The latent states `x` that generated each row.
    pub fn states(&self) -> &DVector<f64> {
        &self.states
    }

    /// Zero rates, `num_samples x num_offsets`.
    pub fn rates(&self) -> &DMatrix<f64> {
        &self.rates
    }

    /// Consumes the batch and returns the rate matrix.
    pub fn into_rates(self) -> DMatrix<f64> {
        self.rates
    }

    /// Number of simulated curves.
    pub fn num_samples(&self) -> usize {
        self.rates.nrows()
    }

    /// Number of points per curve.
    pub fn num_offsets(&self) -> usize {
        self.rates.ncols()
    }

    /// Time-to-maturity covariates, same shape as [`rates`](Self::rates).
    pub fn maturity_grid(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.num_samples(), self.num_offsets(), |_, i| {
            self.offsets[i]
        })
    }

    /// Sample mean of the rates at offset index `i`.
    pub fn column_mean(&self, i: usize) -> f64 {
        self.rates.column(i).mean()
    }

    /// Unbiased sample variance of the rates at offset index `i`.
    ///
    /// Returns zero for a single sample.
    pub fn column_variance(&self, i: usize) -> f64 {
        let n = self.num_samples();
        if n < 2 {
            return 0.0;
        }
        let mean = self.column_mean(i);
        let ss: f64 = self.rates.column(i).iter().map(|r| (r - mean).powi(2)).sum();
        ss / (n - 1) as f64
    }

    /// Rows as plain vectors, for tabular output.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rates
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }
}
