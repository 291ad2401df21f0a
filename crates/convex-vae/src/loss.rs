//! Evidence lower bound loss.
//!
//! For a batch of `B` samples:
//!
//! ```text
//! rec_b  = sum_d (x_hat_bd - x_bd)^2
//! kl_b   = 0.5 * sum_j (exp(logvar_bj) + mean_bj^2 - 1 - logvar_bj)
//! loss   = (1 / B) * sum_b [(1 - alpha) * rec_b + alpha * kl_b]
//! ```
//!
//! The KL term is the closed-form divergence of `N(mean, exp(logvar))` from a
//! standard normal prior, so it is non-negative and vanishes only at
//! `mean = 0, logvar = 0`.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{VaeError, VaeResult};

/// Everything a forward pass produces that the loss needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionBundle {
    /// Decoder output `x_hat`.
    pub reconstruction: DMatrix<f64>,
    /// Posterior mean.
    pub mean: DMatrix<f64>,
    /// Posterior log-variance.
    pub logvar: DMatrix<f64>,
}

/// Batch-mean loss and its two components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossBreakdown {
    /// `(1 - alpha) * reconstruction + alpha * kl`.
    pub total: f64,
    /// Mean squared-error sum per sample.
    pub reconstruction: f64,
    /// Mean KL divergence per sample.
    pub kl: f64,
}

/// Gradients of the loss with respect to the bundle entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ElboGradients {
    /// `d loss / d x_hat`.
    pub reconstruction: DMatrix<f64>,
    /// `d loss / d mean` through the KL term only.
    pub mean: DMatrix<f64>,
    /// `d loss / d logvar` through the KL term only.
    pub logvar: DMatrix<f64>,
}

/// Per-sample squared reconstruction error.
pub fn reconstruction_error(
    y_true: &DMatrix<f64>,
    y_pred: &DMatrix<f64>,
) -> VaeResult<DVector<f64>> {
    if y_pred.nrows() != y_true.nrows() {
        return Err(VaeError::dimension_mismatch(
            "reconstruction rows",
            y_true.nrows(),
            y_pred.nrows(),
        ));
    }
    if y_pred.ncols() != y_true.ncols() {
        return Err(VaeError::dimension_mismatch(
            "reconstruction columns",
            y_true.ncols(),
            y_pred.ncols(),
        ));
    }

    Ok(DVector::from_fn(y_true.nrows(), |r, _| {
        (y_pred.row(r) - y_true.row(r)).norm_squared()
    }))
}

/// Per-sample KL divergence from the standard normal prior.
pub fn kl_divergence(mean: &DMatrix<f64>, logvar: &DMatrix<f64>) -> VaeResult<DVector<f64>> {
    if logvar.nrows() != mean.nrows() {
        return Err(VaeError::dimension_mismatch(
            "logvar rows",
            mean.nrows(),
            logvar.nrows(),
        ));
    }
    if logvar.ncols() != mean.ncols() {
        return Err(VaeError::dimension_mismatch(
            "logvar columns",
            mean.ncols(),
            logvar.ncols(),
        ));
    }

    Ok(DVector::from_fn(mean.nrows(), |r, _| {
        let s: f64 = mean
            .row(r)
            .iter()
            .zip(logvar.row(r).iter())
            .map(|(m, lv)| lv.exp_m1() - lv + m * m)
            .sum();
        0.5 * s
    }))
}

/// The weighted ELBO loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElboLoss {
    alpha: f64,
}

impl ElboLoss {
    /// Creates the loss with trade-off weight `alpha` in `[0, 1]`.
    pub fn new(alpha: f64) -> VaeResult<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(VaeError::configuration(format!(
                "alpha must lie in [0, 1], got {alpha}"
            )));
        }
        Ok(Self { alpha })
    }

    /// The trade-off weight.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Evaluates the loss with its components.
    pub fn evaluate(
        &self,
        y_true: &DMatrix<f64>,
        bundle: &PredictionBundle,
    ) -> VaeResult<LossBreakdown> {
        let batch = checked_batch_size(y_true, bundle)?;
        let reconstruction = reconstruction_error(y_true, &bundle.reconstruction)?.sum() / batch;
        let kl = kl_divergence(&bundle.mean, &bundle.logvar)?.sum() / batch;
        let total = (1.0 - self.alpha) * reconstruction + self.alpha * kl;

        if !total.is_finite() {
            return Err(VaeError::non_finite("ELBO loss"));
        }
        Ok(LossBreakdown {
            total,
            reconstruction,
            kl,
        })
    }

    /// Scalar loss, in the `(target, prediction)` form optimizers expect.
    pub fn loss(&self, y_true: &DMatrix<f64>, bundle: &PredictionBundle) -> VaeResult<f64> {
        self.evaluate(y_true, bundle).map(|b| b.total)
    }

    /// Analytic gradients of [`loss`](Self::loss).
    pub fn gradients(
        &self,
        y_true: &DMatrix<f64>,
        bundle: &PredictionBundle,
    ) -> VaeResult<ElboGradients> {
        let batch = checked_batch_size(y_true, bundle)?;
        // Shape checks.
        reconstruction_error(y_true, &bundle.reconstruction)?;
        kl_divergence(&bundle.mean, &bundle.logvar)?;

        let rec_scale = 2.0 * (1.0 - self.alpha) / batch;
        let kl_scale = self.alpha / batch;

        Ok(ElboGradients {
            reconstruction: (&bundle.reconstruction - y_true) * rec_scale,
            mean: &bundle.mean * kl_scale,
            logvar: bundle.logvar.map(|lv| 0.5 * kl_scale * lv.exp_m1()),
        })
    }
}

fn checked_batch_size(y_true: &DMatrix<f64>, bundle: &PredictionBundle) -> VaeResult<f64> {
    if y_true.nrows() == 0 {
        return Err(VaeError::invalid_input("loss of an empty batch"));
    }
    if bundle.mean.nrows() != y_true.nrows() {
        return Err(VaeError::dimension_mismatch(
            "posterior rows",
            y_true.nrows(),
            bundle.mean.nrows(),
        ));
    }
    Ok(y_true.nrows() as f64)
}
