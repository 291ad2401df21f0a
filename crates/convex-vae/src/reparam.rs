//! The reparameterization trick.
//!
//! A latent draw is written as a deterministic function of the posterior
//! parameters and external noise:
//!
//! ```text
//! z = eps * exp(0.5 * logvar) + mean,    eps ~ N(0, I)
//! ```
//!
//! so that `dz/dmean = 1` and `dz/dlogvar = 0.5 * (z - mean)` regardless of
//! which `eps` was drawn. The noise itself carries no gradient.

use nalgebra::DMatrix;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::error::{VaeError, VaeResult};

/// Draws a `rows x cols` matrix of independent standard normal variates.
pub fn standard_normal<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> DMatrix<f64> {
    DMatrix::from_fn(rows, cols, |_, _| StandardNormal.sample(&mut *rng))
}

/// A latent draw together with the pieces needed to differentiate it.
#[derive(Debug, Clone, PartialEq)]
pub struct LatentSample {
    /// The latent code `z`.
    pub z: DMatrix<f64>,
    /// The standard normal noise `eps` used for the draw.
    pub noise: DMatrix<f64>,
    /// `exp(0.5 * logvar)`.
    pub std_dev: DMatrix<f64>,
}

impl LatentSample {
    /// Pathwise gradients of a downstream loss with respect to `mean` and `logvar`.
    ///
    /// Returns `(grad_z, grad_z * 0.5 * (z - mean))`.
    pub fn backward(&self, grad_z: &DMatrix<f64>) -> (DMatrix<f64>, DMatrix<f64>) {
        let half_offset = self.noise.component_mul(&self.std_dev) * 0.5;
        (grad_z.clone(), grad_z.component_mul(&half_offset))
    }
}

/// Samples `z` for the given posterior parameters.
pub fn reparameterize<R: Rng + ?Sized>(
    mean: &DMatrix<f64>,
    logvar: &DMatrix<f64>,
    rng: &mut R,
) -> VaeResult<LatentSample> {
    let noise = standard_normal(mean.nrows(), mean.ncols(), rng);
    reparameterize_with_noise(mean, logvar, &noise)
}

/// Applies the reparameterization to caller-supplied noise.
pub fn reparameterize_with_noise(
    mean: &DMatrix<f64>,
    logvar: &DMatrix<f64>,
    noise: &DMatrix<f64>,
) -> VaeResult<LatentSample> {
    check_same_shape("logvar", mean, logvar)?;
    check_same_shape("noise", mean, noise)?;

    let std_dev = logvar.map(|lv| (0.5 * lv).exp());
    if std_dev.iter().any(|s| !s.is_finite()) {
        return Err(VaeError::non_finite("reparameterization"));
    }

    let z = noise.component_mul(&std_dev) + mean;
    Ok(LatentSample {
        z,
        noise: noise.clone(),
        std_dev,
    })
}

fn check_same_shape(
    what: &'static str,
    mean: &DMatrix<f64>,
    other: &DMatrix<f64>,
) -> VaeResult<()> {
    if other.nrows() != mean.nrows() {
        return Err(VaeError::dimension_mismatch(what, mean.nrows(), other.nrows()));
    }
    if other.ncols() != mean.ncols() {
        return Err(VaeError::dimension_mismatch(what, mean.ncols(), other.ncols()));
    }
    Ok(())
}
