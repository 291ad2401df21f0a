//! Conditional variational autoencoder.
//!
//! Every encode and decode call also consumes a covariate row `c`, which is
//! concatenated to the network input: the encoder sees `[x | c]` and the
//! decoder sees `[z | c]`.
//!
//! # Cartesian generation
//!
//! [`ConditionalVae::generate_from_noise`] evaluates each of `n` latent draws
//! against each of `m` condition rows. The flat decoder batch has `n * m`
//! rows ordered condition-major:
//!
//! ```text
//! flat row k = j * n + i   <->   (latent draw i, condition j)
//! ```
//!
//! and the result is unpacked with exactly that mapping, so
//! `samples[(i, j * d + q)]` is output component `q` of draw `i` under
//! condition `j`, and `matched_conditions[(i, j * k_c + q)]` is the condition
//! that produced it.

use nalgebra::DMatrix;
use rand::Rng;
use tracing::debug;

use convex_config::{ConditionalVaeConfig, Validate};
use convex_math::linear_algebra::{hconcat, repeat_rows, tile_rows};

use crate::autoencoder::EncoderDecoder;
use crate::error::{VaeError, VaeResult};
use crate::loss::{ElboLoss, LossBreakdown, PredictionBundle};
use crate::reparam::{self, standard_normal};
use crate::training::{Batch, Trainable};

/// Decoded outputs for every (latent draw, condition) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalSamples {
    samples: DMatrix<f64>,
    matched_conditions: DMatrix<f64>,
    num_conditions: usize,
    output_dim: usize,
    condition_dim: usize,
}

impl ConditionalSamples {
    /// `n x (m * output_dim)`: row `i` is latent draw `i`, column block `j` is condition `j`.
    pub fn samples(&self) -> &DMatrix<f64> {
        &self.samples
    }

    /// `n x (m * condition_dim)`, aligned block for block with [`samples`](Self::samples).
    pub fn matched_conditions(&self) -> &DMatrix<f64> {
        &self.matched_conditions
    }

    /// Number of latent draws `n`.
    pub fn num_draws(&self) -> usize {
        self.samples.nrows()
    }

    /// Number of conditions `m`.
    pub fn num_conditions(&self) -> usize {
        self.num_conditions
    }

    /// Decoded output for draw `i` under condition `j`.
    pub fn sample(&self, i: usize, j: usize) -> Vec<f64> {
        let start = j * self.output_dim;
        (start..start + self.output_dim)
            .map(|col| self.samples[(i, col)])
            .collect()
    }

    /// Condition paired with draw `i` in block `j`.
    pub fn condition(&self, i: usize, j: usize) -> Vec<f64> {
        let start = j * self.condition_dim;
        (start..start + self.condition_dim)
            .map(|col| self.matched_conditions[(i, col)])
            .collect()
    }

    /// All draws for condition `j`, `n x output_dim`.
    pub fn for_condition(&self, j: usize) -> DMatrix<f64> {
        self.samples
            .columns(j * self.output_dim, self.output_dim)
            .into_owned()
    }
}

/// Conditional VAE.
///
/// - encoder: `input_dim -> hidden_dim (LeakyReLU) -> 2 * latent_dim`, with
///   `input_dim = output_dim + condition_dim`
/// - decoder: `latent_dim + condition_dim -> hidden_dim (LeakyReLU) -> output_dim`
///
/// Parameters are ordered as for [`Vae`](crate::Vae).
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalVae {
    config: ConditionalVaeConfig,
    networks: EncoderDecoder,
    loss: ElboLoss,
}

impl ConditionalVae {
    /// Builds a randomly initialized model.
    ///
    /// # Errors
    ///
    /// Returns [`VaeError::Configuration`] if the configuration is invalid,
    /// including `input_dim <= output_dim`.
    pub fn new<R: Rng + ?Sized>(config: ConditionalVaeConfig, rng: &mut R) -> VaeResult<Self> {
        config.validate_or_error()?;

        let networks = EncoderDecoder::new(
            config.input_dim,
            config.decoder_input_dim(),
            config.hidden_dim,
            config.latent_dim,
            config.output_dim,
            config.negative_slope,
            rng,
        )?;
        let loss = ElboLoss::new(config.alpha)?;

        debug!(
            input_dim = config.input_dim,
            output_dim = config.output_dim,
            condition_dim = config.condition_dim(),
            latent_dim = config.latent_dim,
            alpha = config.alpha,
            "initialized conditional VAE"
        );

        Ok(Self {
            config,
            networks,
            loss,
        })
    }

    /// The construction-time configuration.
    pub fn config(&self) -> &ConditionalVaeConfig {
        &self.config
    }

    /// Width of a condition row.
    pub fn condition_dim(&self) -> usize {
        self.config.condition_dim()
    }

    /// Posterior parameters for observations `x` under conditions `c`.
    pub fn encode(
        &self,
        x: &DMatrix<f64>,
        c: &DMatrix<f64>,
    ) -> VaeResult<(DMatrix<f64>, DMatrix<f64>)> {
        let input = self.encoder_input(x, c)?;
        self.networks.encode(&input)
    }

    /// Draws `z = eps * exp(0.5 * logvar) + mean`.
    pub fn reparameterize<R: Rng + ?Sized>(
        &self,
        mean: &DMatrix<f64>,
        logvar: &DMatrix<f64>,
        rng: &mut R,
    ) -> VaeResult<DMatrix<f64>> {
        Ok(reparam::reparameterize(mean, logvar, rng)?.z)
    }

    /// Decodes latent codes `z` under conditions `c`, row by row.
    pub fn decode(&self, z: &DMatrix<f64>, c: &DMatrix<f64>) -> VaeResult<DMatrix<f64>> {
        if z.ncols() != self.config.latent_dim {
            return Err(VaeError::dimension_mismatch(
                "latent columns",
                self.config.latent_dim,
                z.ncols(),
            ));
        }
        self.check_conditions(z.nrows(), c)?;
        self.networks.decode(z, Some(c))
    }

    /// Encode, reparameterize and decode in one pass.
    pub fn forward<R: Rng + ?Sized>(
        &self,
        x: &DMatrix<f64>,
        c: &DMatrix<f64>,
        rng: &mut R,
    ) -> VaeResult<PredictionBundle> {
        let noise = standard_normal(x.nrows(), self.config.latent_dim, rng);
        self.forward_with_noise(x, c, &noise)
    }

    /// [`forward`](Self::forward) with caller-supplied reparameterization noise.
    pub fn forward_with_noise(
        &self,
        x: &DMatrix<f64>,
        c: &DMatrix<f64>,
        noise: &DMatrix<f64>,
    ) -> VaeResult<PredictionBundle> {
        let input = self.encoder_input(x, c)?;
        self.networks
            .forward_cached(&input, Some(c), noise)
            .map(|(bundle, _)| bundle)
    }

    /// Scalar ELBO loss of a forward pass.
    pub fn loss(&self, y_true: &DMatrix<f64>, bundle: &PredictionBundle) -> VaeResult<f64> {
        self.loss.loss(y_true, bundle)
    }

    /// ELBO loss with its reconstruction and KL components.
    pub fn loss_breakdown(
        &self,
        y_true: &DMatrix<f64>,
        bundle: &PredictionBundle,
    ) -> VaeResult<LossBreakdown> {
        self.loss.evaluate(y_true, bundle)
    }

    /// Loss for the given noise, and its gradient in parameter order.
    pub fn loss_and_gradients_with_noise(
        &self,
        x: &DMatrix<f64>,
        c: &DMatrix<f64>,
        noise: &DMatrix<f64>,
    ) -> VaeResult<(LossBreakdown, Vec<f64>)> {
        let input = self.encoder_input(x, c)?;
        let (bundle, cache) = self.networks.forward_cached(&input, Some(c), noise)?;
        let breakdown = self.loss.evaluate(x, &bundle)?;
        let grads = self.loss.gradients(x, &bundle)?;
        Ok((breakdown, self.networks.backward(&cache, &grads)?))
    }

    /// Decodes the posterior mean under the same conditions.
    pub fn reconstruct(&self, x: &DMatrix<f64>, c: &DMatrix<f64>) -> VaeResult<DMatrix<f64>> {
        let (mean, _) = self.encode(x, c)?;
        self.networks.decode(&mean, Some(c))
    }

    /// Draws `n` latent codes and decodes each under every condition row.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        n: usize,
        conditions: &DMatrix<f64>,
        rng: &mut R,
    ) -> VaeResult<ConditionalSamples> {
        let noise = standard_normal(n, self.config.latent_dim, rng);
        self.generate_from_noise(&noise, conditions)
    }

    /// Cartesian-product generation from explicit latent noise.
    ///
    /// # Errors
    ///
    /// Fails if there are no draws or no conditions, or if `noise` or
    /// `conditions` have the wrong width.
    pub fn generate_from_noise(
        &self,
        noise: &DMatrix<f64>,
        conditions: &DMatrix<f64>,
    ) -> VaeResult<ConditionalSamples> {
        let n = noise.nrows();
        let m = conditions.nrows();
        if n == 0 || m == 0 {
            return Err(VaeError::invalid_input(format!(
                "cartesian generation needs at least one draw and one condition, got {n} x {m}"
            )));
        }
        if conditions.ncols() != self.condition_dim() {
            return Err(VaeError::dimension_mismatch(
                "condition columns",
                self.condition_dim(),
                conditions.ncols(),
            ));
        }

        // Flat row j * n + i pairs draw i with condition j.
        let z_flat = tile_rows(noise, m);
        let c_flat = repeat_rows(conditions, n);
        let decoded = self.decode(&z_flat, &c_flat)?;

        let d = self.config.output_dim;
        let kc = self.condition_dim();
        let samples = DMatrix::from_fn(n, m * d, |i, col| decoded[((col / d) * n + i, col % d)]);
        let matched_conditions =
            DMatrix::from_fn(n, m * kc, |i, col| c_flat[((col / kc) * n + i, col % kc)]);

        debug!(draws = n, conditions = m, "generated conditional samples");

        Ok(ConditionalSamples {
            samples,
            matched_conditions,
            num_conditions: m,
            output_dim: d,
            condition_dim: kc,
        })
    }

    fn check_conditions(&self, rows: usize, c: &DMatrix<f64>) -> VaeResult<()> {
        if c.nrows() != rows {
            return Err(VaeError::dimension_mismatch("condition rows", rows, c.nrows()));
        }
        if c.ncols() != self.condition_dim() {
            return Err(VaeError::dimension_mismatch(
                "condition columns",
                self.condition_dim(),
                c.ncols(),
            ));
        }
        Ok(())
    }

    fn encoder_input(&self, x: &DMatrix<f64>, c: &DMatrix<f64>) -> VaeResult<DMatrix<f64>> {
        if x.ncols() != self.config.output_dim {
            return Err(VaeError::dimension_mismatch(
                "observation columns",
                self.config.output_dim,
                x.ncols(),
            ));
        }
        self.check_conditions(x.nrows(), c)?;
        Ok(hconcat(x, c)?)
    }
}

impl Trainable for ConditionalVae {
    fn parameter_count(&self) -> usize {
        self.networks.parameter_count()
    }

    fn parameters(&self) -> Vec<f64> {
        self.networks.parameters()
    }

    fn set_parameters(&mut self, params: &[f64]) -> VaeResult<()> {
        self.networks.set_parameters(params)
    }

    fn latent_dim(&self) -> usize {
        self.networks.latent_dim()
    }

    fn loss_and_gradients(
        &self,
        batch: &Batch,
        noise: &DMatrix<f64>,
    ) -> VaeResult<(LossBreakdown, Vec<f64>)> {
        let conditions = batch
            .conditions()
            .ok_or_else(|| VaeError::invalid_input("the conditional model needs conditions"))?;
        self.loss_and_gradients_with_noise(batch.inputs(), conditions, noise)
    }
}
