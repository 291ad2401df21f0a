//! Plain variational autoencoder.

use nalgebra::DMatrix;
use rand::Rng;
use tracing::debug;

use convex_config::{Validate, VaeConfig};

use crate::autoencoder::EncoderDecoder;
use crate::error::{VaeError, VaeResult};
use crate::loss::{ElboLoss, LossBreakdown, PredictionBundle};
use crate::reparam::{self, standard_normal};
use crate::training::{Batch, Trainable};

/// Variational autoencoder over whole curves.
///
/// - encoder: `input_dim -> hidden_dim (LeakyReLU) -> 2 * latent_dim`, split
///   into `[mean | logvar]`
/// - decoder: `latent_dim -> hidden_dim (LeakyReLU) -> input_dim` (linear)
///
/// Dimensions and `alpha` are fixed at construction. Only the parameters
/// change afterwards, through [`set_parameters`](Trainable::set_parameters).
///
/// # Parameter order
///
/// Encoder hidden weights, encoder hidden bias, encoder output weights,
/// encoder output bias, then the same four for the decoder. Weight matrices
/// are `in x out` and flattened column-major.
///
/// # Example
///
/// ```rust
/// use convex_config::VaeConfig;
/// use convex_vae::Vae;
/// use nalgebra::DMatrix;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let vae = Vae::new(VaeConfig::new(4, 8, 2), &mut rng).unwrap();
///
/// let x = DMatrix::from_element(3, 4, 0.01);
/// let bundle = vae.forward(&x, &mut rng).unwrap();
/// assert_eq!(bundle.reconstruction.shape(), (3, 4));
/// assert_eq!(bundle.mean.shape(), (3, 2));
///
/// let curves = vae.generate(5, &mut rng).unwrap();
/// assert_eq!(curves.shape(), (5, 4));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Vae {
    config: VaeConfig,
    networks: EncoderDecoder,
    loss: ElboLoss,
}

impl Vae {
    /// Builds a randomly initialized model.
    ///
    /// # Errors
    ///
    /// Returns [`VaeError::Configuration`] if the configuration is invalid.
    pub fn new<R: Rng + ?Sized>(config: VaeConfig, rng: &mut R) -> VaeResult<Self> {
        config.validate_or_error()?;

        let networks = EncoderDecoder::new(
            config.input_dim,
            config.latent_dim,
            config.hidden_dim,
            config.latent_dim,
            config.input_dim,
            config.negative_slope,
            rng,
        )?;
        let loss = ElboLoss::new(config.alpha)?;

        debug!(
            input_dim = config.input_dim,
            hidden_dim = config.hidden_dim,
            latent_dim = config.latent_dim,
            alpha = config.alpha,
            parameters = networks.parameter_count(),
            "initialized VAE"
        );

        Ok(Self {
            config,
            networks,
            loss,
        })
    }

    /// The construction-time configuration.
    pub fn config(&self) -> &VaeConfig {
        &self.config
    }

    /// Reconstruction/KL trade-off weight.
    pub fn alpha(&self) -> f64 {
        self.loss.alpha()
    }

    /// Posterior parameters `(mean, logvar)`, each `batch x latent_dim`.
    pub fn encode(&self, x: &DMatrix<f64>) -> VaeResult<(DMatrix<f64>, DMatrix<f64>)> {
        self.check_inputs(x)?;
        self.networks.encode(x)
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

    /// Maps latent codes back to curves.
    pub fn decode(&self, z: &DMatrix<f64>) -> VaeResult<DMatrix<f64>> {
        self.check_latent(z)?;
        self.networks.decode(z, None)
    }

    /// Encode, reparameterize and decode in one pass.
    pub fn forward<R: Rng + ?Sized>(
        &self,
        x: &DMatrix<f64>,
        rng: &mut R,
    ) -> VaeResult<PredictionBundle> {
        let noise = standard_normal(x.nrows(), self.config.latent_dim, rng);
        self.forward_with_noise(x, &noise)
    }

    /// [`forward`](Self::forward) with caller-supplied reparameterization noise.
    pub fn forward_with_noise(
        &self,
        x: &DMatrix<f64>,
        noise: &DMatrix<f64>,
    ) -> VaeResult<PredictionBundle> {
        self.check_inputs(x)?;
        self.networks
            .forward_cached(x, None, noise)
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

    /// Loss on `x` for the given noise, and its gradient in parameter order.
    pub fn loss_and_gradients_with_noise(
        &self,
        x: &DMatrix<f64>,
        noise: &DMatrix<f64>,
    ) -> VaeResult<(LossBreakdown, Vec<f64>)> {
        self.check_inputs(x)?;
        let (bundle, cache) = self.networks.forward_cached(x, None, noise)?;
        let breakdown = self.loss.evaluate(x, &bundle)?;
        let grads = self.loss.gradients(x, &bundle)?;
        Ok((breakdown, self.networks.backward(&cache, &grads)?))
    }

    /// Decodes the posterior mean, without sampling.
    pub fn reconstruct(&self, x: &DMatrix<f64>) -> VaeResult<DMatrix<f64>> {
        let (mean, _) = self.encode(x)?;
        self.networks.decode(&mean, None)
    }

    /// Generates `n` curves from standard normal latent draws.
    pub fn generate<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> VaeResult<DMatrix<f64>> {
        let noise = standard_normal(n, self.config.latent_dim, rng);
        self.generate_from_noise(&noise)
    }

    /// Decodes the given latent noise, bypassing the encoder.
    ///
    /// # Errors
    ///
    /// Fails if `noise` has no rows or the wrong width.
    pub fn generate_from_noise(&self, noise: &DMatrix<f64>) -> VaeResult<DMatrix<f64>> {
        if noise.nrows() == 0 {
            return Err(VaeError::invalid_input("generation needs at least one latent draw"));
        }
        let samples = self.decode(noise)?;
        debug!(n = samples.nrows(), width = samples.ncols(), "generated curves");
        Ok(samples)
    }

    fn check_inputs(&self, x: &DMatrix<f64>) -> VaeResult<()> {
        if x.ncols() != self.config.input_dim {
            return Err(VaeError::dimension_mismatch(
                "observation columns",
                self.config.input_dim,
                x.ncols(),
            ));
        }
        Ok(())
    }

    fn check_latent(&self, z: &DMatrix<f64>) -> VaeResult<()> {
        if z.ncols() != self.config.latent_dim {
            return Err(VaeError::dimension_mismatch(
                "latent columns",
                self.config.latent_dim,
                z.ncols(),
            ));
        }
        Ok(())
    }
}

impl Trainable for Vae {
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
        if batch.conditions().is_some() {
            return Err(VaeError::invalid_input(
                "the unconditional model does not take conditions",
            ));
        }
        self.loss_and_gradients_with_noise(batch.inputs(), noise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use convex_math::optimization::numerical_gradient;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model(alpha: f64) -> Vae {
        let config = VaeConfig::new(3, 6, 2).with_alpha(alpha);
        Vae::new(config, &mut StdRng::seed_from_u64(21)).unwrap()
    }

    fn data() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            4,
            3,
            &[0.1, 0.2, 0.3, -0.4, 0.0, 0.5, 1.0, -1.0, 0.2, 0.3, 0.3, 0.3],
        )
    }

    #[test]
    fn test_shapes() {
        let vae = model(0.01);
        let mut rng = StdRng::seed_from_u64(1);
        let (mean, logvar) = vae.encode(&data()).unwrap();
        assert_eq!(mean.shape(), (4, 2));
        assert_eq!(logvar.shape(), (4, 2));

        let z = vae.reparameterize(&mean, &logvar, &mut rng).unwrap();
        assert_eq!(vae.decode(&z).unwrap().shape(), (4, 3));
        assert_eq!(vae.reconstruct(&data()).unwrap().shape(), (4, 3));
        assert_eq!(vae.parameter_count(), (3 * 6 + 6 + 6 * 4 + 4) + (2 * 6 + 6 + 6 * 3 + 3));
    }

    #[test]
    fn test_invalid_config() {
        let config = VaeConfig::new(3, 6, 2).with_alpha(2.0);
        assert!(matches!(
            Vae::new(config, &mut StdRng::seed_from_u64(0)),
            Err(VaeError::Configuration { .. })
        ));
    }

    #[test]
    fn test_wrong_widths() {
        let vae = model(0.01);
        assert!(matches!(
            vae.encode(&DMatrix::zeros(2, 5)),
            Err(VaeError::DimensionMismatch { what: "observation columns", .. })
        ));
        assert!(matches!(
            vae.generate_from_noise(&DMatrix::zeros(2, 1)),
            Err(VaeError::DimensionMismatch { what: "latent columns", .. })
        ));
    }

    #[test]
    fn test_generate_rejects_zero_draws() {
        let vae = model(0.01);
        assert!(matches!(
            vae.generate(0, &mut StdRng::seed_from_u64(1)),
            Err(VaeError::InvalidInput { .. })
        ));
        assert!(vae.generate_from_noise(&DMatrix::zeros(0, 2)).is_err());
    }

    #[test]
    fn test_forward_is_deterministic_given_noise() {
        let vae = model(0.01);
        let noise = standard_normal(4, 2, &mut StdRng::seed_from_u64(8));
        let a = vae.forward_with_noise(&data(), &noise).unwrap();
        let b = vae.forward_with_noise(&data(), &noise).unwrap();
        assert_eq!(a, b);

        let (mean, logvar) = vae.encode(&data()).unwrap();
        assert_eq!(a.mean, mean);
        assert_eq!(a.logvar, logvar);
    }

    #[test]
    fn test_loss_matches_components() {
        let vae = model(0.25);
        let noise = standard_normal(4, 2, &mut StdRng::seed_from_u64(8));
        let bundle = vae.forward_with_noise(&data(), &noise).unwrap();

        let b = vae.loss_breakdown(&data(), &bundle).unwrap();
        assert_relative_eq!(b.total, 0.75 * b.reconstruction + 0.25 * b.kl, max_relative = 1e-14);
        assert_relative_eq!(vae.loss(&data(), &bundle).unwrap(), b.total);
        assert!(b.kl >= 0.0);
    }

    #[test]
    fn test_gradients_match_numerical() {
        let vae = model(0.3);
        let x = data();
        let noise = standard_normal(4, 2, &mut StdRng::seed_from_u64(13));
        let (_, analytic) = vae.loss_and_gradients_with_noise(&x, &noise).unwrap();

        let numeric = numerical_gradient(
            |p| {
                let mut probe = vae.clone();
                probe.set_parameters(p).unwrap();
                let bundle = probe.forward_with_noise(&x, &noise).unwrap();
                probe.loss(&x, &bundle).unwrap()
            },
            &vae.parameters(),
            1e-6,
        );

        assert_eq!(analytic.len(), vae.parameter_count());
        for (i, (a, n)) in analytic.iter().zip(&numeric).enumerate() {
            assert!(
                (a - n).abs() <= 1e-6 * (1.0 + n.abs()),
                "parameter {i}: analytic {a} vs numeric {n}"
            );
        }
    }

    #[test]
    fn test_parameter_round_trip() {
        let mut vae = model(0.01);
        let other = Vae::new(VaeConfig::new(3, 6, 2), &mut StdRng::seed_from_u64(99)).unwrap();

        vae.set_parameters(&other.parameters()).unwrap();
        assert_eq!(vae.parameters(), other.parameters());
        assert!(vae.set_parameters(&[0.0; 3]).is_err());
    }

    #[test]
    fn test_generate_is_seeded() {
        let vae = model(0.01);
        let a = vae.generate(6, &mut StdRng::seed_from_u64(4)).unwrap();
        let b = vae.generate(6, &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(a.shape(), (6, 3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_conditional_batch() {
        let vae = model(0.01);
        let batch = Batch::with_conditions(data(), DMatrix::zeros(4, 1)).unwrap();
        assert!(vae
            .loss_and_gradients(&batch, &DMatrix::zeros(4, 2))
            .is_err());
    }
}
