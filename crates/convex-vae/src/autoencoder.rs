//! Encoder/decoder pair shared by the plain and conditional models.

use nalgebra::DMatrix;
use rand::Rng;

use convex_math::linear_algebra::{ensure_finite, hconcat, split_columns};

use crate::error::{VaeError, VaeResult};
use crate::loss::{ElboGradients, PredictionBundle};
use crate::network::{Mlp, MlpCache};
use crate::reparam::{reparameterize_with_noise, LatentSample};

/// Encoder output is `[mean | logvar]`; the decoder sees `[z | condition]`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EncoderDecoder {
    encoder: Mlp,
    decoder: Mlp,
    latent_dim: usize,
}

pub(crate) struct ForwardCache {
    encoder: MlpCache,
    sample: LatentSample,
    decoder: MlpCache,
}

impl EncoderDecoder {
    pub(crate) fn new<R: Rng + ?Sized>(
        encoder_input_dim: usize,
        decoder_input_dim: usize,
        hidden_dim: usize,
        latent_dim: usize,
        output_dim: usize,
        negative_slope: f64,
        rng: &mut R,
    ) -> VaeResult<Self> {
        let encoder = Mlp::new(encoder_input_dim, hidden_dim, 2 * latent_dim, negative_slope, rng)?;
        let decoder = Mlp::new(decoder_input_dim, hidden_dim, output_dim, negative_slope, rng)?;
        Ok(Self {
            encoder,
            decoder,
            latent_dim,
        })
    }

    pub(crate) fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    pub(crate) fn encode(
        &self,
        encoder_input: &DMatrix<f64>,
    ) -> VaeResult<(DMatrix<f64>, DMatrix<f64>)> {
        let output = self.encoder.forward(encoder_input)?;
        Ok(split_columns(&output, self.latent_dim)?)
    }

    pub(crate) fn decode(
        &self,
        z: &DMatrix<f64>,
        condition: Option<&DMatrix<f64>>,
    ) -> VaeResult<DMatrix<f64>> {
        let decoded = self.decoder.forward(&decoder_input(z, condition)?)?;
        ensure_finite(&decoded, "decoder")?;
        Ok(decoded)
    }

    pub(crate) fn forward_cached(
        &self,
        encoder_input: &DMatrix<f64>,
        condition: Option<&DMatrix<f64>>,
        noise: &DMatrix<f64>,
    ) -> VaeResult<(PredictionBundle, ForwardCache)> {
        let (encoded, encoder) = self.encoder.forward_cached(encoder_input)?;
        let (mean, logvar) = split_columns(&encoded, self.latent_dim)?;
        let sample = reparameterize_with_noise(&mean, &logvar, noise)?;
        let (reconstruction, decoder) = self
            .decoder
            .forward_cached(&decoder_input(&sample.z, condition)?)?;
        ensure_finite(&reconstruction, "decoder")?;

        let bundle = PredictionBundle {
            reconstruction,
            mean,
            logvar,
        };
        let cache = ForwardCache {
            encoder,
            sample,
            decoder,
        };
        Ok((bundle, cache))
    }

    /// Chains the loss gradients back to every parameter.
    pub(crate) fn backward(
        &self,
        cache: &ForwardCache,
        grads: &ElboGradients,
    ) -> VaeResult<Vec<f64>> {
        let (decoder_grads, grad_decoder_input) =
            self.decoder.backward(&cache.decoder, &grads.reconstruction);
        // Covariate columns carry no parameters upstream.
        let (grad_z, _) = split_columns(&grad_decoder_input, self.latent_dim)?;

        let (via_z_mean, via_z_logvar) = cache.sample.backward(&grad_z);
        let grad_mean = via_z_mean + &grads.mean;
        let grad_logvar = via_z_logvar + &grads.logvar;

        let grad_encoded = hconcat(&grad_mean, &grad_logvar)?;
        let (encoder_grads, _) = self.encoder.backward(&cache.encoder, &grad_encoded);

        let mut flat = Vec::with_capacity(self.parameter_count());
        encoder_grads.write_flat(&mut flat);
        decoder_grads.write_flat(&mut flat);
        Ok(flat)
    }

    pub(crate) fn parameter_count(&self) -> usize {
        self.encoder.parameter_count() + self.decoder.parameter_count()
    }

    pub(crate) fn parameters(&self) -> Vec<f64> {
        let mut flat = Vec::with_capacity(self.parameter_count());
        self.encoder.write_parameters(&mut flat);
        self.decoder.write_parameters(&mut flat);
        flat
    }

    pub(crate) fn set_parameters(&mut self, params: &[f64]) -> VaeResult<()> {
        if params.len() != self.parameter_count() {
            return Err(VaeError::dimension_mismatch(
                "parameter vector length",
                self.parameter_count(),
                params.len(),
            ));
        }
        if params.iter().any(|p| !p.is_finite()) {
            return Err(VaeError::non_finite("parameter update"));
        }

        let used = self.encoder.read_parameters(params)?;
        self.decoder.read_parameters(&params[used..])?;
        Ok(())
    }
}

fn decoder_input(z: &DMatrix<f64>, condition: Option<&DMatrix<f64>>) -> VaeResult<DMatrix<f64>> {
    match condition {
        Some(c) => Ok(hconcat(z, c)?),
        None => Ok(z.clone()),
    }
}
