//! Two-layer perceptron used for both the encoder and the decoder.

use nalgebra::DMatrix;
use rand::Rng;

use convex_math::activation::LeakyRelu;

use crate::error::VaeResult;
use crate::layers::{Dense, DenseGradients};

/// `Dense -> LeakyReLU -> Dense` with a linear output.
#[derive(Debug, Clone, PartialEq)]
pub struct Mlp {
    hidden: Dense,
    output: Dense,
    activation: LeakyRelu,
}

/// Intermediate values kept from a forward pass for back-propagation.
#[derive(Debug, Clone)]
pub struct MlpCache {
    input: DMatrix<f64>,
    pre_activation: DMatrix<f64>,
    activated: DMatrix<f64>,
}

/// Parameter gradients of an [`Mlp`].
#[derive(Debug, Clone, PartialEq)]
pub struct MlpGradients {
    /// Hidden layer gradients.
    pub hidden: DenseGradients,
    /// Output layer gradients.
    pub output: DenseGradients,
}

impl MlpGradients {
    /// Appends the gradients in parameter order.
    pub fn write_flat(&self, out: &mut Vec<f64>) {
        self.hidden.write_flat(out);
        self.output.write_flat(out);
    }
}

impl Mlp {
    /// Creates a randomly initialized network.
    pub fn new<R: Rng + ?Sized>(
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
        negative_slope: f64,
        rng: &mut R,
    ) -> VaeResult<Self> {
        Ok(Self {
            hidden: Dense::new(input_dim, hidden_dim, rng)?,
            output: Dense::new(hidden_dim, output_dim, rng)?,
            activation: LeakyRelu::new(negative_slope)?,
        })
    }

    /// Width of the network input.
    pub fn input_dim(&self) -> usize {
        self.hidden.input_dim()
    }

    /// Width of the network output.
    pub fn output_dim(&self) -> usize {
        self.output.output_dim()
    }

    /// Number of scalar parameters.
    pub fn parameter_count(&self) -> usize {
        self.hidden.parameter_count() + self.output.parameter_count()
    }

    /// Evaluates the network on a batch.
    pub fn forward(&self, input: &DMatrix<f64>) -> VaeResult<DMatrix<f64>> {
        self.forward_cached(input).map(|(output, _)| output)
    }

    /// Evaluates the network and keeps what [`backward`](Self::backward) needs.
    pub fn forward_cached(&self, input: &DMatrix<f64>) -> VaeResult<(DMatrix<f64>, MlpCache)> {
        let pre_activation = self.hidden.forward(input)?;
        let activated = self.activation.apply(&pre_activation);
        let output = self.output.forward(&activated)?;

        let cache = MlpCache {
            input: input.clone(),
            pre_activation,
            activated,
        };
        Ok((output, cache))
    }

    /// Back-propagates `grad_output` through the cached forward pass.
    pub fn backward(
        &self,
        cache: &MlpCache,
        grad_output: &DMatrix<f64>,
    ) -> (MlpGradients, DMatrix<f64>) {
        let (output, grad_activated) = self.output.backward(&cache.activated, grad_output);
        let grad_pre = self.activation.backward(&cache.pre_activation, &grad_activated);
        let (hidden, grad_input) = self.hidden.backward(&cache.input, &grad_pre);
        (MlpGradients { hidden, output }, grad_input)
    }

    /// Appends the parameters: hidden layer, then output layer.
    pub fn write_parameters(&self, out: &mut Vec<f64>) {
        self.hidden.write_parameters(out);
        self.output.write_parameters(out);
    }

    /// Overwrites the parameters from the front of `params`; returns the count consumed.
    pub fn read_parameters(&mut self, params: &[f64]) -> VaeResult<usize> {
        let used = self.hidden.read_parameters(params)?;
        Ok(used + self.output.read_parameters(&params[used..])?)
    }
}
