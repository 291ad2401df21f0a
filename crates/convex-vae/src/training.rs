//! Training harness.
//!
//! The models only expose a loss and its gradient with respect to a flat
//! parameter vector ([`Trainable`]). [`Trainer`] drives them with an Adam
//! optimizer from `convex-math`, drawing fresh reparameterization noise and
//! (optionally) a random minibatch at every iteration.

use std::borrow::Cow;

use nalgebra::DMatrix;
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use convex_config::{TrainingConfig, Validate};
use convex_math::optimization::{Adam, AdamConfig, GradientOptimizer};

use crate::error::{VaeError, VaeResult};
use crate::loss::LossBreakdown;
use crate::reparam::standard_normal;

/// Training inputs: observations and, for conditional models, their covariates.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    inputs: DMatrix<f64>,
    conditions: Option<DMatrix<f64>>,
}

impl Batch {
    /// An unconditional batch.
    pub fn new(inputs: DMatrix<f64>) -> Self {
        Self {
            inputs,
            conditions: None,
        }
    }

    /// A conditional batch; row `k` of `conditions` belongs to row `k` of `inputs`.
    pub fn with_conditions(inputs: DMatrix<f64>, conditions: DMatrix<f64>) -> VaeResult<Self> {
        if conditions.nrows() != inputs.nrows() {
            return Err(VaeError::dimension_mismatch(
                "condition rows",
                inputs.nrows(),
                conditions.nrows(),
            ));
        }
        Ok(Self {
            inputs,
            conditions: Some(conditions),
        })
    }

    /// Observations.
    pub fn inputs(&self) -> &DMatrix<f64> {
        &self.inputs
    }

    /// Covariates, if any.
    pub fn conditions(&self) -> Option<&DMatrix<f64>> {
        self.conditions.as_ref()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.inputs.nrows()
    }

    /// Returns true if the batch has no rows.
    pub fn is_empty(&self) -> bool {
        self.inputs.nrows() == 0
    }

    /// Selects rows, keeping observations and covariates paired.
    pub fn select(&self, rows: &[usize]) -> Self {
        Self {
            inputs: self.inputs.select_rows(rows),
            conditions: self.conditions.as_ref().map(|c| c.select_rows(rows)),
        }
    }
}

/// A model that can be fitted by gradient descent on a flat parameter vector.
pub trait Trainable {
    /// Number of scalar parameters.
    fn parameter_count(&self) -> usize;

    /// Current parameters, in the model's documented order.
    fn parameters(&self) -> Vec<f64>;

    /// Replaces all parameters.
    fn set_parameters(&mut self, params: &[f64]) -> VaeResult<()>;

    /// Width of the latent code; the trainer draws noise of this width.
    fn latent_dim(&self) -> usize;

    /// Loss on `batch` using the given reparameterization noise, and its
    /// gradient aligned with [`parameters`](Self::parameters).
    fn loss_and_gradients(
        &self,
        batch: &Batch,
        noise: &DMatrix<f64>,
    ) -> VaeResult<(LossBreakdown, Vec<f64>)>;
}

/// Outcome of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Training loss at every iteration (on that iteration's minibatch).
    pub loss_history: Vec<f64>,
    /// Full-batch loss before the first update.
    pub initial_loss: LossBreakdown,
    /// Full-batch loss after the last update, with the same noise as `initial_loss`.
    pub final_loss: LossBreakdown,
    /// Number of optimizer steps taken.
    pub iterations: usize,
}

impl TrainingReport {
    /// Returns true if the full-batch loss went down.
    pub fn improved(&self) -> bool {
        self.final_loss.total < self.initial_loss.total
    }
}

/// Adam-based trainer.
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    /// Creates a trainer from a validated configuration.
    pub fn new(config: TrainingConfig) -> VaeResult<Self> {
        config.validate_or_error()?;
        Ok(Self { config })
    }

    /// The training configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fits `model` to `batch`, mutating its parameters in place.
    ///
    /// # Errors
    ///
    /// Fails on an empty batch, a shape mismatch between batch and model, or
    /// a non-finite loss or gradient. Parameters keep the values of the last
    /// successful step.
    pub fn fit<M, R>(&self, model: &mut M, batch: &Batch, rng: &mut R) -> VaeResult<TrainingReport>
    where
        M: Trainable + ?Sized,
        R: Rng + ?Sized,
    {
        if batch.is_empty() {
            return Err(VaeError::invalid_input("cannot train on an empty batch"));
        }

        let rows = batch.len();
        let mut params = model.parameters();
        let mut optimizer = Adam::new(
            AdamConfig {
                learning_rate: self.config.learning_rate,
                beta1: self.config.beta1,
                beta2: self.config.beta2,
                epsilon: self.config.epsilon,
            },
            params.len(),
        )?;

        let eval_noise = standard_normal(rows, model.latent_dim(), rng);
        let (initial_loss, _) = model.loss_and_gradients(batch, &eval_noise)?;

        info!(
            rows,
            parameters = params.len(),
            iterations = self.config.iterations,
            batch_size = ?self.config.batch_size,
            initial_loss = initial_loss.total,
            "starting training"
        );

        let mut loss_history = Vec::with_capacity(self.config.iterations);
        for iteration in 0..self.config.iterations {
            let minibatch = match self.config.batch_size {
                Some(size) if size < rows => {
                    Cow::Owned(batch.select(&index::sample(rng, rows, size).into_vec()))
                }
                _ => Cow::Borrowed(batch),
            };

            let noise = standard_normal(minibatch.len(), model.latent_dim(), rng);
            let (breakdown, gradient) = model
                .loss_and_gradients(&minibatch, &noise)
                .map_err(|err| {
                    warn!(iteration, error = %err, "training diverged");
                    err
                })?;

            optimizer.step(&mut params, &gradient).map_err(|err| {
                warn!(iteration, error = %err, "optimizer step rejected");
                VaeError::from(err)
            })?;
            model.set_parameters(&params)?;
            loss_history.push(breakdown.total);

            if self.config.log_every > 0 && (iteration + 1) % self.config.log_every == 0 {
                info!(
                    iteration = iteration + 1,
                    loss = breakdown.total,
                    reconstruction = breakdown.reconstruction,
                    kl = breakdown.kl,
                    "training progress"
                );
            } else {
                debug!(iteration, loss = breakdown.total, "training step");
            }
        }

        let (final_loss, _) = model.loss_and_gradients(batch, &eval_noise)?;
        info!(
            initial_loss = initial_loss.total,
            final_loss = final_loss.total,
            "training finished"
        );

        Ok(TrainingReport {
            loss_history,
            initial_loss,
            final_loss,
            iterations: self.config.iterations,
        })
    }
}
