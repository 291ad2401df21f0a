//! Training harness configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Validate, ValidationError};

/// Configuration for the gradient-based training loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of optimizer steps.
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Adam step size.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Adam first moment decay.
    #[serde(default = "default_beta1")]
    pub beta1: f64,

    /// Adam second moment decay.
    #[serde(default = "default_beta2")]
    pub beta2: f64,

    /// Adam denominator stabilizer.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Rows drawn per step; `None` trains on the full batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    /// Emit a progress log line every this many steps (0 disables).
    #[serde(default = "default_log_every")]
    pub log_every: usize,

    /// Seed for reparameterization noise and minibatch selection.
    #[serde(default = "default_training_seed")]
    pub seed: u64,
}

fn default_iterations() -> usize {
    500
}

fn default_learning_rate() -> f64 {
    1e-3
}

fn default_beta1() -> f64 {
    0.9
}

fn default_beta2() -> f64 {
    0.999
}

fn default_epsilon() -> f64 {
    1e-7
}

fn default_log_every() -> usize {
    100
}

fn default_training_seed() -> u64 {
    7
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            learning_rate: default_learning_rate(),
            beta1: default_beta1(),
            beta2: default_beta2(),
            epsilon: default_epsilon(),
            batch_size: None,
            log_every: default_log_every(),
            seed: default_training_seed(),
        }
    }
}

impl TrainingConfig {
    /// Sets the iteration count.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the learning rate.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the minibatch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Validate for TrainingConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.iterations == 0 {
            errors.push(ValidationError::new("iterations", "Iterations must be positive"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            errors.push(ValidationError::new("learning_rate", "Learning rate must be positive"));
        }
        for (field, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                errors.push(ValidationError::with_rule(
                    field,
                    format!("Decay rate must lie in [0, 1), got {beta}"),
                    "decay_range",
                ));
            }
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            errors.push(ValidationError::new("epsilon", "Epsilon must be positive"));
        }
        if self.batch_size == Some(0) {
            errors.push(ValidationError::new("batch_size", "Batch size must be positive"));
        }

        errors
    }
}
