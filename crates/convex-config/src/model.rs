//! Generative model configuration types.

use serde::{Deserialize, Serialize};

use crate::error::{Validate, ValidationError};

fn default_alpha() -> f64 {
    0.01
}

fn default_hidden_dim() -> usize {
    16
}

fn default_latent_dim() -> usize {
    1
}

fn default_negative_slope() -> f64 {
    0.3
}

fn validate_common(
    hidden_dim: usize,
    latent_dim: usize,
    alpha: f64,
    negative_slope: f64,
    errors: &mut Vec<ValidationError>,
) {
    if hidden_dim == 0 {
        errors.push(ValidationError::new("hidden_dim", "Hidden dimension must be positive"));
    }
    if latent_dim == 0 {
        errors.push(ValidationError::new("latent_dim", "Latent dimension must be positive"));
    }
    if !(0.0..=1.0).contains(&alpha) {
        errors.push(ValidationError::with_rule(
            "alpha",
            format!("Alpha must lie in [0, 1], got {alpha}"),
            "unit_interval",
        ));
    }
    if !(negative_slope.is_finite() && negative_slope >= 0.0) {
        errors.push(ValidationError::new(
            "negative_slope",
            "Leaky ReLU slope must be finite and non-negative",
        ));
    }
}

// =============================================================================
// PLAIN VAE
// =============================================================================

/// Configuration for the plain variational autoencoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaeConfig {
    /// Width of each observation (number of curve points).
    pub input_dim: usize,

    /// Width of the single hidden layer in encoder and decoder.
    #[serde(default = "default_hidden_dim")]
    pub hidden_dim: usize,

    /// Latent code dimensionality.
    #[serde(default = "default_latent_dim")]
    pub latent_dim: usize,

    /// Weight of the KL term; `1 - alpha` weights reconstruction.
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Slope of the leaky ReLU for negative inputs.
    #[serde(default = "default_negative_slope")]
    pub negative_slope: f64,
}

impl VaeConfig {
    /// Creates a configuration with default alpha and activation slope.
    pub fn new(input_dim: usize, hidden_dim: usize, latent_dim: usize) -> Self {
        Self {
            input_dim,
            hidden_dim,
            latent_dim,
            alpha: default_alpha(),
            negative_slope: default_negative_slope(),
        }
    }

    /// Sets the reconstruction/KL trade-off weight.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the leaky ReLU slope.
    #[must_use]
    pub fn with_negative_slope(mut self, slope: f64) -> Self {
        self.negative_slope = slope;
        self
    }
}

impl Default for VaeConfig {
    fn default() -> Self {
        Self::new(10, default_hidden_dim(), default_latent_dim())
    }
}

impl Validate for VaeConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.input_dim == 0 {
            errors.push(ValidationError::new("input_dim", "Input dimension must be positive"));
        }
        validate_common(
            self.hidden_dim,
            self.latent_dim,
            self.alpha,
            self.negative_slope,
            &mut errors,
        );
        errors
    }
}

// =============================================================================
// CONDITIONAL VAE
// =============================================================================

/// Configuration for the conditional variational autoencoder.
///
/// `input_dim` is the width of the encoder input, i.e. the observation and its
/// covariate concatenated. The covariate width is `input_dim - output_dim`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalVaeConfig {
    /// Width of observation plus covariate.
    pub input_dim: usize,

    /// Width of the reconstructed observation.
    pub output_dim: usize,

    /// Width of the single hidden layer in encoder and decoder.
    #[serde(default = "default_hidden_dim")]
    pub hidden_dim: usize,

    /// Latent code dimensionality.
    #[serde(default = "default_latent_dim")]
    pub latent_dim: usize,

    /// Weight of the KL term; `1 - alpha` weights reconstruction.
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Slope of the leaky ReLU for negative inputs.
    #[serde(default = "default_negative_slope")]
    pub negative_slope: f64,
}

impl ConditionalVaeConfig {
    /// Creates a configuration with default alpha and activation slope.
    pub fn new(input_dim: usize, output_dim: usize, hidden_dim: usize, latent_dim: usize) -> Self {
        Self {
            input_dim,
            output_dim,
            hidden_dim,
            latent_dim,
            alpha: default_alpha(),
            negative_slope: default_negative_slope(),
        }
    }

    /// Sets the reconstruction/KL trade-off weight.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the leaky ReLU slope.
    #[must_use]
    pub fn with_negative_slope(mut self, slope: f64) -> Self {
        self.negative_slope = slope;
        self
    }

    /// Width of the covariate vector.
    pub fn condition_dim(&self) -> usize {
        self.input_dim.saturating_sub(self.output_dim)
    }

    /// Width of the decoder input: latent code followed by the covariate.
    pub fn decoder_input_dim(&self) -> usize {
        self.latent_dim + self.condition_dim()
    }
}

impl Default for ConditionalVaeConfig {
    fn default() -> Self {
        Self::new(2, 1, default_hidden_dim(), default_latent_dim())
    }
}

impl Validate for ConditionalVaeConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.output_dim == 0 {
            errors.push(ValidationError::new("output_dim", "Output dimension must be positive"));
        }
        if self.input_dim <= self.output_dim {
            errors.push(ValidationError::with_rule(
                "input_dim",
                format!(
                    "Input dimension {} must exceed output dimension {} \
                     to leave room for the condition",
                    self.input_dim, self.output_dim
                ),
                "condition_width",
            ));
        }
        validate_common(
            self.hidden_dim,
            self.latent_dim,
            self.alpha,
            self.negative_slope,
            &mut errors,
        );
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vae_defaults() {
        let config = VaeConfig::default();
        assert!(config.is_valid());
        assert!((config.alpha - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vae_alpha_range() {
        assert!(VaeConfig::new(10, 8, 1).with_alpha(0.0).is_valid());
        assert!(VaeConfig::new(10, 8, 1).with_alpha(1.0).is_valid());
        let errors = VaeConfig::new(10, 8, 1).with_alpha(1.5).validate();
        assert_eq!(errors[0].rule.as_deref(), Some("unit_interval"));
    }

    #[test]
    fn test_vae_zero_dims() {
        let errors = VaeConfig::new(0, 0, 0).validate();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_conditional_dims() {
        let config = ConditionalVaeConfig::new(3, 1, 8, 2);
        assert_eq!(config.condition_dim(), 2);
        assert_eq!(config.decoder_input_dim(), 4);
        assert!(config.is_valid());
    }

    #[test]
    fn test_conditional_requires_condition() {
        let errors = ConditionalVaeConfig::new(1, 1, 8, 1).validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "input_dim");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: VaeConfig = serde_json::from_str(r#"{"input_dim": 10}"#).unwrap();
        assert_eq!(config, VaeConfig::default());
    }
}
