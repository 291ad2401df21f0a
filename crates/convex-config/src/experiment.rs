//! Experiment bundle: simulator, models and training settings in one file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, Validate, ValidationError};
use crate::model::{ConditionalVaeConfig, VaeConfig};
use crate::simulation::SimulatorConfig;
use crate::training::TrainingConfig;

/// A complete experiment description.
///
/// Loaded from TOML or JSON; every section falls back to its defaults.
///
/// ```toml
/// name = "hw-baseline"
///
/// [simulator]
/// mean_reversion = 0.15
/// volatility = 0.0075
///
/// [vae]
/// input_dim = 10
/// alpha = 5e-5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Experiment name.
    #[serde(default = "default_name")]
    pub name: String,

    /// Curve simulator settings.
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// Plain VAE settings.
    #[serde(default)]
    pub vae: VaeConfig,

    /// Conditional VAE settings.
    #[serde(default)]
    pub conditional_vae: ConditionalVaeConfig,

    /// Training loop settings.
    #[serde(default)]
    pub training: TrainingConfig,
}

fn default_name() -> String {
    "default".to_string()
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            simulator: SimulatorConfig::default(),
            vae: VaeConfig::default(),
            conditional_vae: ConditionalVaeConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

impl ExperimentConfig {
    /// The worked example: ten-point curves, one latent factor, `alpha = 5e-5`.
    pub fn worked_example() -> Self {
        let simulator = SimulatorConfig::default();
        let vae = VaeConfig::new(simulator.offsets.len(), 16, 1).with_alpha(5e-5);
        Self {
            name: "worked-example".to_string(),
            simulator,
            vae,
            ..Self::default()
        }
    }

    /// Parses a TOML document.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Parses a JSON document.
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads and validates a configuration file, choosing the format by extension.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let config = match extension.as_str() {
            "toml" => Self::from_toml_str(&text)?,
            "json" => Self::from_json_str(&text)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        config.validate_or_error()?;
        Ok(config)
    }

    /// Serializes to TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Serializes to pretty JSON.
    pub fn to_json_string(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Validate for ExperimentConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.name.is_empty() {
            errors.push(ValidationError::new("name", "Name cannot be empty"));
        }

        errors.extend(self.simulator.validate().into_iter().map(|e| e.nested("simulator")));
        errors.extend(self.vae.validate().into_iter().map(|e| e.nested("vae")));
        errors.extend(
            self.conditional_vae
                .validate()
                .into_iter()
                .map(|e| e.nested("conditional_vae")),
        );
        errors.extend(self.training.validate().into_iter().map(|e| e.nested("training")));

        if self.vae.input_dim != self.simulator.offsets.len() {
            errors.push(ValidationError::with_rule(
                "vae.input_dim",
                format!(
                    "Input dimension {} does not match the {} simulated offsets",
                    self.vae.input_dim,
                    self.simulator.offsets.len()
                ),
                "curve_width",
            ));
        }

        errors
    }
}
