//! Convex Configuration Layer
//!
//! Configuration types for the Convex VAE workspace: the curve simulator, the
//! plain and conditional variational autoencoders, and the training harness.
//!
//! # Features
//!
//! - **Simulator Configuration**: Mean reversion, volatility, deterministic curve, curve grid
//! - **Model Configuration**: Layer widths, latent dimension, reconstruction/KL weight
//! - **Training Configuration**: Adam settings, minibatching, logging cadence, seeds
//! - **Experiment Files**: TOML or JSON bundles with per-section defaults
//!
//! # Example
//!
//! ```rust
//! use convex_config::{ExperimentConfig, Validate, VaeConfig};
//!
//! let config = ExperimentConfig::worked_example();
//! assert!(config.is_valid());
//!
//! let vae = VaeConfig::new(10, 16, 1).with_alpha(2.0);
//! assert!(!vae.is_valid());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod experiment;
mod model;
mod simulation;
mod training;

// Re-export core types
pub use error::{ConfigError, ConfigResult, Validate, ValidationError};
pub use experiment::ExperimentConfig;
pub use model::{ConditionalVaeConfig, VaeConfig};
pub use simulation::{default_offsets, SimulatorConfig, ZeroCurveConfig};
pub use training::TrainingConfig;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ConfigError, ConfigResult, Validate};
    pub use crate::experiment::ExperimentConfig;
    pub use crate::model::{ConditionalVaeConfig, VaeConfig};
    pub use crate::simulation::{SimulatorConfig, ZeroCurveConfig};
    pub use crate::training::TrainingConfig;
}
