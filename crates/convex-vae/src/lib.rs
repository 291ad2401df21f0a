//! # Convex VAE
//!
//! Variational autoencoders for synthetic yield curves.
//!
//! This crate provides:
//!
//! - **Plain VAE** ([`Vae`]): encodes whole curves into a low-dimensional latent
//!   code and generates new curves from standard normal noise
//! - **Conditional VAE** ([`ConditionalVae`]): models one curve point at a time
//!   given its time to maturity, with Cartesian-product generation over a grid
//!   of conditions
//! - **ELBO loss** ([`ElboLoss`]): reconstruction error plus the closed-form KL
//!   divergence, with analytic gradients
//! - **Training** ([`Trainer`]): Adam on the flat parameter vector of any
//!   [`Trainable`] model
//!
//! ## Quick Start
//!
//! ```rust
//! use convex_config::{TrainingConfig, VaeConfig};
//! use convex_curves::HullWhiteSimulator;
//! use convex_vae::prelude::*;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let offsets = [0.5, 1.0, 2.0, 5.0];
//! let curves = HullWhiteSimulator::new(0.15, 0.0075)
//!     .unwrap()
//!     .simulate(10.0, &offsets, 128, &mut rng)
//!     .unwrap();
//!
//! let mut vae = Vae::new(VaeConfig::new(4, 8, 1).with_alpha(5e-5), &mut rng).unwrap();
//! let trainer = Trainer::new(TrainingConfig::default().with_iterations(20)).unwrap();
//! let report = trainer
//!     .fit(&mut vae, &Batch::new(curves.rates().clone()), &mut rng)
//!     .unwrap();
//! assert_eq!(report.loss_history.len(), 20);
//!
//! let generated = vae.generate(10, &mut rng).unwrap();
//! assert_eq!(generated.shape(), (10, 4));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]

mod autoencoder;
pub mod cvae;
pub mod dataset;
pub mod error;
pub mod layers;
pub mod loss;
pub mod network;
pub mod reparam;
pub mod training;
pub mod vae;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cvae::{ConditionalSamples, ConditionalVae};
    pub use crate::dataset::ConditionalDataset;
    pub use crate::error::{VaeError, VaeResult};
    pub use crate::loss::{ElboLoss, LossBreakdown, PredictionBundle};
    pub use crate::training::{Batch, Trainable, Trainer, TrainingReport};
    pub use crate::vae::Vae;
}

pub use cvae::{ConditionalSamples, ConditionalVae};
pub use dataset::ConditionalDataset;
pub use error::{VaeError, VaeResult};
pub use loss::{ElboLoss, LossBreakdown, PredictionBundle};
pub use training::{Batch, Trainable, Trainer, TrainingReport};
pub use vae::Vae;
