//! # Convex Curves
//!
//! Deterministic zero curves and stochastic yield curve simulation for the
//! Convex VAE workspace.
//!
//! This crate provides:
//!
//! - **Deterministic Curves**: [`DeterministicCurve`] trait with flat and pillar
//!   implementations (closures work too)
//! - **Simulation**: [`HullWhiteSimulator`], a closed-form one-factor model that
//!   generates batches of zero curves with known moments
//!
//! ## Quick Start
//!
//! ```rust
//! use convex_curves::prelude::*;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let model = HullWhiteSimulator::new(0.15, 0.0075).unwrap();
//! let offsets = [1.0 / 365.0, 0.5, 1.0, 2.0, 3.0, 5.0, 7.0, 10.0, 15.0, 20.0];
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let curves = model.simulate(10.0, &offsets, 1024, &mut rng).unwrap();
//!
//! assert_eq!(curves.rates().shape(), (1024, 10));
//! assert_eq!(curves.maturity_grid().shape(), (1024, 10));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

pub mod curves;
pub mod error;
pub mod simulation;
pub mod traits;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::curves::{FlatCurve, PillarCurve};
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::simulation::{HullWhiteSimulator, SimulatedCurves};
    pub use crate::traits::DeterministicCurve;
}

pub use curves::{FlatCurve, PillarCurve};
pub use error::{CurveError, CurveResult};
pub use simulation::{HullWhiteSimulator, SimulatedCurves};
pub use traits::DeterministicCurve;
