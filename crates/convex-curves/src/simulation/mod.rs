//! Stochastic yield curve simulation.
//!
//! This module provides:
//!
//! - **Hull-White**: One-factor mean-reverting model in state-variable form,
//!   producing batches of zero curves in closed form
//! - **Simulated batches**: Rates, generating states and the paired
//!   time-to-maturity covariates
//!
//! # Overview
//!
//! The short rate follows
//!
//! ```text
//! dr = (theta(t) - a*r)dt + sigma*dW
//! ```
//!
//! Where:
//! - `a` = mean reversion speed
//! - `sigma` = volatility
//! - `theta(t)` = drift fitted to an (optional) deterministic zero curve
//!
//! Conditional on the Gaussian state `x(t)`, every zero rate is affine in `x`,
//! so a whole curve is drawn from a single normal variate.

mod hull_white;
mod samples;

pub use hull_white::HullWhiteSimulator;
pub use samples::SimulatedCurves;
