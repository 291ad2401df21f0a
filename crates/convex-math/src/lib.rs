//! # Convex Math
//!
//! Numerical building blocks for the Convex VAE workspace.
//!
//! This crate provides:
//!
//! - **Linear Algebra**: Batched matrix helpers with explicit row-major contracts
//!   (concatenation, tiling, flattening, reshaping)
//! - **Activation**: Leaky rectified linear unit and its derivative
//! - **Optimization**: Gradient-based optimizers (Adam, SGD) and numerical gradients
//!
//! ## Design Philosophy
//!
//! - **Explicit Layout**: Every batch is a matrix with one row per sample
//! - **Fail Fast**: Shape mismatches and non-finite values are errors, never clamped

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]

pub mod activation;
pub mod error;
pub mod linear_algebra;
pub mod optimization;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::activation::LeakyRelu;
    pub use crate::error::{MathError, MathResult};
    pub use crate::linear_algebra::{
        column_sums, ensure_finite, flatten_row_major, hconcat, repeat_rows, reshape_row_major,
        split_columns, tile_rows,
    };
    pub use crate::optimization::{
        numerical_gradient, Adam, AdamConfig, GradientOptimizer, Sgd,
    };
}

pub use error::{MathError, MathResult};
