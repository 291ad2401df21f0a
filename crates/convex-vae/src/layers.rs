//! Fully connected layers.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use convex_math::linear_algebra::column_sums;

use crate::error::{VaeError, VaeResult};

/// Parameter gradients of a [`Dense`] layer, shaped like the parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseGradients {
    /// Gradient with respect to the `in x out` weight matrix.
    pub weights: DMatrix<f64>,
    /// Gradient with respect to the bias.
    pub bias: DVector<f64>,
}

impl DenseGradients {
    /// Appends the gradients in parameter order (weights column-major, then bias).
    pub fn write_flat(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(self.weights.as_slice());
        out.extend_from_slice(self.bias.as_slice());
    }
}

/// Affine layer `Y = X W + 1 b^T` over a batch with one row per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Dense {
    weights: DMatrix<f64>,
    bias: DVector<f64>,
}

impl Dense {
    /// Creates a layer with Glorot-uniform weights and zero bias.
    pub fn new<R: Rng + ?Sized>(
        input_dim: usize,
        output_dim: usize,
        rng: &mut R,
    ) -> VaeResult<Self> {
        if input_dim == 0 || output_dim == 0 {
            return Err(VaeError::configuration(format!(
                "dense layer dimensions must be positive, got {input_dim} -> {output_dim}"
            )));
        }

        let limit = (6.0 / (input_dim + output_dim) as f64).sqrt();
        let init = Uniform::new(-limit, limit);
        let weights = DMatrix::from_fn(input_dim, output_dim, |_, _| init.sample(&mut *rng));

        Ok(Self {
            weights,
            bias: DVector::zeros(output_dim),
        })
    }

    /// Creates a layer from explicit parameters.
    pub fn from_parts(weights: DMatrix<f64>, bias: DVector<f64>) -> VaeResult<Self> {
        if bias.len() != weights.ncols() {
            return Err(VaeError::dimension_mismatch(
                "dense bias length",
                weights.ncols(),
                bias.len(),
            ));
        }
        Ok(Self { weights, bias })
    }

    /// Width of the layer input.
    pub fn input_dim(&self) -> usize {
        self.weights.nrows()
    }

    /// Width of the layer output.
    pub fn output_dim(&self) -> usize {
        self.weights.ncols()
    }

    /// The `in x out` weight matrix.
    pub fn weights(&self) -> &DMatrix<f64> {
        &self.weights
    }

    /// The bias vector.
    pub fn bias(&self) -> &DVector<f64> {
        &self.bias
    }

    /// Number of scalar parameters.
    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }

    /// Applies the layer to a batch.
    pub fn forward(&self, input: &DMatrix<f64>) -> VaeResult<DMatrix<f64>> {
        if input.ncols() != self.input_dim() {
            return Err(VaeError::dimension_mismatch(
                "dense input columns",
                self.input_dim(),
                input.ncols(),
            ));
        }

        let mut output = input * &self.weights;
        for (mut column, b) in output.column_iter_mut().zip(self.bias.iter()) {
            column.add_scalar_mut(*b);
        }
        Ok(output)
    }

    /// Back-propagates `grad_output` given the batch the layer was applied to.
    ///
    /// Returns the parameter gradients and the gradient with respect to `input`.
    pub fn backward(
        &self,
        input: &DMatrix<f64>,
        grad_output: &DMatrix<f64>,
    ) -> (DenseGradients, DMatrix<f64>) {
        let gradients = DenseGradients {
            weights: input.transpose() * grad_output,
            bias: column_sums(grad_output),
        };
        let grad_input = grad_output * self.weights.transpose();
        (gradients, grad_input)
    }

    /// Appends the parameters (weights column-major, then bias).
    pub fn write_parameters(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(self.weights.as_slice());
        out.extend_from_slice(self.bias.as_slice());
    }

    /// Overwrites the parameters from the front of `params`.
    ///
    /// Returns the number of values consumed.
    pub fn read_parameters(&mut self, params: &[f64]) -> VaeResult<usize> {
        let count = self.parameter_count();
        if params.len() < count {
            return Err(VaeError::dimension_mismatch(
                "dense parameter count",
                count,
                params.len(),
            ));
        }

        let (weights, bias) = params[..count].split_at(self.weights.len());
        self.weights.copy_from_slice(weights);
        self.bias.copy_from_slice(bias);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layer() -> Dense {
        Dense::from_parts(
            DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            DVector::from_vec(vec![0.5, -0.5, 1.0]),
        )
        .unwrap()
    }

    #[test]
    fn test_forward_adds_bias_per_column() {
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let y = layer().forward(&x).unwrap();

        assert_eq!(y.shape(), (2, 3));
        assert_relative_eq!(y[(0, 0)], 1.5);
        assert_relative_eq!(y[(0, 2)], 4.0);
        assert_relative_eq!(y[(1, 1)], 4.5);
    }

    #[test]
    fn test_forward_rejects_wrong_width() {
        let x = DMatrix::zeros(4, 3);
        assert!(matches!(
            layer().forward(&x),
            Err(VaeError::DimensionMismatch { expected: 2, actual: 3, .. })
        ));
    }

    #[test]
    fn test_backward_shapes_and_values() {
        let dense = layer();
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let g = DMatrix::from_element(2, 3, 1.0);
        let (grads, grad_input) = dense.backward(&x, &g);

        assert_eq!(grads.weights.shape(), (2, 3));
        assert_relative_eq!(grads.weights[(0, 0)], 4.0);
        assert_relative_eq!(grads.weights[(1, 2)], 6.0);
        assert_relative_eq!(grads.bias[1], 2.0);
        // Row sums of W.
        assert_relative_eq!(grad_input[(0, 0)], 6.0);
        assert_relative_eq!(grad_input[(0, 1)], 15.0);
    }

    #[test]
    fn test_glorot_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let dense = Dense::new(10, 16, &mut rng).unwrap();
        let limit = (6.0_f64 / 26.0).sqrt();

        assert!(dense.weights().iter().all(|w| w.abs() <= limit));
        assert!(dense.bias().iter().all(|b| *b == 0.0));
        assert_eq!(dense.parameter_count(), 10 * 16 + 16);
        assert!(Dense::new(0, 3, &mut rng).is_err());
    }

    #[test]
    fn test_parameter_round_trip() {
        let dense = layer();
        let mut flat = Vec::new();
        dense.write_parameters(&mut flat);
        assert_eq!(flat.len(), 9);
        // Column-major weights.
        assert_eq!(&flat[..3], &[1.0, 4.0, 2.0]);

        let mut other = Dense::new(2, 3, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(other.read_parameters(&flat).unwrap(), 9);
        assert_eq!(other, dense);
        assert!(other.read_parameters(&flat[..5]).is_err());
    }
}
