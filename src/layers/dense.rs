use rand::Rng;

use crate::error::{NetworkError, Result};
use crate::math::matrix::{gaussian_vec, Matrix};

/// Standard deviation of the Gaussian used to initialize weights and biases.
pub const INIT_STD_DEV: f64 = 0.1;

/// One fully connected transition between two layers of neurons.
///
/// `weights` has shape `(size, input_size)`; `biases` has length `size`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub weights: Matrix,
    pub biases: Vec<f64>,
}

impl Layer {
    pub fn new<R: Rng + ?Sized>(input_size: usize, size: usize, rng: &mut R) -> Layer {
        Layer {
            weights: Matrix::gaussian(size, input_size, INIT_STD_DEV, rng),
            biases: gaussian_vec(size, INIT_STD_DEV, rng),
        }
    }

    /// Builds a layer from explicit parameters, checking that shapes agree.
    pub fn from_parts(weights: Matrix, biases: Vec<f64>) -> Result<Layer> {
        if weights.rows != biases.len() {
            return Err(NetworkError::shape("layer biases", weights.rows, biases.len()));
        }
        if let Some(bad) = weights.data.iter().find(|row| row.len() != weights.cols) {
            return Err(NetworkError::shape("layer weight row", weights.cols, bad.len()));
        }
        Ok(Layer { weights, biases })
    }

    /// Number of neurons this transition feeds into.
    pub fn size(&self) -> usize {
        self.weights.rows
    }

    /// Width of the input this transition consumes.
    pub fn input_size(&self) -> usize {
        self.weights.cols
    }

    /// Weighted sums `z = b + W·a` for every output neuron.
    pub fn weighted_sums(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .mul_vec(input)
            .into_iter()
            .zip(&self.biases)
            .map(|(s, b)| s + b)
            .collect()
    }

    /// Applies pre-computed gradients scaled by lr.
    pub fn apply_gradients(&mut self, grad: &LayerGradient, lr: f64) {
        for (row, grad_row) in self.weights.data.iter_mut().zip(&grad.weights.data) {
            for (w, g) in row.iter_mut().zip(grad_row) {
                *w -= lr * g;
            }
        }
        for (b, g) in self.biases.iter_mut().zip(&grad.biases) {
            *b -= lr * g;
        }
    }

    /// Total number of trainable values in this transition.
    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }
}

/// Gradient of the loss with respect to one layer's parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGradient {
    pub weights: Matrix,
    pub biases: Vec<f64>,
}

impl LayerGradient {
    pub fn zeros_like(layer: &Layer) -> LayerGradient {
        LayerGradient {
            weights: Matrix::zeros(layer.size(), layer.input_size()),
            biases: vec![0.0; layer.size()],
        }
    }

    /// Gradient of a single sample: `dW[j][i] = δ[j]·a[i]`, `db[j] = δ[j]`.
    pub fn from_delta(delta: &[f64], input: &[f64]) -> LayerGradient {
        let data = delta
            .iter()
            .map(|d| input.iter().map(|a| d * a).collect())
            .collect();
        LayerGradient {
            weights: Matrix {
                rows: delta.len(),
                cols: input.len(),
                data,
            },
            biases: delta.to_vec(),
        }
    }

    /// Fails unless this gradient has exactly the shape of `layer`.
    pub fn check_fits(&self, layer: &Layer) -> Result<()> {
        if self.weights.rows != layer.size() || self.weights.data.len() != layer.size() {
            return Err(NetworkError::shape("gradient rows", layer.size(), self.weights.data.len()));
        }
        if let Some(bad) = self.weights.data.iter().find(|row| row.len() != layer.input_size()) {
            return Err(NetworkError::shape("gradient row width", layer.input_size(), bad.len()));
        }
        if self.biases.len() != layer.size() {
            return Err(NetworkError::shape("gradient biases", layer.size(), self.biases.len()));
        }
        Ok(())
    }

    /// Adds `other` into `self` element-wise.
    pub fn accumulate(&mut self, other: &LayerGradient) {
        for (row, other_row) in self.weights.data.iter_mut().zip(&other.weights.data) {
            for (acc, g) in row.iter_mut().zip(other_row) {
                *acc += g;
            }
        }
        for (acc, g) in self.biases.iter_mut().zip(&other.biases) {
            *acc += g;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn fixed_layer() -> Layer {
        Layer::from_parts(
            Matrix::from_data(vec![vec![0.5, -1.0], vec![2.0, 0.0], vec![1.0, 1.0]]),
            vec![0.25, 0.5, 0.75],
        )
        .unwrap()
    }

    #[test]
    fn test_new_layer_shapes() {
        let layer = Layer::new(4, 3, &mut StdRng::seed_from_u64(1));
        assert_eq!(layer.size(), 3);
        assert_eq!(layer.input_size(), 4);
        assert_eq!(layer.biases.len(), 3);
        assert!(layer.weights.data.iter().all(|row| row.len() == 4));
        assert_eq!(layer.parameter_count(), 15);
    }

    #[test]
    fn test_from_parts_rejects_bias_mismatch() {
        let err = Layer::from_parts(Matrix::zeros(3, 2), vec![0.0; 2]).unwrap_err();
        assert!(matches!(err, NetworkError::ShapeMismatch { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn test_weighted_sums() {
        let z = fixed_layer().weighted_sums(&[2.0, 1.0]);
        assert_eq!(z, vec![0.25, 4.5, 3.75]);
    }

    #[test]
    fn test_apply_gradient_from_delta() {
        let mut layer = fixed_layer();
        let grad = LayerGradient::from_delta(&[1.0, 0.0, -1.0], &[2.0, 1.0]);
        layer.apply_gradients(&grad, 0.5);

        assert_eq!(layer.weights.data[0], vec![-0.5, -1.5]);
        assert_eq!(layer.weights.data[1], vec![2.0, 0.0]);
        assert_eq!(layer.weights.data[2], vec![2.0, 1.5]);
        assert_eq!(layer.biases, vec![-0.25, 0.5, 1.25]);
    }

    #[test]
    fn test_check_fits_rejects_other_shapes() {
        let layer = fixed_layer();
        assert!(LayerGradient::zeros_like(&layer).check_fits(&layer).is_ok());

        let narrow = LayerGradient::from_delta(&[1.0, 1.0, 1.0], &[1.0]);
        assert!(matches!(
            narrow.check_fits(&layer),
            Err(NetworkError::ShapeMismatch { expected: 2, actual: 1, .. })
        ));
        let short = LayerGradient::from_delta(&[1.0, 1.0], &[1.0, 1.0]);
        assert!(matches!(
            short.check_fits(&layer),
            Err(NetworkError::ShapeMismatch { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn test_accumulate_sums_gradients() {
        let layer = fixed_layer();
        let mut acc = LayerGradient::zeros_like(&layer);
        acc.accumulate(&LayerGradient::from_delta(&[1.0, 1.0, 1.0], &[1.0, 2.0]));
        acc.accumulate(&LayerGradient::from_delta(&[1.0, 0.0, 2.0], &[1.0, 1.0]));
        assert_eq!(acc.weights.data[2], vec![3.0, 4.0]);
        assert_eq!(acc.biases, vec![2.0, 1.0, 3.0]);
    }
}
