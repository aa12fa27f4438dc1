use log::warn;
use rand::Rng;

use crate::activation::activation::{softmax, Activation};
use crate::error::{NetworkError, Result};
use crate::layers::dense::{Layer, LayerGradient};
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::optim::sgd::Sgd;

/// A fully connected feed-forward classifier.
///
/// Hidden layers use the configured activation (see
/// [`Activation::hidden_strategy`]); the output layer is always a softmax,
/// trained against cross-entropy.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    pub(crate) layer_sizes: Vec<usize>,
    pub(crate) layers: Vec<Layer>,
    pub(crate) activation: Activation,
    pub(crate) optimizer: Sgd,
}

/// Per-layer gradients of one sample (or the sum over several samples).
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub layers: Vec<LayerGradient>,
}

impl Gradients {
    pub fn zeros_like(network: &Network) -> Gradients {
        Gradients {
            layers: network.layers.iter().map(LayerGradient::zeros_like).collect(),
        }
    }

    pub fn accumulate(&mut self, other: &Gradients) {
        for (acc, g) in self.layers.iter_mut().zip(&other.layers) {
            acc.accumulate(g);
        }
    }
}

/// Values cached by a forward pass for the backward pass.
///
/// `activations[0]` is the input; `activations[l + 1]` and `weighted_sums[l]`
/// belong to transition `l`.
struct Trace {
    weighted_sums: Vec<Vec<f64>>,
    activations: Vec<Vec<f64>>,
}

pub(crate) fn validate_sizes(layer_sizes: &[usize]) -> Result<()> {
    if layer_sizes.len() < 2 {
        return Err(NetworkError::InvalidTopology(format!(
            "need at least an input and an output layer, got {} layer(s)",
            layer_sizes.len()
        )));
    }
    if let Some(pos) = layer_sizes.iter().position(|&s| s == 0) {
        return Err(NetworkError::InvalidTopology(format!(
            "layer {pos} has zero neurons"
        )));
    }
    Ok(())
}

pub(crate) fn warn_on_hidden_fallback(activation: Activation) {
    let hidden = activation.hidden_strategy();
    if hidden != activation {
        warn!("{activation} cannot be applied element-wise, hidden layers use {hidden}");
    }
}

impl Network {
    /// Builds a network with weights and biases drawn from N(0, 0.1).
    pub fn new(layer_sizes: &[usize], learning_rate: f64, activation: Activation) -> Result<Network> {
        Network::with_rng(layer_sizes, learning_rate, activation, &mut rand::thread_rng())
    }

    /// Same as [`Network::new`] with a caller-supplied random source.
    pub fn with_rng<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        learning_rate: f64,
        activation: Activation,
        rng: &mut R,
    ) -> Result<Network> {
        validate_sizes(layer_sizes)?;
        warn_on_hidden_fallback(activation);
        let layers = layer_sizes
            .windows(2)
            .map(|pair| Layer::new(pair[0], pair[1], rng))
            .collect();
        Ok(Network {
            layer_sizes: layer_sizes.to_vec(),
            layers,
            activation,
            optimizer: Sgd::new(learning_rate),
        })
    }

    /// Builds a network from explicit layers; consecutive widths must chain.
    pub fn from_layers(layers: Vec<Layer>, learning_rate: f64, activation: Activation) -> Result<Network> {
        let first = layers
            .first()
            .ok_or_else(|| NetworkError::InvalidTopology("no layers given".into()))?;
        let mut layer_sizes = vec![first.input_size()];
        for layer in &layers {
            let expected = *layer_sizes.last().unwrap_or(&0);
            if layer.input_size() != expected {
                return Err(NetworkError::shape("layer input width", expected, layer.input_size()));
            }
            layer_sizes.push(layer.size());
        }
        validate_sizes(&layer_sizes)?;
        warn_on_hidden_fallback(activation);
        Ok(Network {
            layer_sizes,
            layers,
            activation,
            optimizer: Sgd::new(learning_rate),
        })
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate
    }

    pub fn input_size(&self) -> usize {
        self.layer_sizes[0]
    }

    pub fn output_size(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Forward pass. The result is a probability distribution over the outputs.
    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_input(input)?;
        let hidden = self.activation.hidden_strategy();
        let last = self.layers.len() - 1;

        let mut current = input.to_vec();
        for (idx, layer) in self.layers.iter().enumerate() {
            let z = layer.weighted_sums(&current);
            current = if idx == last {
                softmax(&z)
            } else {
                z.into_iter().map(|x| hidden.activate(x)).collect()
            };
        }
        Ok(current)
    }

    /// Index of the most probable output class.
    pub fn predict_class(&self, input: &[f64]) -> Result<usize> {
        let output = self.forward(input)?;
        Ok(argmax(&output))
    }

    /// Cross-entropy of the current prediction for `input` against `target`.
    pub fn loss(&self, input: &[f64], target: &[f64]) -> Result<f64> {
        self.check_target(target)?;
        let output = self.forward(input)?;
        Ok(CrossEntropyLoss::loss(&output, target))
    }

    /// One backpropagation step on a single sample.
    ///
    /// Shapes are checked before anything is written, so an error leaves the
    /// parameters untouched.
    pub fn train(&mut self, input: &[f64], target: &[f64]) -> Result<()> {
        let grads = self.gradients(input, target)?;
        self.apply(&grads)
    }

    /// Computes the gradients of one sample without touching the parameters.
    pub fn gradients(&self, input: &[f64], target: &[f64]) -> Result<Gradients> {
        self.check_input(input)?;
        self.check_target(target)?;

        let trace = self.trace(input);
        let hidden = self.activation.hidden_strategy();
        let n = self.layers.len();

        let output = &trace.activations[n];
        let mut delta = CrossEntropyLoss::derivative(output, target);
        let mut layers = Vec::with_capacity(n);

        for idx in (0..n).rev() {
            layers.push(LayerGradient::from_delta(&delta, &trace.activations[idx]));
            if idx > 0 {
                let back = self.layers[idx].weights.transpose_mul_vec(&delta);
                delta = back
                    .into_iter()
                    .zip(&trace.weighted_sums[idx - 1])
                    .zip(&trace.activations[idx])
                    .map(|((err, &z), &a)| err * hidden.slope(z, a))
                    .collect();
            }
        }
        layers.reverse();

        Ok(Gradients { layers })
    }

    /// Applies gradients with the network's fixed learning rate.
    ///
    /// Every layer's gradient is checked against its layer first; on a
    /// mismatch nothing is written.
    pub fn apply(&mut self, grads: &Gradients) -> Result<()> {
        if grads.layers.len() != self.layers.len() {
            return Err(NetworkError::shape("gradient layers", self.layers.len(), grads.layers.len()));
        }
        for (layer, grad) in self.layers.iter().zip(&grads.layers) {
            grad.check_fits(layer)?;
        }
        for (layer, grad) in self.layers.iter_mut().zip(&grads.layers) {
            self.optimizer.step(layer, grad);
        }
        Ok(())
    }

    fn trace(&self, input: &[f64]) -> Trace {
        let hidden = self.activation.hidden_strategy();
        let last = self.layers.len() - 1;

        let mut weighted_sums = Vec::with_capacity(self.layers.len());
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(input.to_vec());

        for (idx, layer) in self.layers.iter().enumerate() {
            let z = layer.weighted_sums(&activations[idx]);
            let a = if idx == last {
                softmax(&z)
            } else {
                z.iter().map(|&x| hidden.activate(x)).collect()
            };
            weighted_sums.push(z);
            activations.push(a);
        }

        Trace {
            weighted_sums,
            activations,
        }
    }

    fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.input_size() {
            return Err(NetworkError::shape("network input", self.input_size(), input.len()));
        }
        Ok(())
    }

    fn check_target(&self, target: &[f64]) -> Result<()> {
        if target.len() != self.output_size() {
            return Err(NetworkError::shape("network target", self.output_size(), target.len()));
        }
        Ok(())
    }
}

/// Index of the maximum element in a slice.
pub fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;
    use rand::{rngs::StdRng, SeedableRng};

    fn seeded(sizes: &[usize], lr: f64, activation: Activation) -> Network {
        Network::with_rng(sizes, lr, activation, &mut StdRng::seed_from_u64(42)).unwrap()
    }

    #[test]
    fn test_rejects_bad_topologies() {
        assert!(matches!(
            Network::new(&[3], 0.1, Activation::Sigmoid),
            Err(NetworkError::InvalidTopology(_))
        ));
        assert!(matches!(
            Network::new(&[3, 0, 2], 0.1, Activation::Sigmoid),
            Err(NetworkError::InvalidTopology(_))
        ));
    }

    #[test]
    fn test_parameter_shapes_follow_layer_sizes() {
        let net = seeded(&[4, 5, 3], 0.1, Activation::Sigmoid);
        assert_eq!(net.layers().len(), 2);
        assert_eq!((net.layers()[0].weights.rows, net.layers()[0].weights.cols), (5, 4));
        assert_eq!((net.layers()[1].weights.rows, net.layers()[1].weights.cols), (3, 5));
        assert_eq!(net.layers()[1].biases.len(), 3);
        assert_eq!(net.parameter_count(), 5 * 4 + 5 + 3 * 5 + 3);
    }

    #[test]
    fn test_forward_sums_to_one_for_every_activation() {
        for act in Activation::ALL {
            let net = seeded(&[3, 6, 4, 5], 0.1, act);
            for input in [[0.0, 0.0, 0.0], [1.0, -2.0, 0.5], [10.0, 10.0, -10.0]] {
                let out = net.forward(&input).unwrap();
                assert_eq!(out.len(), 5);
                assert!((out.iter().sum::<f64>() - 1.0).abs() < 1e-6, "{act}");
                assert!(out.iter().all(|p| (0.0..=1.0).contains(p)));
            }
        }
    }

    #[test]
    fn test_forward_matches_hand_computation() {
        let hidden = Layer::from_parts(Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0]]), vec![0.0, 0.0]).unwrap();
        let output = Layer::from_parts(Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0]]), vec![0.0, 0.0]).unwrap();
        let net = Network::from_layers(vec![hidden, output], 0.1, Activation::ReLU).unwrap();

        let out = net.forward(&[2.0, -1.0]).unwrap();
        // relu -> [2, 0], softmax([2, 0])
        let e2 = 2.0f64.exp();
        assert!((out[0] - e2 / (e2 + 1.0)).abs() < 1e-12);
        assert!((out[1] - 1.0 / (e2 + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_shape_errors_do_not_mutate() {
        let mut net = seeded(&[2, 3, 2], 0.1, Activation::Sigmoid);
        let before = net.clone();

        assert!(matches!(
            net.forward(&[1.0]),
            Err(NetworkError::ShapeMismatch { expected: 2, actual: 1, .. })
        ));
        assert!(net.train(&[1.0, 2.0, 3.0], &[1.0, 0.0]).is_err());
        assert!(net.train(&[1.0, 2.0], &[1.0]).is_err());
        assert_eq!(net, before);
    }

    #[test]
    fn test_apply_rejects_gradients_of_another_shape() {
        let small = seeded(&[2, 3, 2], 0.1, Activation::Sigmoid);
        let grads = small.gradients(&[1.0, 0.5], &[1.0, 0.0]).unwrap();

        let mut big = seeded(&[4, 5, 3], 0.1, Activation::Sigmoid);
        let before = big.clone();
        assert!(matches!(
            big.apply(&grads),
            Err(NetworkError::ShapeMismatch { expected: 5, actual: 3, .. })
        ));
        assert_eq!(big, before);

        let mut deeper = seeded(&[2, 3, 3, 2], 0.1, Activation::Sigmoid);
        let before = deeper.clone();
        assert!(matches!(
            deeper.apply(&grads),
            Err(NetworkError::ShapeMismatch { expected: 3, actual: 2, .. })
        ));
        assert_eq!(deeper, before);
    }

    #[test]
    fn test_apply_accepts_own_gradients() {
        let mut net = seeded(&[2, 3, 2], 0.1, Activation::Sigmoid);
        let grads = net.gradients(&[1.0, 0.5], &[1.0, 0.0]).unwrap();
        let before = net.clone();
        net.apply(&grads).unwrap();
        assert_ne!(net, before);
    }

    #[test]
    fn test_single_train_step_moves_output_towards_target() {
        let mut net = seeded(&[2, 2, 2], 0.1, Activation::Sigmoid);
        let input = [0.0, 1.0];
        let target = [1.0, 0.0];

        let before = net.forward(&input).unwrap();
        net.train(&input, &target).unwrap();
        let after = net.forward(&input).unwrap();

        assert_ne!(before[0], after[0]);
        assert!(after[0] > before[0]);
    }

    #[test]
    fn test_single_output_softmax_has_no_gradient() {
        // A one-wide softmax always outputs exactly 1.0, so a target of [1.0]
        // yields a zero output delta and the parameters stay put.
        let mut net = seeded(&[2, 2, 1], 0.1, Activation::Sigmoid);
        let before = net.clone();

        assert_eq!(net.forward(&[0.0, 1.0]).unwrap(), vec![1.0]);
        net.train(&[0.0, 1.0], &[1.0]).unwrap();

        assert_eq!(net.forward(&[0.0, 1.0]).unwrap(), vec![1.0]);
        assert_eq!(net, before);
    }

    #[test]
    fn test_repeated_training_decreases_loss() {
        for act in [Activation::Sigmoid, Activation::Tanh, Activation::ReLU] {
            let mut net = seeded(&[2, 2, 2], 0.5, act);
            let input = [0.0, 1.0];
            let target = [0.0, 1.0];

            let initial = net.loss(&input, &target).unwrap();
            for _ in 0..100 {
                net.train(&input, &target).unwrap();
            }
            let trained = net.loss(&input, &target).unwrap();
            assert!(trained < initial, "{act}: {trained} !< {initial}");
        }
    }

    #[test]
    fn test_gradients_match_finite_differences() {
        let net = seeded(&[3, 4, 3], 0.1, Activation::Tanh);
        let input = [0.3, -0.7, 0.9];
        let target = [0.0, 0.0, 1.0];
        let grads = net.gradients(&input, &target).unwrap();
        let h = 1e-6;

        for (l, layer_grad) in grads.layers.iter().enumerate() {
            for j in 0..layer_grad.weights.rows {
                for i in 0..layer_grad.weights.cols {
                    let mut plus = net.clone();
                    plus.layers[l].weights.data[j][i] += h;
                    let mut minus = net.clone();
                    minus.layers[l].weights.data[j][i] -= h;
                    let numeric = (plus.loss(&input, &target).unwrap()
                        - minus.loss(&input, &target).unwrap())
                        / (2.0 * h);
                    let analytic = layer_grad.weights.data[j][i];
                    assert!((numeric - analytic).abs() < 1e-5, "layer {l} w[{j}][{i}]");
                }
            }
        }
    }

    #[test]
    fn test_softmax_choice_runs_sigmoid_hidden_layers() {
        let softmax = seeded(&[3, 4, 2], 0.1, Activation::Softmax);
        let sigmoid = seeded(&[3, 4, 2], 0.1, Activation::Sigmoid);

        assert_eq!(softmax.activation(), Activation::Softmax);
        assert_eq!(softmax.forward(&[0.5, -1.0, 2.0]).unwrap(), sigmoid.forward(&[0.5, -1.0, 2.0]).unwrap());
        assert_eq!(
            softmax.gradients(&[0.5, -1.0, 2.0], &[0.0, 1.0]).unwrap(),
            sigmoid.gradients(&[0.5, -1.0, 2.0], &[0.0, 1.0]).unwrap()
        );
    }

    #[test]
    fn test_predict_class_is_argmax() {
        let net = seeded(&[2, 3, 4], 0.1, Activation::Sigmoid);
        let out = net.forward(&[0.2, 0.8]).unwrap();
        assert_eq!(net.predict_class(&[0.2, 0.8]).unwrap(), argmax(&out));
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), 1);
    }
}
