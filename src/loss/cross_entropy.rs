/// Categorical cross-entropy loss for use with a Softmax output layer.
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
pub const EPS: f64 = 1e-10;

impl CrossEntropyLoss {
    /// Computes the scalar cross-entropy loss:
    ///   L = -sum(expected[i] * log(predicted[i] + eps))
    ///
    /// `predicted`: softmax probabilities, shape [n_classes]
    /// `expected`: one-hot (or soft) target distribution, shape [n_classes]
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted
            .iter()
            .zip(expected.iter())
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum()
    }

    /// Gradient of the combined Softmax + cross-entropy w.r.t. the pre-softmax
    /// logits:
    ///   ∂L/∂z_i = predicted[i] - expected[i]
    ///
    /// This is the output-layer delta of the backward pass; it is only valid
    /// because the output is a softmax scored by cross-entropy.
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted
            .iter()
            .zip(expected.iter())
            .map(|(p, e)| p - e)
            .collect()
    }
}

/// One-hot encodes `label` over `classes` outputs.
///
/// Returns `None` when `label >= classes`.
pub fn one_hot(label: usize, classes: usize) -> Option<Vec<f64>> {
    if label >= classes {
        return None;
    }
    let mut encoded = vec![0.0; classes];
    encoded[label] = 1.0;
    Some(encoded)
}
