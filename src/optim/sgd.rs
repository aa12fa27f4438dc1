use crate::layers::dense::{Layer, LayerGradient};

/// Fixed-rate gradient descent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies one SGD weight update to a layer given its pre-computed gradients.
    pub fn step(&self, layer: &mut Layer, grad: &LayerGradient) {
        layer.apply_gradients(grad, self.learning_rate);
    }
}
