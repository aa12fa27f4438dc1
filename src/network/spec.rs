use serde::{Deserialize, Serialize};

use crate::activation::activation::Activation;
use crate::error::Result;
use crate::network::network::{validate_sizes, Network};

/// Learning rate used when a spec does not name one.
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

fn default_learning_rate() -> f64 {
    DEFAULT_LEARNING_RATE
}

/// A fully serializable description of a network architecture plus its
/// hyperparameters.
///
/// `NetworkSpec` can be saved to / loaded from JSON independently of the
/// trained weights, so an architecture can be stored before training starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Neuron counts from input to output; at least two entries, none zero.
    pub layer_sizes: Vec<usize>,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default)]
    pub activation: Activation,
}

impl NetworkSpec {
    pub fn new(layer_sizes: Vec<usize>) -> Self {
        NetworkSpec {
            layer_sizes,
            learning_rate: DEFAULT_LEARNING_RATE,
            activation: Activation::default(),
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_sizes(&self.layer_sizes)
    }

    /// Builds a freshly initialized network from this spec.
    pub fn build(&self) -> Result<Network> {
        Network::new(&self.layer_sizes, self.learning_rate, self.activation)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes and validates a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let spec: NetworkSpec = serde_json::from_reader(reader)?;
        spec.validate()?;
        Ok(spec)
    }
}
