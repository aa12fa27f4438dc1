pub mod activation;
pub mod data;
pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod network;
pub mod optim;
pub mod persist;
pub mod train;

// Convenience re-exports
pub use activation::activation::{softmax, Activation};
pub use data::buffer::SampleBuffer;
pub use error::{NetworkError, Result};
pub use layers::dense::Layer;
pub use loss::cross_entropy::{one_hot, CrossEntropyLoss};
pub use math::matrix::Matrix;
pub use network::metadata::ModelMetadata;
pub use network::network::{Gradients, Network};
pub use network::prediction::{rank_predictions, Prediction};
pub use network::shared::SharedNetwork;
pub use network::spec::NetworkSpec;
pub use optim::sgd::Sgd;
pub use train::{train_loop, train_loop_shared, EpochStats, TrainConfig};
