pub mod metadata;
pub mod network;
pub mod prediction;
pub mod shared;
pub mod spec;

pub use metadata::ModelMetadata;
pub use network::{argmax, Gradients, Network};
pub use prediction::{rank_predictions, Prediction};
pub use shared::SharedNetwork;
pub use spec::NetworkSpec;
