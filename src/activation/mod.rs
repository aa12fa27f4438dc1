pub mod activation;

pub use activation::{softmax, Activation, ParseActivationError};
