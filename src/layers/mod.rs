pub mod dense;

pub use dense::{Layer, LayerGradient, INIT_STD_DEV};
