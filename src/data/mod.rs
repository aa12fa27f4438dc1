pub mod buffer;

pub use buffer::{SampleBuffer, DEFAULT_CAPACITY};
