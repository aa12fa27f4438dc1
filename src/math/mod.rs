pub mod matrix;

pub use matrix::{gaussian_vec, Matrix};
