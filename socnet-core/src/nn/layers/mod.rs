pub mod activation;
pub mod linear;

pub use activation::{Relu, Sigmoid, Tanh};
pub use linear::Linear;
