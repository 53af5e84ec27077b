//! Tensor, autograd and neural-network primitives for stochastic optimal
//! control experiments.
//!
//! The crate keeps a deliberately small surface: dense f32 tensors, a
//! reverse-mode tape built from [`autograd::BackwardOp`] nodes, and the
//! handful of ops needed to roll out controlled SDEs and differentiate
//! through them.

pub mod autograd;
pub mod error;
pub mod nn;
pub mod ops;
pub mod tensor;
pub mod tensor_data;

pub use error::SocNetError;
pub use tensor::Tensor;
