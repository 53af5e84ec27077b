use crate::error::SocNetError;
use crate::tensor::Tensor;
use std::fmt::Debug;

/// Backward pass of one differentiable tensor operation.
///
/// Every operation that produces a non-leaf tensor stores an implementation of
/// this trait in the output's `grad_fn`. During `Tensor::backward` the stored
/// op receives dL/dOutput and returns dL/dInput_i for each input.
///
/// Implementations keep strong `Tensor` clones of their forward inputs; those
/// clones keep the upstream graph alive and double as the traversal edges
/// returned by [`BackwardOp::inputs`].
pub trait BackwardOp: Debug + Send + Sync {
    /// Computes the input gradients given the output gradient.
    ///
    /// The returned vector must hold exactly one gradient per input, in the
    /// same order as [`BackwardOp::inputs`], each with the input's shape.
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError>;

    /// The forward inputs of this operation, in gradient order.
    fn inputs(&self) -> Vec<Tensor>;
}
