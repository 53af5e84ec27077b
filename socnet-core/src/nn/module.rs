use crate::error::SocNetError;
use crate::nn::parameter::SharedParam;
use crate::tensor::Tensor;

/// Base trait for neural network building blocks.
pub trait Module: std::fmt::Debug + Send + Sync {
    /// Forward pass of the module.
    fn forward(&self, input: &Tensor) -> Result<Tensor, SocNetError>;

    /// All learnable parameters of the module, including sub-modules.
    fn parameters(&self) -> Vec<SharedParam>;

    /// Parameters with hierarchical names (`layer.weight` style).
    fn named_parameters(&self) -> Vec<(String, SharedParam)>;
}
