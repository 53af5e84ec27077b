use crate::error::SocNetError;
use crate::nn::module::Module;
use crate::nn::parameter::SharedParam;
use crate::ops::activation::{relu_op, sigmoid_op, tanh_op};
use crate::tensor::Tensor;

/// Parameter-free ReLU module.
#[derive(Debug, Default)]
pub struct Relu;

impl Module for Relu {
    fn forward(&self, input: &Tensor) -> Result<Tensor, SocNetError> {
        relu_op(input)
    }

    fn parameters(&self) -> Vec<SharedParam> {
        Vec::new()
    }

    fn named_parameters(&self) -> Vec<(String, SharedParam)> {
        Vec::new()
    }
}

/// Parameter-free Tanh module.
#[derive(Debug, Default)]
pub struct Tanh;

impl Module for Tanh {
    fn forward(&self, input: &Tensor) -> Result<Tensor, SocNetError> {
        tanh_op(input)
    }

    fn parameters(&self) -> Vec<SharedParam> {
        Vec::new()
    }

    fn named_parameters(&self) -> Vec<(String, SharedParam)> {
        Vec::new()
    }
}

/// Parameter-free Sigmoid module.
#[derive(Debug, Default)]
pub struct Sigmoid;

impl Module for Sigmoid {
    fn forward(&self, input: &Tensor) -> Result<Tensor, SocNetError> {
        sigmoid_op(input)
    }

    fn parameters(&self) -> Vec<SharedParam> {
        Vec::new()
    }

    fn named_parameters(&self) -> Vec<(String, SharedParam)> {
        Vec::new()
    }
}
