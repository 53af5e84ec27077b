use crate::autograd::BackwardOp;
use crate::error::SocNetError;
use crate::tensor::Tensor;
use std::sync::Arc;

/// Shared interior of a [`Tensor`].
///
/// Buffers are always contiguous, row-major `f32`. Autograd metadata
/// (`requires_grad`, `grad`, `grad_fn`) lives here so that every `Tensor`
/// handle cloned from the same node observes the same gradient state.
pub struct TensorData {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
    pub requires_grad: bool,
    pub grad: Option<Tensor>,
    pub grad_fn: Option<Arc<dyn BackwardOp>>,
}

impl TensorData {
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Result<Self, SocNetError> {
        let numel: usize = shape.iter().product();
        if data.len() != numel {
            return Err(SocNetError::TensorCreationError {
                data_len: data.len(),
                shape,
            });
        }
        Ok(TensorData {
            data,
            shape,
            requires_grad: false,
            grad: None,
            grad_fn: None,
        })
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}

impl std::fmt::Debug for TensorData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TensorData")
            .field("shape", &self.shape)
            .field("requires_grad", &self.requires_grad)
            .field("has_grad", &self.grad.is_some())
            .field("has_grad_fn", &self.grad_fn.is_some())
            .finish()
    }
}
