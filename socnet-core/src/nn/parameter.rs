use crate::error::SocNetError;
use crate::tensor::Tensor;
use std::sync::{Arc, RwLock};

/// A learnable tensor owned by a module.
///
/// Parameters are shared as `Arc<RwLock<Parameter>>` between the module that
/// forwards through them and the optimizer that updates them.
#[derive(Debug)]
pub struct Parameter {
    pub tensor: Tensor,
    name: Option<String>,
}

/// Shared handle to a parameter.
pub type SharedParam = Arc<RwLock<Parameter>>;

impl Parameter {
    /// Wraps a tensor as a named parameter; `requires_grad` is forced on.
    pub fn new(tensor: Tensor, name: Option<String>) -> Self {
        tensor.set_requires_grad(true);
        Parameter { tensor, name }
    }

    pub fn shared(tensor: Tensor, name: &str) -> SharedParam {
        Arc::new(RwLock::new(Parameter::new(tensor, Some(name.to_string()))))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.tensor.shape()
    }

    pub fn numel(&self) -> usize {
        self.tensor.numel()
    }

    pub fn grad(&self) -> Option<Tensor> {
        self.tensor.grad()
    }

    pub fn zero_grad(&mut self) {
        self.tensor.clear_grad();
    }

    /// Overwrites the parameter values in place. The shape must be preserved;
    /// optimizer steps run outside the autograd graph.
    pub fn set_data(&mut self, values: Vec<f32>) -> Result<(), SocNetError> {
        let mut guard = self.tensor.write_data();
        if values.len() != guard.numel() {
            return Err(SocNetError::ShapeMismatch {
                expected: guard.shape.clone(),
                actual: vec![values.len()],
                operation: "Parameter::set_data".to_string(),
            });
        }
        guard.data = values;
        Ok(())
    }

    pub fn data(&self) -> Vec<f32> {
        self.tensor.get_data()
    }
}

/// Stable key identifying a parameter across module and optimizer: the
/// address of its shared `Arc`.
pub fn param_key(param: &SharedParam) -> usize {
    Arc::as_ptr(param) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_requires_grad() {
        let p = Parameter::new(Tensor::new(vec![1.0], vec![1]).unwrap(), None);
        assert!(p.tensor.requires_grad());
        assert_eq!(p.name(), None);
    }

    #[test]
    fn set_data_checks_length() {
        let mut p = Parameter::new(Tensor::new(vec![1.0, 2.0], vec![2]).unwrap(), None);
        assert!(p.set_data(vec![1.0]).is_err());
        p.set_data(vec![3.0, 4.0]).unwrap();
        assert_eq!(p.data(), vec![3.0, 4.0]);
    }

    #[test]
    fn shared_key_is_stable() {
        let p = Parameter::shared(Tensor::new(vec![0.0], vec![1]).unwrap(), "w");
        let k1 = param_key(&p);
        let p2 = Arc::clone(&p);
        assert_eq!(k1, param_key(&p2));
    }
}
