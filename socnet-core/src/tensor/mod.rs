use crate::autograd::graph::{topological_sort, NodeId};
use crate::autograd::BackwardOp;
use crate::error::SocNetError;
use crate::tensor_data::TensorData;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub mod create;

pub use create::{from_vec, full, ones, ones_like, randn, randn_with, zeros, zeros_like};

/// A multi-dimensional `f32` array with reverse-mode autograd.
///
/// `Tensor` is a cheap handle: cloning shares the underlying
/// `Arc<RwLock<TensorData>>`, so gradient state written through one handle is
/// visible through every other handle of the same node.
pub struct Tensor {
    pub(crate) data: Arc<RwLock<TensorData>>,
}

impl Tensor {
    /// Creates a new leaf tensor from contiguous row-major data.
    pub fn new(data_vec: Vec<f32>, shape: Vec<usize>) -> Result<Self, SocNetError> {
        let tensor_data = TensorData::new(data_vec, shape)?;
        Ok(Tensor {
            data: Arc::new(RwLock::new(tensor_data)),
        })
    }

    pub(crate) fn read_data(&self) -> RwLockReadGuard<'_, TensorData> {
        self.data.read().expect("Tensor lock poisoned")
    }

    pub(crate) fn write_data(&self) -> RwLockWriteGuard<'_, TensorData> {
        self.data.write().expect("Tensor lock poisoned")
    }

    /// Stable node identity, used as a graph / optimizer-state key.
    pub fn node_id(&self) -> NodeId {
        Arc::as_ptr(&self.data) as NodeId
    }

    pub fn shape(&self) -> Vec<usize> {
        self.read_data().shape.clone()
    }

    pub fn numel(&self) -> usize {
        self.read_data().numel()
    }

    /// Copies the buffer out as a `Vec<f32>`.
    pub fn get_data(&self) -> Vec<f32> {
        self.read_data().data.clone()
    }

    /// Extracts the value of a single-element tensor.
    pub fn item(&self) -> Result<f32, SocNetError> {
        let guard = self.read_data();
        if guard.numel() != 1 {
            return Err(SocNetError::ShapeMismatch {
                expected: vec![1],
                actual: guard.shape.clone(),
                operation: "item".to_string(),
            });
        }
        Ok(guard.data[0])
    }

    // --- autograd state ---

    pub fn requires_grad(&self) -> bool {
        self.read_data().requires_grad
    }

    pub fn set_requires_grad(&self, requires_grad: bool) {
        self.write_data().requires_grad = requires_grad;
    }

    /// Returns a clone of the accumulated gradient, if any.
    pub fn grad(&self) -> Option<Tensor> {
        self.read_data().grad.clone()
    }

    pub fn clear_grad(&self) {
        self.write_data().grad = None;
    }

    pub fn grad_fn(&self) -> Option<Arc<dyn BackwardOp>> {
        self.read_data().grad_fn.clone()
    }

    pub(crate) fn set_grad_fn(&self, grad_fn: Option<Arc<dyn BackwardOp>>) {
        self.write_data().grad_fn = grad_fn;
    }

    /// Accumulates `grad_to_add` into this tensor's `grad` field.
    pub fn acc_grad(&self, grad_to_add: Tensor) -> Result<(), SocNetError> {
        let expected = self.shape();
        if grad_to_add.shape() != expected {
            return Err(SocNetError::ShapeMismatch {
                expected,
                actual: grad_to_add.shape(),
                operation: "acc_grad".to_string(),
            });
        }
        let mut guard = self.write_data();
        match guard.grad.take() {
            Some(existing) => {
                let summed = add_raw(&existing, &grad_to_add)?;
                guard.grad = Some(summed);
            }
            None => guard.grad = Some(grad_to_add),
        }
        Ok(())
    }

    /// Performs the backward pass starting from this tensor.
    ///
    /// With `gradient = None` the tensor must be scalar-like (one element); a
    /// gradient of 1.0 is seeded. Gradients accumulate into the `grad` field
    /// of every reachable leaf with `requires_grad = true`.
    pub fn backward(&self, gradient: Option<Tensor>) -> Result<(), SocNetError> {
        if !self.requires_grad() && self.grad_fn().is_none() {
            return Ok(());
        }

        let seed = match gradient {
            Some(g) => {
                if g.shape() != self.shape() {
                    return Err(SocNetError::ShapeMismatch {
                        expected: self.shape(),
                        actual: g.shape(),
                        operation: "backward".to_string(),
                    });
                }
                g
            }
            None => {
                if self.numel() != 1 {
                    return Err(SocNetError::BackwardNonScalar);
                }
                create::full(&self.shape(), 1.0)?
            }
        };

        let sorted = topological_sort(self);
        let mut grad_map: HashMap<NodeId, Tensor> = HashMap::new();
        grad_map.insert(self.node_id(), seed);

        for node in sorted.iter().rev() {
            let node_grad = match grad_map.remove(&node.node_id()) {
                Some(g) => g,
                None => continue,
            };

            match node.grad_fn() {
                Some(op) => {
                    let input_grads = op.backward(&node_grad)?;
                    let inputs = op.inputs();
                    if input_grads.len() != inputs.len() {
                        return Err(SocNetError::BackwardError(format!(
                            "op returned {} gradients for {} inputs",
                            input_grads.len(),
                            inputs.len()
                        )));
                    }
                    for (input, grad) in inputs.into_iter().zip(input_grads) {
                        if !input.requires_grad() && input.grad_fn().is_none() {
                            continue;
                        }
                        match grad_map.remove(&input.node_id()) {
                            Some(existing) => {
                                let summed = add_raw(&existing, &grad)?;
                                grad_map.insert(input.node_id(), summed);
                            }
                            None => {
                                grad_map.insert(input.node_id(), grad);
                            }
                        }
                    }
                }
                None => {
                    if node.requires_grad() {
                        node.acc_grad(node_grad)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Plain element-wise sum used for gradient accumulation; builds no graph.
fn add_raw(a: &Tensor, b: &Tensor) -> Result<Tensor, SocNetError> {
    let a_guard = a.read_data();
    let b_guard = b.read_data();
    if a_guard.shape != b_guard.shape {
        return Err(SocNetError::ShapeMismatch {
            expected: a_guard.shape.clone(),
            actual: b_guard.shape.clone(),
            operation: "grad accumulation".to_string(),
        });
    }
    let data: Vec<f32> = a_guard
        .data
        .iter()
        .zip(b_guard.data.iter())
        .map(|(x, y)| x + y)
        .collect();
    let shape = a_guard.shape.clone();
    drop(a_guard);
    drop(b_guard);
    Tensor::new(data, shape)
}

impl Clone for Tensor {
    fn clone(&self) -> Self {
        Tensor {
            data: Arc::clone(&self.data),
        }
    }
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.read_data();
        write!(
            f,
            "Tensor(shape={:?}, requires_grad={}, data={:?})",
            guard.shape, guard.requires_grad, guard.data
        )
    }
}

impl PartialEq for Tensor {
    /// Two handles are equal when they point at the same node.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::arithmetic::{add_op, mul_op};

    #[test]
    fn new_rejects_bad_shape() {
        let err = Tensor::new(vec![1.0, 2.0, 3.0], vec![2, 2]).unwrap_err();
        assert_eq!(
            err,
            SocNetError::TensorCreationError {
                data_len: 3,
                shape: vec![2, 2],
            }
        );
    }

    #[test]
    fn clone_shares_node() {
        let t = Tensor::new(vec![1.0, 2.0], vec![2]).unwrap();
        let u = t.clone();
        assert_eq!(t.node_id(), u.node_id());
        u.set_requires_grad(true);
        assert!(t.requires_grad());
    }

    #[test]
    fn backward_requires_scalar_without_seed() {
        let t = Tensor::new(vec![1.0, 2.0], vec![2]).unwrap();
        t.set_requires_grad(true);
        let doubled = add_op(&t, &t).unwrap();
        assert_eq!(doubled.backward(None), Err(SocNetError::BackwardNonScalar));
    }

    #[test]
    fn backward_accumulates_through_shared_input() {
        // y = x * x; dy/dx = 2x
        let x = Tensor::new(vec![3.0], vec![1]).unwrap();
        x.set_requires_grad(true);
        let y = mul_op(&x, &x).unwrap();
        y.backward(None).unwrap();
        assert_eq!(x.grad().unwrap().get_data(), vec![6.0]);
    }

    #[test]
    fn repeated_backward_accumulates_leaf_grads() {
        let x = Tensor::new(vec![2.0], vec![1]).unwrap();
        x.set_requires_grad(true);
        for _ in 0..2 {
            let y = mul_op(&x, &x).unwrap();
            y.backward(None).unwrap();
        }
        assert_eq!(x.grad().unwrap().get_data(), vec![8.0]);
        x.clear_grad();
        assert!(x.grad().is_none());
    }
}
