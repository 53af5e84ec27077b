use crate::autograd::BackwardOp;
use crate::error::SocNetError;
use crate::tensor::Tensor;
use std::sync::Arc;

fn check_same_shape(a: &Tensor, b: &Tensor, operation: &str) -> Result<Vec<usize>, SocNetError> {
    let a_shape = a.shape();
    let b_shape = b.shape();
    if a_shape != b_shape {
        return Err(SocNetError::ShapeMismatch {
            expected: a_shape,
            actual: b_shape,
            operation: operation.to_string(),
        });
    }
    Ok(a_shape)
}

fn attach_grad_fn(result: &Tensor, requires_grad: bool, grad_fn: Arc<dyn BackwardOp>) {
    if requires_grad {
        result.set_requires_grad(true);
        result.set_grad_fn(Some(grad_fn));
    }
}

// --- add ---

/// Element-wise addition. Shapes must match, except for the bias case
/// `[rows, n] + [n]` where the right-hand side is broadcast over rows.
pub fn add_op(a: &Tensor, b: &Tensor) -> Result<Tensor, SocNetError> {
    let a_shape = a.shape();
    let b_shape = b.shape();

    let broadcast_bias = a_shape.len() == 2 && b_shape.len() == 1 && b_shape[0] == a_shape[1];
    if a_shape != b_shape && !broadcast_bias {
        return Err(SocNetError::BroadcastError {
            shape1: a_shape,
            shape2: b_shape,
        });
    }

    let a_data = a.get_data();
    let b_data = b.get_data();
    let data: Vec<f32> = if broadcast_bias {
        let n = b_shape[0];
        a_data
            .iter()
            .enumerate()
            .map(|(i, x)| x + b_data[i % n])
            .collect()
    } else {
        a_data.iter().zip(b_data.iter()).map(|(x, y)| x + y).collect()
    };

    let result = Tensor::new(data, a_shape)?;
    attach_grad_fn(
        &result,
        a.requires_grad() || b.requires_grad(),
        Arc::new(AddBackward {
            a: a.clone(),
            b: b.clone(),
            broadcast_bias,
        }),
    );
    Ok(result)
}

#[derive(Debug)]
struct AddBackward {
    a: Tensor,
    b: Tensor,
    broadcast_bias: bool,
}

impl BackwardOp for AddBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let grad_a = Tensor::new(grad_output.get_data(), grad_output.shape())?;
        let grad_b = if self.broadcast_bias {
            let shape = grad_output.shape();
            let (rows, n) = (shape[0], shape[1]);
            let g = grad_output.get_data();
            let mut summed = vec![0.0f32; n];
            for r in 0..rows {
                for c in 0..n {
                    summed[c] += g[r * n + c];
                }
            }
            Tensor::new(summed, vec![n])?
        } else {
            Tensor::new(grad_output.get_data(), grad_output.shape())?
        };
        Ok(vec![grad_a, grad_b])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }
}

// --- sub ---

/// Element-wise subtraction of same-shape tensors.
pub fn sub_op(a: &Tensor, b: &Tensor) -> Result<Tensor, SocNetError> {
    let shape = check_same_shape(a, b, "sub_op")?;
    let data: Vec<f32> = a
        .get_data()
        .iter()
        .zip(b.get_data().iter())
        .map(|(x, y)| x - y)
        .collect();
    let result = Tensor::new(data, shape)?;
    attach_grad_fn(
        &result,
        a.requires_grad() || b.requires_grad(),
        Arc::new(SubBackward {
            a: a.clone(),
            b: b.clone(),
        }),
    );
    Ok(result)
}

#[derive(Debug)]
struct SubBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for SubBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let grad_a = Tensor::new(grad_output.get_data(), grad_output.shape())?;
        let grad_b_data: Vec<f32> = grad_output.get_data().iter().map(|g| -g).collect();
        let grad_b = Tensor::new(grad_b_data, grad_output.shape())?;
        Ok(vec![grad_a, grad_b])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }
}

// --- mul ---

/// Element-wise product of same-shape tensors.
pub fn mul_op(a: &Tensor, b: &Tensor) -> Result<Tensor, SocNetError> {
    let shape = check_same_shape(a, b, "mul_op")?;
    let data: Vec<f32> = a
        .get_data()
        .iter()
        .zip(b.get_data().iter())
        .map(|(x, y)| x * y)
        .collect();
    let result = Tensor::new(data, shape)?;
    attach_grad_fn(
        &result,
        a.requires_grad() || b.requires_grad(),
        Arc::new(MulBackward {
            a: a.clone(),
            b: b.clone(),
        }),
    );
    Ok(result)
}

#[derive(Debug)]
struct MulBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for MulBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let g = grad_output.get_data();
        let a_data = self.a.get_data();
        let b_data = self.b.get_data();
        let grad_a: Vec<f32> = g.iter().zip(b_data.iter()).map(|(g, y)| g * y).collect();
        let grad_b: Vec<f32> = g.iter().zip(a_data.iter()).map(|(g, x)| g * x).collect();
        Ok(vec![
            Tensor::new(grad_a, grad_output.shape())?,
            Tensor::new(grad_b, grad_output.shape())?,
        ])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }
}

// --- div ---

/// Element-wise division of same-shape tensors.
pub fn div_op(a: &Tensor, b: &Tensor) -> Result<Tensor, SocNetError> {
    let shape = check_same_shape(a, b, "div_op")?;
    let data: Vec<f32> = a
        .get_data()
        .iter()
        .zip(b.get_data().iter())
        .map(|(x, y)| x / y)
        .collect();
    let result = Tensor::new(data, shape)?;
    attach_grad_fn(
        &result,
        a.requires_grad() || b.requires_grad(),
        Arc::new(DivBackward {
            a: a.clone(),
            b: b.clone(),
        }),
    );
    Ok(result)
}

#[derive(Debug)]
struct DivBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for DivBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let g = grad_output.get_data();
        let a_data = self.a.get_data();
        let b_data = self.b.get_data();
        let grad_a: Vec<f32> = g.iter().zip(b_data.iter()).map(|(g, y)| g / y).collect();
        let grad_b: Vec<f32> = g
            .iter()
            .zip(a_data.iter().zip(b_data.iter()))
            .map(|(g, (x, y))| -g * x / (y * y))
            .collect();
        Ok(vec![
            Tensor::new(grad_a, grad_output.shape())?,
            Tensor::new(grad_b, grad_output.shape())?,
        ])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }
}

// --- neg ---

pub fn neg_op(a: &Tensor) -> Result<Tensor, SocNetError> {
    let data: Vec<f32> = a.get_data().iter().map(|x| -x).collect();
    let result = Tensor::new(data, a.shape())?;
    attach_grad_fn(
        &result,
        a.requires_grad(),
        Arc::new(NegBackward { a: a.clone() }),
    );
    Ok(result)
}

#[derive(Debug)]
struct NegBackward {
    a: Tensor,
}

impl BackwardOp for NegBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let grad: Vec<f32> = grad_output.get_data().iter().map(|g| -g).collect();
        Ok(vec![Tensor::new(grad, grad_output.shape())?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

// --- scalar ops ---

/// Adds a scalar to every element.
pub fn add_scalar_op(a: &Tensor, value: f32) -> Result<Tensor, SocNetError> {
    let data: Vec<f32> = a.get_data().iter().map(|x| x + value).collect();
    let result = Tensor::new(data, a.shape())?;
    attach_grad_fn(
        &result,
        a.requires_grad(),
        Arc::new(AddScalarBackward { a: a.clone() }),
    );
    Ok(result)
}

#[derive(Debug)]
struct AddScalarBackward {
    a: Tensor,
}

impl BackwardOp for AddScalarBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        Ok(vec![Tensor::new(
            grad_output.get_data(),
            grad_output.shape(),
        )?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

/// Multiplies every element by a scalar.
pub fn mul_scalar_op(a: &Tensor, value: f32) -> Result<Tensor, SocNetError> {
    let data: Vec<f32> = a.get_data().iter().map(|x| x * value).collect();
    let result = Tensor::new(data, a.shape())?;
    attach_grad_fn(
        &result,
        a.requires_grad(),
        Arc::new(MulScalarBackward {
            a: a.clone(),
            value,
        }),
    );
    Ok(result)
}

#[derive(Debug)]
struct MulScalarBackward {
    a: Tensor,
    value: f32,
}

impl BackwardOp for MulScalarBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let grad: Vec<f32> = grad_output.get_data().iter().map(|g| g * self.value).collect();
        Ok(vec![Tensor::new(grad, grad_output.shape())?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

/// Quadratic convenience: `x * x` as a single graph node pair.
pub fn square_op(a: &Tensor) -> Result<Tensor, SocNetError> {
    mul_op(a, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::reduction::sum_op;

    fn leaf(data: Vec<f32>, shape: Vec<usize>) -> Tensor {
        let t = Tensor::new(data, shape).unwrap();
        t.set_requires_grad(true);
        t
    }

    #[test]
    fn add_values_and_grads() {
        let a = leaf(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
        let b = leaf(vec![10.0, 20.0, 30.0, 40.0], vec![2, 2]);
        let c = add_op(&a, &b).unwrap();
        assert_eq!(c.get_data(), vec![11.0, 22.0, 33.0, 44.0]);
        sum_op(&c).unwrap().backward(None).unwrap();
        assert_eq!(a.grad().unwrap().get_data(), vec![1.0; 4]);
        assert_eq!(b.grad().unwrap().get_data(), vec![1.0; 4]);
    }

    #[test]
    fn add_bias_broadcast_sums_rows_in_backward() {
        let a = leaf(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
        let bias = leaf(vec![0.5, -0.5], vec![2]);
        let c = add_op(&a, &bias).unwrap();
        assert_eq!(c.get_data(), vec![1.5, 1.5, 3.5, 3.5]);
        sum_op(&c).unwrap().backward(None).unwrap();
        assert_eq!(bias.grad().unwrap().get_data(), vec![2.0, 2.0]);
    }

    #[test]
    fn add_rejects_incompatible_shapes() {
        let a = Tensor::new(vec![1.0, 2.0], vec![2]).unwrap();
        let b = Tensor::new(vec![1.0, 2.0, 3.0], vec![3]).unwrap();
        assert!(matches!(
            add_op(&a, &b),
            Err(SocNetError::BroadcastError { .. })
        ));
    }

    #[test]
    fn mul_grads_are_cross_terms() {
        let a = leaf(vec![2.0, 3.0], vec![2]);
        let b = leaf(vec![5.0, 7.0], vec![2]);
        let c = mul_op(&a, &b).unwrap();
        assert_eq!(c.get_data(), vec![10.0, 21.0]);
        sum_op(&c).unwrap().backward(None).unwrap();
        assert_eq!(a.grad().unwrap().get_data(), vec![5.0, 7.0]);
        assert_eq!(b.grad().unwrap().get_data(), vec![2.0, 3.0]);
    }

    #[test]
    fn div_grads() {
        let a = leaf(vec![6.0], vec![1]);
        let b = leaf(vec![3.0], vec![1]);
        let c = div_op(&a, &b).unwrap();
        assert_eq!(c.get_data(), vec![2.0]);
        c.backward(None).unwrap();
        assert_eq!(a.grad().unwrap().get_data(), vec![1.0 / 3.0]);
        assert_eq!(b.grad().unwrap().get_data(), vec![-6.0 / 9.0]);
    }

    #[test]
    fn sub_and_neg_grads() {
        let a = leaf(vec![5.0], vec![1]);
        let b = leaf(vec![2.0], vec![1]);
        let c = sub_op(&a, &b).unwrap();
        assert_eq!(c.get_data(), vec![3.0]);
        let d = neg_op(&c).unwrap();
        d.backward(None).unwrap();
        assert_eq!(a.grad().unwrap().get_data(), vec![-1.0]);
        assert_eq!(b.grad().unwrap().get_data(), vec![1.0]);
    }

    #[test]
    fn scalar_ops() {
        let a = leaf(vec![1.0, -2.0], vec![2]);
        let b = mul_scalar_op(&a, 3.0).unwrap();
        let c = add_scalar_op(&b, 1.0).unwrap();
        assert_eq!(c.get_data(), vec![4.0, -5.0]);
        sum_op(&c).unwrap().backward(None).unwrap();
        assert_eq!(a.grad().unwrap().get_data(), vec![3.0, 3.0]);
    }

    #[test]
    fn square_is_self_product() {
        let a = leaf(vec![3.0], vec![1]);
        let s = square_op(&a).unwrap();
        assert_eq!(s.get_data(), vec![9.0]);
        s.backward(None).unwrap();
        assert_eq!(a.grad().unwrap().get_data(), vec![6.0]);
    }
}
