use crate::autograd::BackwardOp;
use crate::error::SocNetError;
use crate::tensor::Tensor;
use std::sync::Arc;

/// Row-major matmul of `a` `[m, k]` by `b` `[k, n]` into a `[m, n]` buffer.
fn matmul_raw(a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; m * n];
    for i in 0..m {
        for p in 0..k {
            let a_ip = a[i * k + p];
            if a_ip == 0.0 {
                continue;
            }
            let b_row = &b[p * n..(p + 1) * n];
            let out_row = &mut out[i * n..(i + 1) * n];
            for j in 0..n {
                out_row[j] += a_ip * b_row[j];
            }
        }
    }
    out
}

fn transpose_raw(a: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; rows * cols];
    for i in 0..rows {
        for j in 0..cols {
            out[j * rows + i] = a[i * cols + j];
        }
    }
    out
}

fn dims_2d(t: &Tensor, operation: &str) -> Result<(usize, usize), SocNetError> {
    let shape = t.shape();
    if shape.len() != 2 {
        return Err(SocNetError::ShapeMismatch {
            expected: vec![0, 0],
            actual: shape,
            operation: operation.to_string(),
        });
    }
    Ok((shape[0], shape[1]))
}

/// 2-D matrix product `a [m, k] @ b [k, n]`.
pub fn matmul_op(a: &Tensor, b: &Tensor) -> Result<Tensor, SocNetError> {
    let (m, k) = dims_2d(a, "matmul_op")?;
    let (k2, n) = dims_2d(b, "matmul_op")?;
    if k != k2 {
        return Err(SocNetError::ShapeMismatch {
            expected: vec![m, k],
            actual: vec![k2, n],
            operation: "matmul_op".to_string(),
        });
    }

    let data = matmul_raw(&a.get_data(), &b.get_data(), m, k, n);
    let result = Tensor::new(data, vec![m, n])?;
    if a.requires_grad() || b.requires_grad() {
        result.set_requires_grad(true);
        result.set_grad_fn(Some(Arc::new(MatmulBackward {
            a: a.clone(),
            b: b.clone(),
            m,
            k,
            n,
        })));
    }
    Ok(result)
}

#[derive(Debug)]
struct MatmulBackward {
    a: Tensor,
    b: Tensor,
    m: usize,
    k: usize,
    n: usize,
}

impl BackwardOp for MatmulBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let g = grad_output.get_data();
        let a_data = self.a.get_data();
        let b_data = self.b.get_data();

        // dA = G @ B^T, dB = A^T @ G
        let b_t = transpose_raw(&b_data, self.k, self.n);
        let grad_a = matmul_raw(&g, &b_t, self.m, self.n, self.k);
        let a_t = transpose_raw(&a_data, self.m, self.k);
        let grad_b = matmul_raw(&a_t, &g, self.k, self.m, self.n);

        Ok(vec![
            Tensor::new(grad_a, vec![self.m, self.k])?,
            Tensor::new(grad_b, vec![self.k, self.n])?,
        ])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }
}

/// Fused affine map `input [b, in] @ weight^T [in, out] + bias [out]`.
///
/// The weight is stored `[out, in]` as layers do; fusing the transpose into
/// one op keeps the rollout graph shallow.
pub fn linear_op(
    input: &Tensor,
    weight: &Tensor,
    bias: Option<&Tensor>,
) -> Result<Tensor, SocNetError> {
    let (batch, in_features) = dims_2d(input, "linear_op")?;
    let (out_features, w_in) = dims_2d(weight, "linear_op")?;
    if in_features != w_in {
        return Err(SocNetError::ShapeMismatch {
            expected: vec![out_features, in_features],
            actual: vec![out_features, w_in],
            operation: "linear_op".to_string(),
        });
    }
    if let Some(b) = bias {
        let b_shape = b.shape();
        if b_shape != vec![out_features] {
            return Err(SocNetError::ShapeMismatch {
                expected: vec![out_features],
                actual: b_shape,
                operation: "linear_op".to_string(),
            });
        }
    }

    let w_t = transpose_raw(&weight.get_data(), out_features, in_features);
    let mut data = matmul_raw(&input.get_data(), &w_t, batch, in_features, out_features);
    if let Some(b) = bias {
        let b_data = b.get_data();
        for (i, x) in data.iter_mut().enumerate() {
            *x += b_data[i % out_features];
        }
    }

    let result = Tensor::new(data, vec![batch, out_features])?;
    let requires_grad = input.requires_grad()
        || weight.requires_grad()
        || bias.map_or(false, |b| b.requires_grad());
    if requires_grad {
        result.set_requires_grad(true);
        result.set_grad_fn(Some(Arc::new(LinearBackward {
            input: input.clone(),
            weight: weight.clone(),
            bias: bias.cloned(),
            batch,
            in_features,
            out_features,
        })));
    }
    Ok(result)
}

#[derive(Debug)]
struct LinearBackward {
    input: Tensor,
    weight: Tensor,
    bias: Option<Tensor>,
    batch: usize,
    in_features: usize,
    out_features: usize,
}

impl BackwardOp for LinearBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let g = grad_output.get_data();
        let x = self.input.get_data();
        let w = self.weight.get_data();

        // dX = G @ W, dW = G^T @ X, db = column sums of G
        let grad_input = matmul_raw(&g, &w, self.batch, self.out_features, self.in_features);
        let g_t = transpose_raw(&g, self.batch, self.out_features);
        let grad_weight = matmul_raw(&g_t, &x, self.out_features, self.batch, self.in_features);

        let mut grads = vec![
            Tensor::new(grad_input, vec![self.batch, self.in_features])?,
            Tensor::new(grad_weight, vec![self.out_features, self.in_features])?,
        ];
        if self.bias.is_some() {
            let mut grad_bias = vec![0.0f32; self.out_features];
            for r in 0..self.batch {
                for c in 0..self.out_features {
                    grad_bias[c] += g[r * self.out_features + c];
                }
            }
            grads.push(Tensor::new(grad_bias, vec![self.out_features])?);
        }
        Ok(grads)
    }

    fn inputs(&self) -> Vec<Tensor> {
        let mut inputs = vec![self.input.clone(), self.weight.clone()];
        if let Some(ref b) = self.bias {
            inputs.push(b.clone());
        }
        inputs
    }
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
    fn matmul_values() {
        let a = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap();
        let b = Tensor::new(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], vec![3, 2]).unwrap();
        let c = matmul_op(&a, &b).unwrap();
        assert_eq!(c.shape(), vec![2, 2]);
        assert_eq!(c.get_data(), vec![58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn matmul_rejects_inner_mismatch() {
        let a = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();
        let b = Tensor::new(vec![1.0, 2.0, 3.0], vec![3, 1]).unwrap();
        assert!(matmul_op(&a, &b).is_err());
    }

    #[test]
    fn matmul_grads() {
        let a = leaf(vec![1.0, 2.0], vec![1, 2]);
        let b = leaf(vec![3.0, 4.0], vec![2, 1]);
        let c = matmul_op(&a, &b).unwrap();
        assert_eq!(c.get_data(), vec![11.0]);
        c.backward(None).unwrap();
        assert_eq!(a.grad().unwrap().get_data(), vec![3.0, 4.0]);
        assert_eq!(b.grad().unwrap().get_data(), vec![1.0, 2.0]);
    }

    #[test]
    fn linear_matches_manual_affine() {
        // x [1,3] @ w^T [3,2] + b, w stored [2,3]
        let x = Tensor::new(vec![10.0, 20.0, 30.0], vec![1, 3]).unwrap();
        let w = leaf(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
        let b = leaf(vec![0.1, 0.2], vec![2]);
        let y = linear_op(&x, &w, Some(&b)).unwrap();
        let y_data = y.get_data();
        assert!((y_data[0] - 140.1).abs() < 1e-4);
        assert!((y_data[1] - 320.2).abs() < 1e-4);
    }

    #[test]
    fn linear_grads_batch() {
        let x = leaf(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
        let w = leaf(vec![1.0, 0.0, 0.0, 1.0], vec![2, 2]);
        let b = leaf(vec![0.0, 0.0], vec![2]);
        let y = linear_op(&x, &w, Some(&b)).unwrap();
        sum_op(&y).unwrap().backward(None).unwrap();
        // dX = G @ W = ones @ identity
        assert_eq!(x.grad().unwrap().get_data(), vec![1.0; 4]);
        // dW = G^T @ X = column sums of X per output row
        assert_eq!(w.grad().unwrap().get_data(), vec![4.0, 6.0, 4.0, 6.0]);
        // db = batch count per output
        assert_eq!(b.grad().unwrap().get_data(), vec![2.0, 2.0]);
    }
}
