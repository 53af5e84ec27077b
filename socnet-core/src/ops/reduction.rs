use crate::autograd::BackwardOp;
use crate::error::SocNetError;
use crate::tensor::Tensor;
use std::sync::Arc;

/// Sum of all elements, as a `[1]` tensor.
pub fn sum_op(a: &Tensor) -> Result<Tensor, SocNetError> {
    let total: f32 = a.get_data().iter().sum();
    let result = Tensor::new(vec![total], vec![1])?;
    if a.requires_grad() {
        result.set_requires_grad(true);
        result.set_grad_fn(Some(Arc::new(SumBackward { a: a.clone() })));
    }
    Ok(result)
}

#[derive(Debug)]
struct SumBackward {
    a: Tensor,
}

impl BackwardOp for SumBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let g = grad_output.item()?;
        let shape = self.a.shape();
        let numel: usize = shape.iter().product();
        Ok(vec![Tensor::new(vec![g; numel], shape)?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

/// Mean of all elements, as a `[1]` tensor.
pub fn mean_op(a: &Tensor) -> Result<Tensor, SocNetError> {
    let numel = a.numel();
    if numel == 0 {
        return Err(SocNetError::ArithmeticError(
            "mean of an empty tensor".to_string(),
        ));
    }
    let total: f32 = a.get_data().iter().sum();
    let result = Tensor::new(vec![total / numel as f32], vec![1])?;
    if a.requires_grad() {
        result.set_requires_grad(true);
        result.set_grad_fn(Some(Arc::new(MeanBackward { a: a.clone() })));
    }
    Ok(result)
}

#[derive(Debug)]
struct MeanBackward {
    a: Tensor,
}

impl BackwardOp for MeanBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let g = grad_output.item()?;
        let shape = self.a.shape();
        let numel: usize = shape.iter().product();
        let value = g / numel as f32;
        Ok(vec![Tensor::new(vec![value; numel], shape)?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

/// Row-wise sum of a `[rows, cols]` tensor into `[rows, 1]`.
///
/// Used to fold per-dimension quantities (revenue terms, transaction costs)
/// into the per-example running cost column.
pub fn sum_rows_op(a: &Tensor) -> Result<Tensor, SocNetError> {
    let shape = a.shape();
    if shape.len() != 2 {
        return Err(SocNetError::ShapeMismatch {
            expected: vec![0, 0],
            actual: shape,
            operation: "sum_rows_op".to_string(),
        });
    }
    let (rows, cols) = (shape[0], shape[1]);
    let data = a.get_data();
    let summed: Vec<f32> = (0..rows)
        .map(|r| data[r * cols..(r + 1) * cols].iter().sum())
        .collect();
    let result = Tensor::new(summed, vec![rows, 1])?;
    if a.requires_grad() {
        result.set_requires_grad(true);
        result.set_grad_fn(Some(Arc::new(SumRowsBackward {
            a: a.clone(),
            rows,
            cols,
        })));
    }
    Ok(result)
}

#[derive(Debug)]
struct SumRowsBackward {
    a: Tensor,
    rows: usize,
    cols: usize,
}

impl BackwardOp for SumRowsBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let g = grad_output.get_data();
        let mut grad = vec![0.0f32; self.rows * self.cols];
        for r in 0..self.rows {
            for c in 0..self.cols {
                grad[r * self.cols + c] = g[r];
            }
        }
        Ok(vec![Tensor::new(grad, vec![self.rows, self.cols])?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(data: Vec<f32>, shape: Vec<usize>) -> Tensor {
        let t = Tensor::new(data, shape).unwrap();
        t.set_requires_grad(true);
        t
    }

    #[test]
    fn sum_and_grad() {
        let a = leaf(vec![1.0, 2.0, 3.0], vec![3]);
        let s = sum_op(&a).unwrap();
        assert_eq!(s.get_data(), vec![6.0]);
        s.backward(None).unwrap();
        assert_eq!(a.grad().unwrap().get_data(), vec![1.0; 3]);
    }

    #[test]
    fn mean_and_grad() {
        let a = leaf(vec![2.0, 4.0, 6.0, 8.0], vec![2, 2]);
        let m = mean_op(&a).unwrap();
        assert_eq!(m.get_data(), vec![5.0]);
        m.backward(None).unwrap();
        assert_eq!(a.grad().unwrap().get_data(), vec![0.25; 4]);
    }

    #[test]
    fn sum_rows_shapes_and_grad() {
        let a = leaf(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
        let s = sum_rows_op(&a).unwrap();
        assert_eq!(s.shape(), vec![2, 1]);
        assert_eq!(s.get_data(), vec![6.0, 15.0]);
        sum_op(&s).unwrap().backward(None).unwrap();
        assert_eq!(a.grad().unwrap().get_data(), vec![1.0; 6]);
    }

    #[test]
    fn mean_of_empty_errors() {
        let a = Tensor::new(vec![], vec![0]).unwrap();
        assert!(mean_op(&a).is_err());
    }
}
