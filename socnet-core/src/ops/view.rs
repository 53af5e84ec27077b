use crate::autograd::BackwardOp;
use crate::error::SocNetError;
use crate::tensor::Tensor;
use std::sync::Arc;

/// Concatenates 2-D tensors with equal row counts along the column axis.
///
/// The simulator uses this to assemble `[t, state...]` network inputs and to
/// append diagnostic columns to the loss tensor.
pub fn cat_cols_op(tensors: &[Tensor]) -> Result<Tensor, SocNetError> {
    if tensors.is_empty() {
        return Err(SocNetError::ConfigurationError(
            "cat_cols_op needs at least one tensor".to_string(),
        ));
    }
    let mut rows = None;
    let mut col_counts = Vec::with_capacity(tensors.len());
    for t in tensors {
        let shape = t.shape();
        if shape.len() != 2 {
            return Err(SocNetError::ShapeMismatch {
                expected: vec![0, 0],
                actual: shape,
                operation: "cat_cols_op".to_string(),
            });
        }
        match rows {
            None => rows = Some(shape[0]),
            Some(r) if r != shape[0] => {
                return Err(SocNetError::ShapeMismatch {
                    expected: vec![r, shape[1]],
                    actual: shape,
                    operation: "cat_cols_op".to_string(),
                });
            }
            _ => {}
        }
        col_counts.push(shape[1]);
    }
    let rows = rows.unwrap();
    let total_cols: usize = col_counts.iter().sum();

    let buffers: Vec<Vec<f32>> = tensors.iter().map(|t| t.get_data()).collect();
    let mut data = Vec::with_capacity(rows * total_cols);
    for r in 0..rows {
        for (buf, &cols) in buffers.iter().zip(col_counts.iter()) {
            data.extend_from_slice(&buf[r * cols..(r + 1) * cols]);
        }
    }

    let result = Tensor::new(data, vec![rows, total_cols])?;
    if tensors.iter().any(|t| t.requires_grad()) {
        result.set_requires_grad(true);
        result.set_grad_fn(Some(Arc::new(CatColsBackward {
            inputs: tensors.to_vec(),
            rows,
            col_counts,
        })));
    }
    Ok(result)
}

#[derive(Debug)]
struct CatColsBackward {
    inputs: Vec<Tensor>,
    rows: usize,
    col_counts: Vec<usize>,
}

impl BackwardOp for CatColsBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let g = grad_output.get_data();
        let total_cols: usize = self.col_counts.iter().sum();
        let mut grads = Vec::with_capacity(self.inputs.len());
        let mut offset = 0;
        for &cols in &self.col_counts {
            let mut grad = Vec::with_capacity(self.rows * cols);
            for r in 0..self.rows {
                let start = r * total_cols + offset;
                grad.extend_from_slice(&g[start..start + cols]);
            }
            grads.push(Tensor::new(grad, vec![self.rows, cols])?);
            offset += cols;
        }
        Ok(grads)
    }

    fn inputs(&self) -> Vec<Tensor> {
        self.inputs.clone()
    }
}

/// Copies the column range `[start, end)` out of a 2-D tensor.
pub fn slice_cols_op(a: &Tensor, start: usize, end: usize) -> Result<Tensor, SocNetError> {
    let shape = a.shape();
    if shape.len() != 2 {
        return Err(SocNetError::ShapeMismatch {
            expected: vec![0, 0],
            actual: shape,
            operation: "slice_cols_op".to_string(),
        });
    }
    let (rows, cols) = (shape[0], shape[1]);
    if start >= end || end > cols {
        return Err(SocNetError::IndexOutOfBounds {
            index: end,
            len: cols,
        });
    }
    let width = end - start;
    let data = a.get_data();
    let mut out = Vec::with_capacity(rows * width);
    for r in 0..rows {
        out.extend_from_slice(&data[r * cols + start..r * cols + end]);
    }
    let result = Tensor::new(out, vec![rows, width])?;
    if a.requires_grad() {
        result.set_requires_grad(true);
        result.set_grad_fn(Some(Arc::new(SliceColsBackward {
            a: a.clone(),
            rows,
            cols,
            start,
            width,
        })));
    }
    Ok(result)
}

#[derive(Debug)]
struct SliceColsBackward {
    a: Tensor,
    rows: usize,
    cols: usize,
    start: usize,
    width: usize,
}

impl BackwardOp for SliceColsBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let g = grad_output.get_data();
        let mut grad = vec![0.0f32; self.rows * self.cols];
        for r in 0..self.rows {
            for c in 0..self.width {
                grad[r * self.cols + self.start + c] = g[r * self.width + c];
            }
        }
        Ok(vec![Tensor::new(grad, vec![self.rows, self.cols])?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}
