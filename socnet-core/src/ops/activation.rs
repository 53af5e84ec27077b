use crate::autograd::BackwardOp;
use crate::error::SocNetError;
use crate::tensor::Tensor;
use std::sync::Arc;

/// Rectified linear unit, element-wise.
pub fn relu_op(a: &Tensor) -> Result<Tensor, SocNetError> {
    let data: Vec<f32> = a.get_data().iter().map(|x| x.max(0.0)).collect();
    let result = Tensor::new(data, a.shape())?;
    if a.requires_grad() {
        result.set_requires_grad(true);
        result.set_grad_fn(Some(Arc::new(ReluBackward { a: a.clone() })));
    }
    Ok(result)
}

#[derive(Debug)]
struct ReluBackward {
    a: Tensor,
}

impl BackwardOp for ReluBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let grad: Vec<f32> = grad_output
            .get_data()
            .iter()
            .zip(self.a.get_data().iter())
            .map(|(g, x)| if *x > 0.0 { *g } else { 0.0 })
            .collect();
        Ok(vec![Tensor::new(grad, grad_output.shape())?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

/// Hyperbolic tangent, element-wise.
pub fn tanh_op(a: &Tensor) -> Result<Tensor, SocNetError> {
    let data: Vec<f32> = a.get_data().iter().map(|x| x.tanh()).collect();
    let result = Tensor::new(data.clone(), a.shape())?;
    if a.requires_grad() {
        result.set_requires_grad(true);
        result.set_grad_fn(Some(Arc::new(TanhBackward {
            a: a.clone(),
            output: data,
        })));
    }
    Ok(result)
}

#[derive(Debug)]
struct TanhBackward {
    a: Tensor,
    output: Vec<f32>,
}

impl BackwardOp for TanhBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let grad: Vec<f32> = grad_output
            .get_data()
            .iter()
            .zip(self.output.iter())
            .map(|(g, y)| g * (1.0 - y * y))
            .collect();
        Ok(vec![Tensor::new(grad, grad_output.shape())?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

/// Logistic sigmoid, element-wise. Bounded controls (quotas, extraction
/// rates) squash their network output through this.
pub fn sigmoid_op(a: &Tensor) -> Result<Tensor, SocNetError> {
    let data: Vec<f32> = a
        .get_data()
        .iter()
        .map(|x| 1.0 / (1.0 + (-x).exp()))
        .collect();
    let result = Tensor::new(data.clone(), a.shape())?;
    if a.requires_grad() {
        result.set_requires_grad(true);
        result.set_grad_fn(Some(Arc::new(SigmoidBackward {
            a: a.clone(),
            output: data,
        })));
    }
    Ok(result)
}

#[derive(Debug)]
struct SigmoidBackward {
    a: Tensor,
    output: Vec<f32>,
}

impl BackwardOp for SigmoidBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let grad: Vec<f32> = grad_output
            .get_data()
            .iter()
            .zip(self.output.iter())
            .map(|(g, y)| g * y * (1.0 - y))
            .collect();
        Ok(vec![Tensor::new(grad, grad_output.shape())?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

/// Natural exponential, element-wise.
pub fn exp_op(a: &Tensor) -> Result<Tensor, SocNetError> {
    let data: Vec<f32> = a.get_data().iter().map(|x| x.exp()).collect();
    let result = Tensor::new(data.clone(), a.shape())?;
    if a.requires_grad() {
        result.set_requires_grad(true);
        result.set_grad_fn(Some(Arc::new(ExpBackward {
            a: a.clone(),
            output: data,
        })));
    }
    Ok(result)
}

#[derive(Debug)]
struct ExpBackward {
    a: Tensor,
    output: Vec<f32>,
}

impl BackwardOp for ExpBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, SocNetError> {
        let grad: Vec<f32> = grad_output
            .get_data()
            .iter()
            .zip(self.output.iter())
            .map(|(g, y)| g * y)
            .collect();
        Ok(vec![Tensor::new(grad, grad_output.shape())?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}
