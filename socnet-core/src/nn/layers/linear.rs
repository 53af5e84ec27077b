use crate::error::SocNetError;
use crate::nn::init::uniform_fan_in;
use crate::nn::module::Module;
use crate::nn::parameter::{Parameter, SharedParam};
use crate::ops::linalg::linear_op;
use crate::tensor::Tensor;
use rand::rngs::StdRng;
use std::sync::Arc;

/// Affine layer `y = x W^T + b`, weight stored `[out_features, in_features]`.
#[derive(Debug)]
pub struct Linear {
    weight: SharedParam,
    bias: Option<SharedParam>,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    pub fn new(
        in_features: usize,
        out_features: usize,
        has_bias: bool,
        rng: &mut StdRng,
    ) -> Result<Self, SocNetError> {
        if in_features == 0 || out_features == 0 {
            return Err(SocNetError::ConfigurationError(format!(
                "Linear features must be positive, got {}x{}",
                in_features, out_features
            )));
        }
        let weight_data = uniform_fan_in(rng, in_features, out_features * in_features);
        let weight_tensor = Tensor::new(weight_data, vec![out_features, in_features])?;
        let weight = Parameter::shared(weight_tensor, "weight");

        let bias = if has_bias {
            let bias_data = uniform_fan_in(rng, in_features, out_features);
            let bias_tensor = Tensor::new(bias_data, vec![out_features])?;
            Some(Parameter::shared(bias_tensor, "bias"))
        } else {
            None
        };

        Ok(Linear {
            weight,
            bias,
            in_features,
            out_features,
        })
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }
}

impl Module for Linear {
    fn forward(&self, input: &Tensor) -> Result<Tensor, SocNetError> {
        let input_shape = input.shape();
        if input_shape.len() != 2 || input_shape[1] != self.in_features {
            return Err(SocNetError::ShapeMismatch {
                expected: vec![input_shape.first().copied().unwrap_or(0), self.in_features],
                actual: input_shape,
                operation: "Linear::forward".to_string(),
            });
        }
        let weight = self.weight.read().expect("parameter lock poisoned").tensor.clone();
        let bias = self
            .bias
            .as_ref()
            .map(|b| b.read().expect("parameter lock poisoned").tensor.clone());
        linear_op(input, &weight, bias.as_ref())
    }

    fn parameters(&self) -> Vec<SharedParam> {
        let mut params = vec![Arc::clone(&self.weight)];
        if let Some(ref b) = self.bias {
            params.push(Arc::clone(b));
        }
        params
    }

    fn named_parameters(&self) -> Vec<(String, SharedParam)> {
        let mut params = vec![("weight".to_string(), Arc::clone(&self.weight))];
        if let Some(ref b) = self.bias {
            params.push(("bias".to_string(), Arc::clone(b)));
        }
        params
    }
}
