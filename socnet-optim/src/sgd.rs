use crate::base::BaseRule;
use socnet_core::SocNetError;
use std::collections::HashMap;

/// Stochastic gradient descent with classical momentum.
#[derive(Debug)]
pub struct Sgd {
    momentum: f32,
    state: HashMap<usize, Vec<f32>>,
}

impl Sgd {
    pub fn new(momentum: f32) -> Result<Self, SocNetError> {
        if !(0.0..1.0).contains(&momentum) {
            return Err(SocNetError::ConfigurationError(
                "SGD momentum must be in [0, 1)".to_string(),
            ));
        }
        Ok(Sgd {
            momentum,
            state: HashMap::new(),
        })
    }

    pub fn plain() -> Self {
        Sgd {
            momentum: 0.0,
            state: HashMap::new(),
        }
    }
}

impl BaseRule for Sgd {
    fn delta(&mut self, key: usize, grad: &[f32], lr: f32, _t: u64) -> Vec<f32> {
        if self.momentum == 0.0 {
            return grad.iter().map(|&g| lr * g).collect();
        }
        let velocity = self
            .state
            .entry(key)
            .or_insert_with(|| vec![0.0; grad.len()]);
        let mut delta = Vec::with_capacity(grad.len());
        for (i, &g) in grad.iter().enumerate() {
            velocity[i] = self.momentum * velocity[i] + g;
            delta.push(lr * velocity[i]);
        }
        delta
    }

    fn name(&self) -> &'static str {
        "sgd"
    }
}
