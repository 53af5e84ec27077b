use crate::base::BaseRule;
use socnet_core::SocNetError;
use std::collections::HashMap;

/// Per-parameter Adam accumulators.
#[derive(Debug, Default, Clone)]
struct AdamState {
    m: Vec<f32>,
    v: Vec<f32>,
}

/// Adam with bias correction.
#[derive(Debug)]
pub struct Adam {
    beta1: f32,
    beta2: f32,
    eps: f32,
    state: HashMap<usize, AdamState>,
}

impl Adam {
    pub fn new(beta1: f32, beta2: f32, eps: f32) -> Result<Self, SocNetError> {
        if !(0.0..1.0).contains(&beta1) {
            return Err(SocNetError::ConfigurationError(
                "Adam beta1 must be in [0, 1)".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&beta2) {
            return Err(SocNetError::ConfigurationError(
                "Adam beta2 must be in [0, 1)".to_string(),
            ));
        }
        if eps <= 0.0 {
            return Err(SocNetError::ConfigurationError(
                "Adam epsilon must be positive".to_string(),
            ));
        }
        Ok(Adam {
            beta1,
            beta2,
            eps,
            state: HashMap::new(),
        })
    }

    pub fn default_params() -> Result<Self, SocNetError> {
        Adam::new(0.9, 0.999, 1e-8)
    }
}

impl BaseRule for Adam {
    fn delta(&mut self, key: usize, grad: &[f32], lr: f32, t: u64) -> Vec<f32> {
        let state = self.state.entry(key).or_insert_with(|| AdamState {
            m: vec![0.0; grad.len()],
            v: vec![0.0; grad.len()],
        });
        let bias1 = 1.0 - self.beta1.powi(t as i32);
        let bias2 = 1.0 - self.beta2.powi(t as i32);
        let mut delta = Vec::with_capacity(grad.len());
        for (i, &g) in grad.iter().enumerate() {
            state.m[i] = self.beta1 * state.m[i] + (1.0 - self.beta1) * g;
            state.v[i] = self.beta2 * state.v[i] + (1.0 - self.beta2) * g * g;
            let m_hat = state.m[i] / bias1;
            let v_hat = state.v[i] / bias2;
            delta.push(lr * m_hat / (v_hat.sqrt() + self.eps));
        }
        delta
    }

    fn name(&self) -> &'static str {
        "adam"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_bad_hyperparameters() {
        assert!(Adam::new(1.0, 0.999, 1e-8).is_err());
        assert!(Adam::new(0.9, -0.1, 1e-8).is_err());
        assert!(Adam::new(0.9, 0.999, 0.0).is_err());
    }

    #[test]
    fn first_step_matches_hand_computation() {
        let mut adam = Adam::new(0.9, 0.999, 1e-8).unwrap();
        let delta = adam.delta(1, &[0.5], 0.01, 1);
        // m_hat = g, v_hat = g^2, so the first step is lr * sign-ish update
        let expected = 0.01 * 0.5 / (0.5_f32 + 1e-8);
        assert_relative_eq!(delta[0], expected, epsilon = 1e-6);
    }

    #[test]
    fn state_is_per_parameter_and_carries_momentum() {
        let mut adam = Adam::default_params().unwrap();
        let a1 = adam.delta(1, &[1.0], 0.1, 1);
        let b1 = adam.delta(2, &[1.0], 0.1, 1);
        assert_eq!(a1, b1);
        // zero gradient still moves because of the first moment
        let a2 = adam.delta(1, &[0.0], 0.1, 2);
        assert!(a2[0] > 0.0);
        assert_ne!(a1, a2);
    }
}
