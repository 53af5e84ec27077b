use crate::base::BaseRule;
use socnet_core::SocNetError;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
struct AdadeltaState {
    avg_sq_grad: Vec<f32>,
    avg_sq_delta: Vec<f32>,
}

/// Adadelta: the step size adapts from the ratio of accumulated deltas to
/// accumulated gradients, `lr` acting as a final scaling factor.
#[derive(Debug)]
pub struct Adadelta {
    rho: f32,
    eps: f32,
    state: HashMap<usize, AdadeltaState>,
}

impl Adadelta {
    pub fn new(rho: f32, eps: f32) -> Result<Self, SocNetError> {
        if !(0.0..1.0).contains(&rho) {
            return Err(SocNetError::ConfigurationError(
                "Adadelta rho must be in [0, 1)".to_string(),
            ));
        }
        if eps <= 0.0 {
            return Err(SocNetError::ConfigurationError(
                "Adadelta epsilon must be positive".to_string(),
            ));
        }
        Ok(Adadelta {
            rho,
            eps,
            state: HashMap::new(),
        })
    }

    pub fn default_params() -> Result<Self, SocNetError> {
        Adadelta::new(0.95, 1e-6)
    }
}

impl BaseRule for Adadelta {
    fn delta(&mut self, key: usize, grad: &[f32], lr: f32, _t: u64) -> Vec<f32> {
        let state = self.state.entry(key).or_insert_with(|| AdadeltaState {
            avg_sq_grad: vec![0.0; grad.len()],
            avg_sq_delta: vec![0.0; grad.len()],
        });
        let mut delta = Vec::with_capacity(grad.len());
        for (i, &g) in grad.iter().enumerate() {
            state.avg_sq_grad[i] = self.rho * state.avg_sq_grad[i] + (1.0 - self.rho) * g * g;
            let step = ((state.avg_sq_delta[i] + self.eps) / (state.avg_sq_grad[i] + self.eps))
                .sqrt()
                * g;
            state.avg_sq_delta[i] = self.rho * state.avg_sq_delta[i] + (1.0 - self.rho) * step * step;
            delta.push(lr * step);
        }
        delta
    }

    fn name(&self) -> &'static str {
        "adadelta"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_bad_hyperparameters() {
        assert!(Adadelta::new(-0.1, 1e-6).is_err());
        assert!(Adadelta::new(0.95, 0.0).is_err());
    }

    #[test]
    fn first_step_matches_hand_computation() {
        let mut rule = Adadelta::new(0.95, 1e-6).unwrap();
        let delta = rule.delta(0, &[1.0], 1.0, 1);
        let avg_sq = 0.05_f32;
        let expected = (1e-6_f32 / (avg_sq + 1e-6)).sqrt();
        assert_relative_eq!(delta[0], expected, epsilon = 1e-6);
    }

    #[test]
    fn lr_scales_output() {
        let mut a = Adadelta::default_params().unwrap();
        let mut b = Adadelta::default_params().unwrap();
        let da = a.delta(0, &[1.0], 1.0, 1);
        let db = b.delta(0, &[1.0], 0.5, 1);
        assert_relative_eq!(db[0], 0.5 * da[0], epsilon = 1e-6);
    }
}
