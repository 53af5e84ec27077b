use crate::base::BaseRule;
use socnet_core::SocNetError;
use std::collections::HashMap;

/// RMSProp: running average of squared gradients.
#[derive(Debug)]
pub struct RmsProp {
    rho: f32,
    eps: f32,
    state: HashMap<usize, Vec<f32>>,
}

impl RmsProp {
    pub fn new(rho: f32, eps: f32) -> Result<Self, SocNetError> {
        if !(0.0..1.0).contains(&rho) {
            return Err(SocNetError::ConfigurationError(
                "RMSProp rho must be in [0, 1)".to_string(),
            ));
        }
        if eps <= 0.0 {
            return Err(SocNetError::ConfigurationError(
                "RMSProp epsilon must be positive".to_string(),
            ));
        }
        Ok(RmsProp {
            rho,
            eps,
            state: HashMap::new(),
        })
    }

    pub fn default_params() -> Result<Self, SocNetError> {
        RmsProp::new(0.9, 1e-8)
    }
}

impl BaseRule for RmsProp {
    fn delta(&mut self, key: usize, grad: &[f32], lr: f32, _t: u64) -> Vec<f32> {
        let avg = self
            .state
            .entry(key)
            .or_insert_with(|| vec![0.0; grad.len()]);
        let mut delta = Vec::with_capacity(grad.len());
        for (i, &g) in grad.iter().enumerate() {
            avg[i] = self.rho * avg[i] + (1.0 - self.rho) * g * g;
            delta.push(lr * g / (avg[i].sqrt() + self.eps));
        }
        delta
    }

    fn name(&self) -> &'static str {
        "rmsprop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_bad_hyperparameters() {
        assert!(RmsProp::new(1.0, 1e-8).is_err());
        assert!(RmsProp::new(0.9, 0.0).is_err());
    }

    #[test]
    fn first_step_matches_hand_computation() {
        let mut rule = RmsProp::new(0.9, 1e-8).unwrap();
        let delta = rule.delta(0, &[2.0], 0.01, 1);
        // avg = 0.1 * 4 = 0.4
        let expected = 0.01 * 2.0 / (0.4_f32.sqrt() + 1e-8);
        assert_relative_eq!(delta[0], expected, epsilon = 1e-6);
    }

    #[test]
    fn average_decays_over_steps() {
        let mut rule = RmsProp::new(0.9, 1e-8).unwrap();
        let d1 = rule.delta(0, &[1.0], 0.1, 1);
        let d2 = rule.delta(0, &[1.0], 0.1, 2);
        // accumulator grows, so the step shrinks
        assert!(d2[0] < d1[0]);
    }
}
