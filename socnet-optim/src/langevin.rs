use crate::base::BaseRule;
use crate::optimizer::Optimizer;
use crate::schedule::Schedule;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use socnet_core::nn::{param_key, SharedParam};
use socnet_core::SocNetError;
use std::collections::HashSet;

/// Which parameters receive Langevin noise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoiseScope {
    /// Every parameter.
    All,
    /// Only the parameters of the listed layer indices. Requires a call to
    /// [`Langevin::bind_layers`] once the model is built.
    Layers(HashSet<usize>),
}

#[derive(Debug)]
enum Binding {
    Uniform,
    Pending(HashSet<usize>),
    Bound(HashSet<usize>),
}

/// Langevin-noise wrapper around a classical update rule.
///
/// Each step applies `p ← p − Δ_base + ε` with `ε ~ N(0, σ(t)²)` drawn per
/// eligible parameter element. When `σ(t)` is exactly zero no draw happens,
/// so the trajectory is bit-identical to the plain base rule and the rng
/// stream is left untouched.
pub struct Langevin {
    params: Vec<SharedParam>,
    rule: Box<dyn BaseRule>,
    lr: Schedule,
    sigma: Schedule,
    binding: Binding,
    rng: StdRng,
    t: u64,
}

impl std::fmt::Debug for Langevin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Langevin")
            .field("rule", &self.rule)
            .field("lr", &self.lr)
            .field("sigma", &self.sigma)
            .field("binding", &self.binding)
            .field("t", &self.t)
            .finish()
    }
}

impl Langevin {
    pub fn new(
        params: Vec<SharedParam>,
        rule: Box<dyn BaseRule>,
        lr: impl Into<Schedule>,
        sigma: impl Into<Schedule>,
        scope: NoiseScope,
        seed: u64,
    ) -> Result<Self, SocNetError> {
        if params.is_empty() {
            return Err(SocNetError::ConfigurationError(
                "Langevin optimizer needs at least one parameter".to_string(),
            ));
        }
        let binding = match scope {
            NoiseScope::All => Binding::Uniform,
            NoiseScope::Layers(layers) => Binding::Pending(layers),
        };
        Ok(Langevin {
            params,
            rule,
            lr: lr.into(),
            sigma: sigma.into(),
            binding,
            rng: StdRng::seed_from_u64(seed),
            t: 0,
        })
    }

    /// True until [`bind_layers`](Langevin::bind_layers) resolves a
    /// layer-selective scope; always false for `NoiseScope::All`.
    pub fn needs_binding(&self) -> bool {
        matches!(self.binding, Binding::Pending(_))
    }

    pub fn rule_name(&self) -> &'static str {
        self.rule.name()
    }

    pub fn step_count(&self) -> u64 {
        self.t
    }

    /// Resolves a layer-selective scope against the built model.
    ///
    /// `layer_groups[i]` holds the parameters of layer `i`. An eligible index
    /// outside `0..layer_groups.len()` is a configuration error; calling this
    /// on a uniform scope is one too.
    pub fn bind_layers(&mut self, layer_groups: &[Vec<SharedParam>]) -> Result<(), SocNetError> {
        let layers = match &self.binding {
            Binding::Pending(layers) | Binding::Bound(layers) => {
                // rebinding with the same scope is allowed (fresh model build)
                layers.clone()
            }
            Binding::Uniform => {
                return Err(SocNetError::ConfigurationError(
                    "bind_layers called on a uniform noise scope".to_string(),
                ));
            }
        };
        let mut keys = HashSet::new();
        for &layer in &layers {
            let group = layer_groups.get(layer).ok_or_else(|| {
                SocNetError::ConfigurationError(format!(
                    "noise layer index {} out of range (model has {} layers)",
                    layer,
                    layer_groups.len()
                ))
            })?;
            for param in group {
                keys.insert(param_key(param));
            }
        }
        log::debug!(
            "bound langevin noise to {} parameters across layers {:?}",
            keys.len(),
            layers
        );
        self.binding = Binding::Bound(keys);
        Ok(())
    }

    fn noise_eligible(&self, key: usize) -> bool {
        match &self.binding {
            Binding::Uniform => true,
            Binding::Bound(keys) => keys.contains(&key),
            Binding::Pending(_) => false,
        }
    }
}

impl Optimizer for Langevin {
    fn step(&mut self) -> Result<(), SocNetError> {
        if self.needs_binding() {
            return Err(SocNetError::UnboundLayerNoise);
        }
        self.t += 1;
        let lr = self.lr.at(self.t);
        let sigma = self.sigma.at(self.t);
        if sigma < 0.0 {
            return Err(SocNetError::ConfigurationError(format!(
                "noise scale must be non-negative, got {} at step {}",
                sigma, self.t
            )));
        }
        let normal = if sigma > 0.0 {
            Some(Normal::new(0.0_f32, sigma).map_err(|e| {
                SocNetError::ConfigurationError(format!("invalid noise scale: {}", e))
            })?)
        } else {
            None
        };

        for param_arc in &self.params {
            let key = param_key(param_arc);
            let grad = {
                let guard = param_arc.read().map_err(|_| {
                    SocNetError::InternalError("parameter lock poisoned".to_string())
                })?;
                match guard.grad() {
                    Some(g) => g.get_data(),
                    None => continue,
                }
            };
            let delta = self.rule.delta(key, &grad, lr, self.t);
            let mut guard = param_arc.write().map_err(|_| {
                SocNetError::InternalError("parameter lock poisoned".to_string())
            })?;
            let mut values = guard.data();
            for (value, d) in values.iter_mut().zip(&delta) {
                *value -= d;
            }
            if let Some(normal) = &normal {
                if self.noise_eligible(key) {
                    for value in values.iter_mut() {
                        *value += normal.sample(&mut self.rng);
                    }
                }
            }
            guard.set_data(values)?;
        }
        Ok(())
    }

    fn zero_grad(&mut self) -> Result<(), SocNetError> {
        for param_arc in &self.params {
            let mut guard = param_arc.write().map_err(|_| {
                SocNetError::InternalError("parameter lock poisoned".to_string())
            })?;
            guard.zero_grad();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adam::Adam;
    use crate::sgd::Sgd;
    use socnet_core::nn::Parameter;
    use socnet_core::Tensor;

    fn param_with_grad(values: Vec<f32>, grad: Vec<f32>) -> SharedParam {
        let shape = vec![values.len()];
        let p = Parameter::shared(Tensor::new(values, shape.clone()).unwrap(), "p");
        let g = Tensor::new(grad, shape).unwrap();
        p.read().unwrap().tensor.acc_grad(g).unwrap();
        p
    }

    #[test]
    fn empty_params_rejected() {
        let result = Langevin::new(
            vec![],
            Box::new(Sgd::plain()),
            0.1,
            0.0,
            NoiseScope::All,
            0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn zero_sigma_matches_base_rule_exactly() {
        let p = param_with_grad(vec![1.0, 2.0], vec![0.5, -0.5]);
        let mut opt = Langevin::new(
            vec![p.clone()],
            Box::new(Adam::new(0.9, 0.999, 1e-8).unwrap()),
            0.01,
            0.0,
            NoiseScope::All,
            7,
        )
        .unwrap();
        opt.step().unwrap();

        let mut reference = Adam::new(0.9, 0.999, 1e-8).unwrap();
        let delta = reference.delta(0, &[0.5, -0.5], 0.01, 1);
        let updated = p.read().unwrap().data();
        assert_eq!(updated, vec![1.0 - delta[0], 2.0 - delta[1]]);
    }

    #[test]
    fn noisy_steps_are_reproducible_per_seed() {
        let run = |seed: u64| {
            let p = param_with_grad(vec![0.0], vec![1.0]);
            let mut opt = Langevin::new(
                vec![p.clone()],
                Box::new(Sgd::plain()),
                0.1,
                0.5,
                NoiseScope::All,
                seed,
            )
            .unwrap();
            opt.step().unwrap();
            let value = p.read().unwrap().data()[0];
            value
        };
        assert_eq!(run(3), run(3));
        assert_ne!(run(3), run(4));
    }

    #[test]
    fn layer_selective_noise_spares_excluded_layers() {
        let p0 = param_with_grad(vec![1.0], vec![1.0]);
        let p1 = param_with_grad(vec![1.0], vec![1.0]);
        let scope = NoiseScope::Layers(HashSet::from([1]));
        let mut opt = Langevin::new(
            vec![p0.clone(), p1.clone()],
            Box::new(Sgd::plain()),
            0.1,
            5.0,
            scope,
            11,
        )
        .unwrap();
        opt.bind_layers(&[vec![p0.clone()], vec![p1.clone()]]).unwrap();
        opt.step().unwrap();
        // layer 0 gets the clean SGD update, layer 1 is perturbed
        assert_eq!(p0.read().unwrap().data(), vec![1.0 - 0.1]);
        assert_ne!(p1.read().unwrap().data(), vec![1.0 - 0.1]);
    }

    #[test]
    fn step_before_binding_fails_fast() {
        let p = param_with_grad(vec![1.0], vec![1.0]);
        let scope = NoiseScope::Layers(HashSet::from([0]));
        let mut opt = Langevin::new(
            vec![p],
            Box::new(Sgd::plain()),
            0.1,
            1.0,
            scope,
            0,
        )
        .unwrap();
        assert!(matches!(opt.step(), Err(SocNetError::UnboundLayerNoise)));
    }

    #[test]
    fn bind_rejects_out_of_range_layer() {
        let p = param_with_grad(vec![1.0], vec![1.0]);
        let scope = NoiseScope::Layers(HashSet::from([2]));
        let mut opt = Langevin::new(
            vec![p.clone()],
            Box::new(Sgd::plain()),
            0.1,
            1.0,
            scope,
            0,
        )
        .unwrap();
        assert!(opt.bind_layers(&[vec![p]]).is_err());
    }

    #[test]
    fn schedules_follow_step_count() {
        let p = param_with_grad(vec![0.0], vec![1.0]);
        let lr = Schedule::step_fn(|t| t as f32);
        let mut opt = Langevin::new(
            vec![p.clone()],
            Box::new(Sgd::plain()),
            lr,
            0.0,
            NoiseScope::All,
            0,
        )
        .unwrap();
        opt.step().unwrap();
        // first step runs with t = 1, so lr = 1.0
        assert_eq!(p.read().unwrap().data(), vec![-1.0]);
        assert_eq!(opt.step_count(), 1);
    }

    #[test]
    fn zero_grad_clears_all_params() {
        let p = param_with_grad(vec![1.0], vec![1.0]);
        let mut opt = Langevin::new(
            vec![p.clone()],
            Box::new(Sgd::plain()),
            0.1,
            0.0,
            NoiseScope::All,
            0,
        )
        .unwrap();
        opt.zero_grad().unwrap();
        assert!(p.read().unwrap().grad().is_none());
    }
}
