use socnet_core::nn::{Module, Sequential, SharedParam};
use socnet_core::ops::view::cat_cols_op;
use socnet_core::tensor::create;
use socnet_core::{SocNetError, Tensor};

/// Supplies the control action at each Euler step.
///
/// `Shared` runs one network on `[t, state...]`; `PerStep` keeps one network
/// per step (time is implicit in which network runs). After training, the
/// underlying networks stay accessible through [`ControlProvider::shared_net`]
/// and [`ControlProvider::step_nets`].
#[derive(Debug)]
pub enum ControlProvider {
    Shared(Sequential),
    PerStep(Vec<Sequential>),
}

impl ControlProvider {
    pub fn shared(net: Sequential) -> Self {
        ControlProvider::Shared(net)
    }

    pub fn per_step(nets: Vec<Sequential>) -> Result<Self, SocNetError> {
        if nets.is_empty() {
            return Err(SocNetError::ConfigurationError(
                "per-step control needs at least one network".to_string(),
            ));
        }
        let layers = nets[0].num_layers();
        if nets.iter().any(|net| net.num_layers() != layers) {
            return Err(SocNetError::ConfigurationError(
                "per-step control networks must share the same layer structure".to_string(),
            ));
        }
        Ok(ControlProvider::PerStep(nets))
    }

    /// Number of per-step networks, `None` for the shared variant.
    pub fn num_steps(&self) -> Option<usize> {
        match self {
            ControlProvider::Shared(_) => None,
            ControlProvider::PerStep(nets) => Some(nets.len()),
        }
    }

    /// Control action for Euler step `step` at time `t`.
    pub fn control(&self, step: usize, t: f32, states: &[Tensor]) -> Result<Tensor, SocNetError> {
        if states.is_empty() {
            return Err(SocNetError::ConfigurationError(
                "control query needs at least one state tensor".to_string(),
            ));
        }
        let batch = states[0].shape().first().copied().unwrap_or(0);
        match self {
            ControlProvider::Shared(net) => {
                let time_col = create::full(&[batch, 1], t)?;
                let mut columns = vec![time_col];
                columns.extend(states.iter().cloned());
                let input = cat_cols_op(&columns)?;
                net.forward(&input)
            }
            ControlProvider::PerStep(nets) => {
                let net = nets.get(step).ok_or(SocNetError::IndexOutOfBounds {
                    index: step,
                    len: nets.len(),
                })?;
                let input = if states.len() == 1 {
                    states[0].clone()
                } else {
                    cat_cols_op(states)?
                };
                net.forward(&input)
            }
        }
    }

    pub fn parameters(&self) -> Vec<SharedParam> {
        match self {
            ControlProvider::Shared(net) => net.parameters(),
            ControlProvider::PerStep(nets) => {
                nets.iter().flat_map(Sequential::parameters).collect()
            }
        }
    }

    /// Parameters grouped by layer index, for layer-selective noise binding.
    ///
    /// For the per-step variant, layer `i` collects the `i`-th layer of every
    /// step network, so "noise on layer 0" means the first layer at all times.
    pub fn layer_parameters(&self) -> Result<Vec<Vec<SharedParam>>, SocNetError> {
        match self {
            ControlProvider::Shared(net) => (0..net.num_layers())
                .map(|i| net.layer_parameters(i))
                .collect(),
            ControlProvider::PerStep(nets) => {
                let layers = nets.first().map(Sequential::num_layers).unwrap_or(0);
                let mut groups = Vec::with_capacity(layers);
                for i in 0..layers {
                    let mut group = Vec::new();
                    for net in nets {
                        group.extend(net.layer_parameters(i)?);
                    }
                    groups.push(group);
                }
                Ok(groups)
            }
        }
    }

    pub fn shared_net(&self) -> Option<&Sequential> {
        match self {
            ControlProvider::Shared(net) => Some(net),
            ControlProvider::PerStep(_) => None,
        }
    }

    pub fn step_nets(&self) -> Option<&[Sequential]> {
        match self {
            ControlProvider::Shared(_) => None,
            ControlProvider::PerStep(nets) => Some(nets),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use socnet_core::nn::{Linear, Tanh};

    fn mlp(rng: &mut StdRng, inputs: usize, outputs: usize) -> Sequential {
        let mut net = Sequential::new();
        net.add_module("fc1", Box::new(Linear::new(inputs, 4, true, rng).unwrap()));
        net.add_module("act", Box::new(Tanh));
        net.add_module("fc2", Box::new(Linear::new(4, outputs, true, rng).unwrap()));
        net
    }

    #[test]
    fn shared_provider_prepends_time() {
        let mut rng = StdRng::seed_from_u64(2);
        // 2 state columns + 1 time column
        let provider = ControlProvider::shared(mlp(&mut rng, 3, 1));
        let state = Tensor::new(vec![0.5, 0.5, 1.0, 1.0], vec![2, 2]).unwrap();
        let u0 = provider.control(0, 0.0, &[state.clone()]).unwrap();
        let u1 = provider.control(0, 0.9, &[state]).unwrap();
        assert_eq!(u0.shape(), vec![2, 1]);
        // same state, different time, different action
        assert_ne!(u0.get_data(), u1.get_data());
    }

    #[test]
    fn per_step_provider_selects_by_index() {
        let mut rng = StdRng::seed_from_u64(3);
        let nets = vec![mlp(&mut rng, 2, 1), mlp(&mut rng, 2, 1)];
        let provider = ControlProvider::per_step(nets).unwrap();
        let state = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();
        let u0 = provider.control(0, 0.0, &[state.clone()]).unwrap();
        let u1 = provider.control(1, 0.5, &[state.clone()]).unwrap();
        assert_ne!(u0.get_data(), u1.get_data());
        assert!(provider.control(2, 1.0, &[state]).is_err());
        assert_eq!(provider.num_steps(), Some(2));
    }

    #[test]
    fn per_step_layer_groups_span_all_steps() {
        let mut rng = StdRng::seed_from_u64(4);
        let nets = vec![mlp(&mut rng, 2, 1), mlp(&mut rng, 2, 1), mlp(&mut rng, 2, 1)];
        let provider = ControlProvider::per_step(nets).unwrap();
        let groups = provider.layer_parameters().unwrap();
        assert_eq!(groups.len(), 2);
        // weight + bias per step network
        assert_eq!(groups[0].len(), 6);
        assert_eq!(provider.parameters().len(), 12);
    }

    #[test]
    fn mismatched_step_networks_rejected() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut shallow = Sequential::new();
        shallow.add_module(
            "fc",
            Box::new(Linear::new(2, 1, true, &mut rng).unwrap()),
        );
        assert!(ControlProvider::per_step(vec![mlp(&mut rng, 2, 1), shallow]).is_err());
        assert!(ControlProvider::per_step(vec![]).is_err());
    }
}
