//! Example control problems: instantiations of [`ControlledSde`] plus their
//! model builders. They exercise the library; nothing in the core depends on
//! them.
//!
//! [`ControlledSde`]: crate::simulator::ControlledSde

pub mod fishing;
pub mod hedging;
pub mod oil;

pub use fishing::{Fishing, FishingBuilder};
pub use hedging::{DeepHedging, DeepHedgingBuilder};
pub use oil::{OilDrilling, OilDrillingBuilder};

use rand::rngs::StdRng;
use socnet_core::nn::{Linear, Module, Sequential, Sigmoid, Tanh};
use socnet_core::SocNetError;

/// Two-hidden-layer tanh MLP used by all exemplar control networks.
pub(crate) fn control_net(
    rng: &mut StdRng,
    inputs: usize,
    hidden: usize,
    outputs: usize,
    bounded: bool,
) -> Result<Sequential, SocNetError> {
    let mut net = Sequential::new();
    net.add_module("fc1", Box::new(Linear::new(inputs, hidden, true, rng)?));
    net.add_module("act1", Box::new(Tanh));
    net.add_module("fc2", Box::new(Linear::new(hidden, hidden, true, rng)?));
    net.add_module("act2", Box::new(Tanh));
    net.add_module("out", Box::new(Linear::new(hidden, outputs, true, rng)?));
    if bounded {
        net.add_module("squash", Box::new(Sigmoid));
    }
    Ok(net)
}

/// Builds the provider for a problem: one shared net over `[t, state...]`,
/// or one net per Euler step when `multiple_ctrls` is set.
pub(crate) fn build_provider(
    rng: &mut StdRng,
    state_width: usize,
    hidden: usize,
    outputs: usize,
    bounded: bool,
    n_euler: usize,
    multiple_ctrls: bool,
) -> Result<crate::control::ControlProvider, SocNetError> {
    use crate::control::ControlProvider;
    if multiple_ctrls {
        let nets = (0..n_euler)
            .map(|_| control_net(rng, state_width, hidden, outputs, bounded))
            .collect::<Result<Vec<_>, _>>()?;
        ControlProvider::per_step(nets)
    } else {
        Ok(ControlProvider::shared(control_net(
            rng,
            state_width + 1,
            hidden,
            outputs,
            bounded,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use socnet_core::Tensor;

    #[test]
    fn control_net_shapes() {
        let mut rng = StdRng::seed_from_u64(0);
        let net = control_net(&mut rng, 3, 8, 2, true).unwrap();
        let x = Tensor::new(vec![0.0; 6], vec![2, 3]).unwrap();
        let y = net.forward(&x).unwrap();
        assert_eq!(y.shape(), vec![2, 2]);
        // sigmoid output stays in (0, 1)
        assert!(y.get_data().iter().all(|&v| v > 0.0 && v < 1.0));
        assert_eq!(net.num_layers(), 3);
    }
}
