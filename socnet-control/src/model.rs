use crate::control::ControlProvider;
use crate::simulator::{ControlledSde, Rollout, Simulator};
use rand::rngs::StdRng;
use socnet_core::nn::SharedParam;
use socnet_core::ops::reduction::mean_op;
use socnet_core::ops::view::slice_cols_op;
use socnet_core::{SocNetError, Tensor};

/// A trainable control problem: dynamics, control networks and rollout
/// configuration bundled together.
#[derive(Debug)]
pub struct SocModel {
    sde: Box<dyn ControlledSde>,
    provider: ControlProvider,
    simulator: Simulator,
}

impl SocModel {
    pub fn new(
        sde: Box<dyn ControlledSde>,
        provider: ControlProvider,
        simulator: Simulator,
    ) -> Result<Self, SocNetError> {
        if let Some(steps) = provider.num_steps() {
            if steps != simulator.n_euler() {
                return Err(SocNetError::ConfigurationError(format!(
                    "per-step control has {} networks but the rollout takes {} steps",
                    steps,
                    simulator.n_euler()
                )));
            }
        }
        Ok(SocModel {
            sde,
            provider,
            simulator,
        })
    }

    /// One differentiable rollout from the initial state batch.
    pub fn forward(&self, x0: &[Tensor], rng: &mut StdRng) -> Result<Rollout, SocNetError> {
        self.simulator.rollout(self.sde.as_ref(), &self.provider, x0, rng)
    }

    /// Scalar training objective: mean of the loss's first column. The
    /// diagnostic columns stay out of the gradient.
    pub fn objective(loss: &Tensor) -> Result<Tensor, SocNetError> {
        let primary = slice_cols_op(loss, 0, 1)?;
        mean_op(&primary)
    }

    pub fn parameters(&self) -> Vec<SharedParam> {
        self.provider.parameters()
    }

    pub fn layer_parameters(&self) -> Result<Vec<Vec<SharedParam>>, SocNetError> {
        self.provider.layer_parameters()
    }

    pub fn provider(&self) -> &ControlProvider {
        &self.provider
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }
}

/// Builds a fresh model instance; each compared optimizer trains its own
/// build from the same rng seed, so all start from identical weights.
pub trait ModelBuilder: Send + Sync {
    fn build(&self, rng: &mut StdRng) -> Result<SocModel, SocNetError>;
}
