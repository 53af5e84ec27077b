/// One classical update rule, stripped down to the delta computation.
///
/// The [`Langevin`](crate::Langevin) wrapper owns the parameters, the
/// schedules and the noise; a `BaseRule` only turns a gradient into the
/// deterministic part of the update, maintaining whatever per-parameter
/// accumulators it needs. State is keyed by the parameter's `Arc` address
/// (`param_key`), which is stable for the lifetime of the model.
pub trait BaseRule: std::fmt::Debug + Send {
    /// Computes the update delta for one parameter: the new value is
    /// `p - delta`. `t` is the 1-based global step count, shared across all
    /// parameters of the same optimizer (Adam's bias correction needs it).
    fn delta(&mut self, key: usize, grad: &[f32], lr: f32, t: u64) -> Vec<f32>;

    /// Short rule name used in logs and CSV file names.
    fn name(&self) -> &'static str;
}

/// Serializable description of a base rule, used by experiment configs to
/// build a fresh rule (with empty accumulators) for every training run.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseRuleKind {
    Adam { beta1: f32, beta2: f32, eps: f32 },
    RmsProp { rho: f32, eps: f32 },
    Adadelta { rho: f32, eps: f32 },
    Sgd { momentum: f32 },
}

impl BaseRuleKind {
    pub fn adam() -> Self {
        BaseRuleKind::Adam {
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        }
    }

    pub fn rmsprop() -> Self {
        BaseRuleKind::RmsProp { rho: 0.9, eps: 1e-8 }
    }

    pub fn adadelta() -> Self {
        BaseRuleKind::Adadelta { rho: 0.95, eps: 1e-6 }
    }

    pub fn sgd(momentum: f32) -> Self {
        BaseRuleKind::Sgd { momentum }
    }

    pub fn build(&self) -> Result<Box<dyn BaseRule>, socnet_core::SocNetError> {
        Ok(match *self {
            BaseRuleKind::Adam { beta1, beta2, eps } => {
                Box::new(crate::adam::Adam::new(beta1, beta2, eps)?)
            }
            BaseRuleKind::RmsProp { rho, eps } => Box::new(crate::rmsprop::RmsProp::new(rho, eps)?),
            BaseRuleKind::Adadelta { rho, eps } => {
                Box::new(crate::adadelta::Adadelta::new(rho, eps)?)
            }
            BaseRuleKind::Sgd { momentum } => Box::new(crate::sgd::Sgd::new(momentum)?),
        })
    }
}
