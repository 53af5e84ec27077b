use crate::control::ControlProvider;
use rand::rngs::StdRng;
use socnet_core::ops::arithmetic::{add_op, mul_op, mul_scalar_op};
use socnet_core::ops::view::cat_cols_op;
use socnet_core::tensor::create;
use socnet_core::{SocNetError, Tensor};

/// How a state variable's Brownian increment relates to the others.
///
/// `SameAs(j)` reuses the increment drawn for state variable `j`, which must
/// come earlier in the state list and have the same dimension. Hedging needs
/// this: the gains process is driven by the same noise as the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseCoupling {
    Own,
    SameAs(usize),
}

/// A controlled stochastic differential equation.
///
/// States are kept as a list of tensors, one per named state variable (e.g.
/// price and gains for hedging), each of shape `(batch, dim)`. Every method
/// must return tensors built from the differentiable ops so gradients flow
/// back through the rollout.
pub trait ControlledSde: std::fmt::Debug + Send + Sync {
    /// Dimension of each state variable, in order.
    fn state_dims(&self) -> Vec<usize>;

    /// Width of the control action tensor.
    fn action_dim(&self) -> usize;

    /// Drift coefficients, one tensor per state variable.
    fn drift(
        &self,
        states: &[Tensor],
        control: &Tensor,
        t: f32,
    ) -> Result<Vec<Tensor>, SocNetError>;

    /// Diffusion coefficients, one tensor per state variable.
    fn diffusion(
        &self,
        states: &[Tensor],
        control: &Tensor,
        t: f32,
    ) -> Result<Vec<Tensor>, SocNetError>;

    /// Per-step cost `(batch, 1)`, or `None` when the problem has only a
    /// terminal cost. `prev_control` is `None` on the first step; problems
    /// with transaction costs charge the initial position against it.
    fn running_cost(
        &self,
        _states: &[Tensor],
        _control: &Tensor,
        _prev_control: Option<&Tensor>,
        _t: f32,
        _dt: f32,
    ) -> Result<Option<Tensor>, SocNetError> {
        Ok(None)
    }

    /// Cost evaluated on the final states, `(batch, 1)`.
    fn terminal_cost(&self, states: &[Tensor]) -> Result<Tensor, SocNetError>;

    /// Extra `(batch, 1)` columns appended to the loss for inspection; they
    /// never drive gradients.
    fn diagnostics(&self, _states: &[Tensor]) -> Result<Vec<Tensor>, SocNetError> {
        Ok(Vec::new())
    }

    /// Noise coupling per state variable; independent increments by default.
    fn noise_coupling(&self) -> Vec<NoiseCoupling> {
        self.state_dims().iter().map(|_| NoiseCoupling::Own).collect()
    }
}

/// One recorded point of a rollout: the first batch element's states, the
/// control applied there (`None` on the terminal point) and the SDE's
/// diagnostic values at those states.
#[derive(Debug, Clone)]
pub struct TrajectoryPoint {
    pub t: f32,
    pub states: Vec<Vec<f32>>,
    pub control: Option<Vec<f32>>,
    pub diagnostics: Vec<f32>,
}

/// Result of one differentiable rollout.
#[derive(Debug)]
pub struct Rollout {
    /// `(batch, R)` loss; column 0 drives gradients, the rest are
    /// diagnostics.
    pub loss: Tensor,
    /// `n_euler + 1` points following the first batch element.
    pub trajectory: Vec<TrajectoryPoint>,
}

/// Euler–Maruyama rollout engine with a fixed horizon and step count.
#[derive(Debug, Clone, Copy)]
pub struct Simulator {
    horizon: f32,
    n_euler: usize,
}

impl Simulator {
    pub fn new(horizon: f32, n_euler: usize) -> Result<Self, SocNetError> {
        if !(horizon > 0.0) {
            return Err(SocNetError::ConfigurationError(format!(
                "horizon must be positive, got {}",
                horizon
            )));
        }
        if n_euler == 0 {
            return Err(SocNetError::ConfigurationError(
                "n_euler must be positive".to_string(),
            ));
        }
        Ok(Simulator { horizon, n_euler })
    }

    pub fn horizon(&self) -> f32 {
        self.horizon
    }

    pub fn n_euler(&self) -> usize {
        self.n_euler
    }

    pub fn dt(&self) -> f32 {
        self.horizon / self.n_euler as f32
    }

    /// Unrolls the SDE from `x0`, querying `provider` for the control at each
    /// step. All Brownian increments come from `rng`, so a seeded rng makes
    /// the rollout deterministic.
    pub fn rollout(
        &self,
        sde: &dyn ControlledSde,
        provider: &ControlProvider,
        x0: &[Tensor],
        rng: &mut StdRng,
    ) -> Result<Rollout, SocNetError> {
        let dims = sde.state_dims();
        if x0.len() != dims.len() {
            return Err(SocNetError::DimensionMismatch {
                expected: dims.len(),
                actual: x0.len(),
            });
        }
        let batch = x0
            .first()
            .map(|t| t.shape().first().copied().unwrap_or(0))
            .unwrap_or(0);
        for (tensor, &dim) in x0.iter().zip(&dims) {
            let shape = tensor.shape();
            if shape != [batch, dim] {
                return Err(SocNetError::ShapeMismatch {
                    expected: vec![batch, dim],
                    actual: shape,
                    operation: "Simulator::rollout".to_string(),
                });
            }
        }
        let coupling = sde.noise_coupling();
        if coupling.len() != dims.len() {
            return Err(SocNetError::DimensionMismatch {
                expected: dims.len(),
                actual: coupling.len(),
            });
        }

        let dt = self.dt();
        let sqrt_dt = dt.sqrt();
        let mut states: Vec<Tensor> = x0.to_vec();
        let mut trajectory = Vec::with_capacity(self.n_euler + 1);
        let mut accumulated: Option<Tensor> = None;
        let mut prev_control: Option<Tensor> = None;

        for step in 0..self.n_euler {
            let t = step as f32 * dt;
            let control = provider.control(step, t, &states)?;
            let step_diags = sde.diagnostics(&states)?;
            trajectory.push(record_point(t, &states, Some(&control), &step_diags));

            if let Some(cost) =
                sde.running_cost(&states, &control, prev_control.as_ref(), t, dt)?
            {
                accumulated = Some(match accumulated {
                    Some(acc) => add_op(&acc, &cost)?,
                    None => cost,
                });
            }

            let drift = sde.drift(&states, &control, t)?;
            let diffusion = sde.diffusion(&states, &control, t)?;
            if drift.len() != dims.len() || diffusion.len() != dims.len() {
                return Err(SocNetError::DimensionMismatch {
                    expected: dims.len(),
                    actual: drift.len().min(diffusion.len()),
                });
            }

            let mut increments: Vec<Tensor> = Vec::with_capacity(dims.len());
            for (v, &dim) in dims.iter().enumerate() {
                let xi = match coupling[v] {
                    NoiseCoupling::Own => create::randn_with(&[batch, dim], rng)?,
                    NoiseCoupling::SameAs(j) => {
                        if j >= v || dims[j] != dim {
                            return Err(SocNetError::ConfigurationError(format!(
                                "noise coupling of state {} refers to incompatible state {}",
                                v, j
                            )));
                        }
                        increments[j].clone()
                    }
                };
                increments.push(xi);
            }

            let mut next_states = Vec::with_capacity(dims.len());
            for v in 0..dims.len() {
                let drift_term = mul_scalar_op(&drift[v], dt)?;
                let noise_term =
                    mul_scalar_op(&mul_op(&diffusion[v], &increments[v])?, sqrt_dt)?;
                let next = add_op(&add_op(&states[v], &drift_term)?, &noise_term)?;
                next_states.push(next);
            }
            states = next_states;
            prev_control = Some(control);
        }

        let diagnostics = sde.diagnostics(&states)?;
        trajectory.push(record_point(self.horizon, &states, None, &diagnostics));

        let terminal = sde.terminal_cost(&states)?;
        let total = match accumulated {
            Some(acc) => add_op(&acc, &terminal)?,
            None => terminal,
        };
        let loss = if diagnostics.is_empty() {
            total
        } else {
            let mut columns = vec![total];
            columns.extend(diagnostics);
            cat_cols_op(&columns)?
        };

        Ok(Rollout { loss, trajectory })
    }
}

fn record_point(
    t: f32,
    states: &[Tensor],
    control: Option<&Tensor>,
    diagnostics: &[Tensor],
) -> TrajectoryPoint {
    TrajectoryPoint {
        t,
        states: states.iter().map(first_row).collect(),
        control: control.map(first_row),
        diagnostics: diagnostics
            .iter()
            .flat_map(|d| first_row(d))
            .collect(),
    }
}

fn first_row(tensor: &Tensor) -> Vec<f32> {
    let shape = tensor.shape();
    let cols = shape.get(1).copied().unwrap_or(1);
    let data = tensor.get_data();
    data.into_iter().take(cols).collect()
}
