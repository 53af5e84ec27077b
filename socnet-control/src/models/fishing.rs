use crate::model::{ModelBuilder, SocModel};
use crate::models::build_provider;
use crate::simulator::{ControlledSde, Simulator};
use rand::rngs::StdRng;
use socnet_core::ops::arithmetic::{add_op, add_scalar_op, mul_op, mul_scalar_op, neg_op, square_op};
use socnet_core::ops::linalg::matmul_op;
use socnet_core::ops::reduction::sum_rows_op;
use socnet_core::{SocNetError, Tensor};

/// Fishing-quota problem.
///
/// Biomass of `dim` interacting species follows logistic dynamics,
/// `dX = X (r − A X − u_max u) dt + σ X dW`, with the harvest rate `u` in
/// `(0, 1)` from the control net. Harvest revenue enters the running cost
/// with a negative sign; the terminal cost penalizes the squared distance to
/// a target biomass.
#[derive(Debug)]
pub struct Fishing {
    dim: usize,
    growth: f32,
    // A^T, stored ready for `x @ A^T`
    interaction_t: Tensor,
    sigma: f32,
    u_max: f32,
    price: f32,
    target: f32,
    terminal_weight: f32,
}

impl Fishing {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dim: usize,
        growth: f32,
        interaction: Vec<f32>,
        sigma: f32,
        u_max: f32,
        price: f32,
        target: f32,
        terminal_weight: f32,
    ) -> Result<Self, SocNetError> {
        if dim == 0 {
            return Err(SocNetError::ConfigurationError(
                "Fishing dim must be positive".to_string(),
            ));
        }
        if interaction.len() != dim * dim {
            return Err(SocNetError::DimensionMismatch {
                expected: dim * dim,
                actual: interaction.len(),
            });
        }
        let mut transposed = vec![0.0; dim * dim];
        for i in 0..dim {
            for j in 0..dim {
                transposed[j * dim + i] = interaction[i * dim + j];
            }
        }
        let interaction_t = Tensor::new(transposed, vec![dim, dim])?;
        Ok(Fishing {
            dim,
            growth,
            interaction_t,
            sigma,
            u_max,
            price,
            target,
            terminal_weight,
        })
    }

    fn effective_harvest(&self, control: &Tensor) -> Result<Tensor, SocNetError> {
        mul_scalar_op(control, self.u_max)
    }
}

impl ControlledSde for Fishing {
    fn state_dims(&self) -> Vec<usize> {
        vec![self.dim]
    }

    fn action_dim(&self) -> usize {
        self.dim
    }

    fn drift(
        &self,
        states: &[Tensor],
        control: &Tensor,
        _t: f32,
    ) -> Result<Vec<Tensor>, SocNetError> {
        let x = &states[0];
        let pressure = add_op(
            &matmul_op(x, &self.interaction_t)?,
            &self.effective_harvest(control)?,
        )?;
        let net_growth = add_scalar_op(&neg_op(&pressure)?, self.growth)?;
        Ok(vec![mul_op(x, &net_growth)?])
    }

    fn diffusion(
        &self,
        states: &[Tensor],
        _control: &Tensor,
        _t: f32,
    ) -> Result<Vec<Tensor>, SocNetError> {
        Ok(vec![mul_scalar_op(&states[0], self.sigma)?])
    }

    fn running_cost(
        &self,
        states: &[Tensor],
        control: &Tensor,
        _prev_control: Option<&Tensor>,
        _t: f32,
        dt: f32,
    ) -> Result<Option<Tensor>, SocNetError> {
        let harvested = mul_op(&self.effective_harvest(control)?, &states[0])?;
        let revenue = sum_rows_op(&harvested)?;
        Ok(Some(mul_scalar_op(&revenue, -self.price * dt)?))
    }

    fn terminal_cost(&self, states: &[Tensor]) -> Result<Tensor, SocNetError> {
        let deviation = add_scalar_op(&states[0], -self.target)?;
        let penalty = sum_rows_op(&square_op(&deviation)?)?;
        mul_scalar_op(&penalty, self.terminal_weight)
    }

    fn diagnostics(&self, states: &[Tensor]) -> Result<Vec<Tensor>, SocNetError> {
        // remaining total biomass
        Ok(vec![sum_rows_op(&states[0])?])
    }
}

/// Builds fishing models with sensible defaults; the interaction matrix
/// defaults to intra-species competition only (identity).
#[derive(Debug, Clone)]
pub struct FishingBuilder {
    pub dim: usize,
    pub horizon: f32,
    pub n_euler: usize,
    pub hidden: usize,
    pub multiple_ctrls: bool,
    pub growth: f32,
    pub interaction: Vec<f32>,
    pub sigma: f32,
    pub u_max: f32,
    pub price: f32,
    pub target: f32,
    pub terminal_weight: f32,
}

impl FishingBuilder {
    pub fn new(dim: usize, horizon: f32, n_euler: usize) -> Result<Self, SocNetError> {
        if dim == 0 {
            return Err(SocNetError::ConfigurationError(
                "FishingBuilder dim must be positive".to_string(),
            ));
        }
        let mut interaction = vec![0.0; dim * dim];
        for i in 0..dim {
            interaction[i * dim + i] = 1.0;
        }
        Ok(FishingBuilder {
            dim,
            horizon,
            n_euler,
            hidden: 32,
            multiple_ctrls: false,
            growth: 2.0,
            interaction,
            sigma: 0.1,
            u_max: 1.0,
            price: 1.0,
            target: 1.0,
            terminal_weight: 1.0,
        })
    }

    pub fn multiple_ctrls(mut self, enabled: bool) -> Self {
        self.multiple_ctrls = enabled;
        self
    }

    pub fn hidden(mut self, hidden: usize) -> Self {
        self.hidden = hidden;
        self
    }
}

impl ModelBuilder for FishingBuilder {
    fn build(&self, rng: &mut StdRng) -> Result<SocModel, SocNetError> {
        let sde = Fishing::new(
            self.dim,
            self.growth,
            self.interaction.clone(),
            self.sigma,
            self.u_max,
            self.price,
            self.target,
            self.terminal_weight,
        )?;
        let provider = build_provider(
            rng,
            self.dim,
            self.hidden,
            self.dim,
            true,
            self.n_euler,
            self.multiple_ctrls,
        )?;
        let simulator = Simulator::new(self.horizon, self.n_euler)?;
        SocModel::new(Box::new(sde), provider, simulator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use socnet_core::tensor::create;

    #[test]
    fn builder_rejects_zero_dim() {
        assert!(FishingBuilder::new(0, 1.0, 10).is_err());
    }

    #[test]
    fn forward_returns_loss_with_biomass_column() {
        let builder = FishingBuilder::new(2, 1.0, 4).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let model = builder.build(&mut rng).unwrap();
        let x0 = vec![create::full(&[3, 2], 1.0).unwrap()];
        let rollout = model.forward(&x0, &mut rng).unwrap();
        // cost column plus the remaining-biomass diagnostic
        assert_eq!(rollout.loss.shape(), vec![3, 2]);
        assert_eq!(rollout.trajectory.len(), 5);
    }

    #[test]
    fn per_step_variant_builds_one_net_per_step() {
        let builder = FishingBuilder::new(1, 1.0, 3).unwrap().multiple_ctrls(true);
        let mut rng = StdRng::seed_from_u64(1);
        let model = builder.build(&mut rng).unwrap();
        assert_eq!(model.provider().num_steps(), Some(3));
    }

    #[test]
    fn interaction_matrix_must_be_square() {
        assert!(Fishing::new(2, 2.0, vec![1.0; 3], 0.1, 1.0, 1.0, 1.0, 1.0).is_err());
    }
}
