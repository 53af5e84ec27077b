use crate::model::{ModelBuilder, SocModel};
use crate::models::build_provider;
use crate::simulator::{ControlledSde, NoiseCoupling, Simulator};
use rand::rngs::StdRng;
use socnet_core::ops::activation::relu_op;
use socnet_core::ops::arithmetic::{add_op, add_scalar_op, mul_op, mul_scalar_op, neg_op, square_op, sub_op};
use socnet_core::{SocNetError, Tensor};

/// Deep hedging of a European call on a single asset.
///
/// State variables: the price `S` (geometric Brownian motion) and the gains
/// process `G` with `dG = u dS`, driven by the same Brownian increment as the
/// price. Rebalancing pays a proportional transaction cost, charged in the
/// running cost (the first step charges the initial position). The terminal
/// cost is the squared hedging error against the call payoff; the realized
/// P&L `G − payoff` rides along as a diagnostic column.
#[derive(Debug)]
pub struct DeepHedging {
    mu: f32,
    sigma: f32,
    strike: f32,
    tx_cost: f32,
}

impl DeepHedging {
    pub fn new(mu: f32, sigma: f32, strike: f32, tx_cost: f32) -> Result<Self, SocNetError> {
        if sigma <= 0.0 {
            return Err(SocNetError::ConfigurationError(
                "DeepHedging volatility must be positive".to_string(),
            ));
        }
        if strike <= 0.0 {
            return Err(SocNetError::ConfigurationError(
                "DeepHedging strike must be positive".to_string(),
            ));
        }
        if tx_cost < 0.0 {
            return Err(SocNetError::ConfigurationError(
                "DeepHedging transaction cost must be non-negative".to_string(),
            ));
        }
        Ok(DeepHedging {
            mu,
            sigma,
            strike,
            tx_cost,
        })
    }

    fn payoff(&self, price: &Tensor) -> Result<Tensor, SocNetError> {
        relu_op(&add_scalar_op(price, -self.strike)?)
    }
}

fn abs(x: &Tensor) -> Result<Tensor, SocNetError> {
    add_op(&relu_op(x)?, &relu_op(&neg_op(x)?)?)
}

impl ControlledSde for DeepHedging {
    fn state_dims(&self) -> Vec<usize> {
        vec![1, 1]
    }

    fn action_dim(&self) -> usize {
        1
    }

    fn drift(
        &self,
        states: &[Tensor],
        control: &Tensor,
        _t: f32,
    ) -> Result<Vec<Tensor>, SocNetError> {
        let price_drift = mul_scalar_op(&states[0], self.mu)?;
        let gains_drift = mul_op(control, &price_drift)?;
        Ok(vec![price_drift, gains_drift])
    }

    fn diffusion(
        &self,
        states: &[Tensor],
        control: &Tensor,
        _t: f32,
    ) -> Result<Vec<Tensor>, SocNetError> {
        let price_diffusion = mul_scalar_op(&states[0], self.sigma)?;
        let gains_diffusion = mul_op(control, &price_diffusion)?;
        Ok(vec![price_diffusion, gains_diffusion])
    }

    fn running_cost(
        &self,
        states: &[Tensor],
        control: &Tensor,
        prev_control: Option<&Tensor>,
        _t: f32,
        _dt: f32,
    ) -> Result<Option<Tensor>, SocNetError> {
        if self.tx_cost == 0.0 {
            return Ok(None);
        }
        let traded = match prev_control {
            Some(prev) => abs(&sub_op(control, prev)?)?,
            None => abs(control)?,
        };
        let turnover = mul_op(&traded, &states[0])?;
        Ok(Some(mul_scalar_op(&turnover, self.tx_cost)?))
    }

    fn terminal_cost(&self, states: &[Tensor]) -> Result<Tensor, SocNetError> {
        let shortfall = sub_op(&self.payoff(&states[0])?, &states[1])?;
        square_op(&shortfall)
    }

    fn diagnostics(&self, states: &[Tensor]) -> Result<Vec<Tensor>, SocNetError> {
        Ok(vec![sub_op(&states[1], &self.payoff(&states[0])?)?])
    }

    fn noise_coupling(&self) -> Vec<NoiseCoupling> {
        vec![NoiseCoupling::Own, NoiseCoupling::SameAs(0)]
    }
}

#[derive(Debug, Clone)]
pub struct DeepHedgingBuilder {
    pub horizon: f32,
    pub n_euler: usize,
    pub hidden: usize,
    pub multiple_ctrls: bool,
    pub mu: f32,
    pub sigma: f32,
    pub strike: f32,
    pub tx_cost: f32,
}

impl DeepHedgingBuilder {
    pub fn new(horizon: f32, n_euler: usize) -> Self {
        DeepHedgingBuilder {
            horizon,
            n_euler,
            hidden: 32,
            multiple_ctrls: false,
            mu: 0.0,
            sigma: 0.2,
            strike: 1.0,
            tx_cost: 0.001,
        }
    }

    pub fn multiple_ctrls(mut self, enabled: bool) -> Self {
        self.multiple_ctrls = enabled;
        self
    }
}

impl ModelBuilder for DeepHedgingBuilder {
    fn build(&self, rng: &mut StdRng) -> Result<SocModel, SocNetError> {
        let sde = DeepHedging::new(self.mu, self.sigma, self.strike, self.tx_cost)?;
        // price and gains columns feed the net; the position is unbounded
        let provider = build_provider(
            rng,
            2,
            self.hidden,
            1,
            false,
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

    fn initial_states(batch: usize) -> Vec<Tensor> {
        vec![
            create::full(&[batch, 1], 1.0).unwrap(),
            create::zeros(&[batch, 1]).unwrap(),
        ]
    }

    #[test]
    fn validates_market_parameters() {
        assert!(DeepHedging::new(0.0, 0.0, 1.0, 0.001).is_err());
        assert!(DeepHedging::new(0.0, 0.2, -1.0, 0.001).is_err());
        assert!(DeepHedging::new(0.0, 0.2, 1.0, -0.1).is_err());
    }

    #[test]
    fn loss_carries_pnl_diagnostic() {
        let builder = DeepHedgingBuilder::new(1.0, 5);
        let mut rng = StdRng::seed_from_u64(0);
        let model = builder.build(&mut rng).unwrap();
        let rollout = model.forward(&initial_states(4), &mut rng).unwrap();
        assert_eq!(rollout.loss.shape(), vec![4, 2]);
        // hedging error is a square, so the cost column is non-negative up to
        // the transaction-cost contribution, which is also non-negative
        let data = rollout.loss.get_data();
        for row in 0..4 {
            assert!(data[row * 2] >= 0.0);
        }
    }

    #[test]
    fn gains_noise_tracks_price_noise() {
        let sde = DeepHedging::new(0.0, 0.2, 1.0, 0.0).unwrap();
        assert_eq!(
            sde.noise_coupling(),
            vec![NoiseCoupling::Own, NoiseCoupling::SameAs(0)]
        );
    }

    #[test]
    fn zero_transaction_cost_has_no_running_cost() {
        let sde = DeepHedging::new(0.0, 0.2, 1.0, 0.0).unwrap();
        let states = initial_states(2);
        let u = create::full(&[2, 1], 0.5).unwrap();
        let cost = sde.running_cost(&states, &u, None, 0.0, 0.2).unwrap();
        assert!(cost.is_none());
    }
}
