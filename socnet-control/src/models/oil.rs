use crate::model::{ModelBuilder, SocModel};
use crate::models::build_provider;
use crate::simulator::{ControlledSde, Simulator};
use rand::rngs::StdRng;
use socnet_core::ops::arithmetic::{add_op, mul_op, mul_scalar_op, neg_op, square_op};
use socnet_core::{SocNetError, Tensor};

/// Oil-drilling problem on a single reserve.
///
/// The reserve depletes at the chosen extraction rate, `dR = −u_max u R dt +
/// σ R dW`, with `u` in `(0, 1)` from the control net so the extraction
/// bound is structural. The running cost is extraction revenue (negative)
/// plus a quadratic operating cost; the terminal cost credits the salvage
/// value of what is left.
#[derive(Debug)]
pub struct OilDrilling {
    price: f32,
    sigma: f32,
    u_max: f32,
    quad_cost: f32,
    salvage: f32,
}

impl OilDrilling {
    pub fn new(
        price: f32,
        sigma: f32,
        u_max: f32,
        quad_cost: f32,
        salvage: f32,
    ) -> Result<Self, SocNetError> {
        if price <= 0.0 || u_max <= 0.0 {
            return Err(SocNetError::ConfigurationError(
                "OilDrilling price and u_max must be positive".to_string(),
            ));
        }
        if quad_cost < 0.0 || salvage < 0.0 {
            return Err(SocNetError::ConfigurationError(
                "OilDrilling costs must be non-negative".to_string(),
            ));
        }
        Ok(OilDrilling {
            price,
            sigma,
            u_max,
            quad_cost,
            salvage,
        })
    }

    fn extraction(&self, states: &[Tensor], control: &Tensor) -> Result<Tensor, SocNetError> {
        mul_op(&mul_scalar_op(control, self.u_max)?, &states[0])
    }
}

impl ControlledSde for OilDrilling {
    fn state_dims(&self) -> Vec<usize> {
        vec![1]
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
        Ok(vec![neg_op(&self.extraction(states, control)?)?])
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
        let extracted = self.extraction(states, control)?;
        let revenue = mul_scalar_op(&extracted, -self.price * dt)?;
        let operating = mul_scalar_op(&square_op(&extracted)?, self.quad_cost * dt)?;
        Ok(Some(add_op(&revenue, &operating)?))
    }

    fn terminal_cost(&self, states: &[Tensor]) -> Result<Tensor, SocNetError> {
        mul_scalar_op(&states[0], -self.salvage)
    }
}

#[derive(Debug, Clone)]
pub struct OilDrillingBuilder {
    pub horizon: f32,
    pub n_euler: usize,
    pub hidden: usize,
    pub multiple_ctrls: bool,
    pub price: f32,
    pub sigma: f32,
    pub u_max: f32,
    pub quad_cost: f32,
    pub salvage: f32,
}

impl OilDrillingBuilder {
    /// The reserve is scalar by construction; `dim` is accepted for symmetry
    /// with the other builders and rejected when it is not 1.
    pub fn new(dim: usize, horizon: f32, n_euler: usize) -> Result<Self, SocNetError> {
        if dim != 1 {
            return Err(SocNetError::ConfigurationError(format!(
                "OilDrilling supports a single reserve only, got dim {}",
                dim
            )));
        }
        Ok(OilDrillingBuilder {
            horizon,
            n_euler,
            hidden: 32,
            multiple_ctrls: false,
            price: 1.0,
            sigma: 0.1,
            u_max: 1.0,
            quad_cost: 0.5,
            salvage: 0.2,
        })
    }

    pub fn multiple_ctrls(mut self, enabled: bool) -> Self {
        self.multiple_ctrls = enabled;
        self
    }
}

impl ModelBuilder for OilDrillingBuilder {
    fn build(&self, rng: &mut StdRng) -> Result<SocModel, SocNetError> {
        let sde = OilDrilling::new(
            self.price,
            self.sigma,
            self.u_max,
            self.quad_cost,
            self.salvage,
        )?;
        let provider = build_provider(
            rng,
            1,
            self.hidden,
            1,
            true,
            self.n_euler,
            self.multiple_ctrls,
        )?;
        let simulator = Simulator::new(self.horizon, self.n_euler)?;
        SocModel::new(Box::new(sde), provider, simulator)
    }
}
