use socnet_core::SocNetError;

/// Common interface of gradient-based optimizers.
pub trait Optimizer {
    /// Applies one parameter update from the currently accumulated gradients.
    fn step(&mut self) -> Result<(), SocNetError>;

    /// Clears the gradients of all managed parameters.
    fn zero_grad(&mut self) -> Result<(), SocNetError>;
}
