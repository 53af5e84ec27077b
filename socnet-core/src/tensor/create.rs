use crate::error::SocNetError;
use crate::tensor::Tensor;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;

/// Creates a tensor filled with zeros.
pub fn zeros(shape: &[usize]) -> Result<Tensor, SocNetError> {
    full(shape, 0.0)
}

/// Creates a tensor filled with ones.
pub fn ones(shape: &[usize]) -> Result<Tensor, SocNetError> {
    full(shape, 1.0)
}

/// Creates a tensor filled with `value`.
pub fn full(shape: &[usize], value: f32) -> Result<Tensor, SocNetError> {
    let numel: usize = shape.iter().product();
    Tensor::new(vec![value; numel], shape.to_vec())
}

/// Creates a leaf tensor from a data vector and shape.
pub fn from_vec(data_vec: Vec<f32>, shape: Vec<usize>) -> Result<Tensor, SocNetError> {
    Tensor::new(data_vec, shape)
}

/// Creates a zero tensor with the same shape as `tensor`.
pub fn zeros_like(tensor: &Tensor) -> Result<Tensor, SocNetError> {
    zeros(&tensor.shape())
}

/// Creates a ones tensor with the same shape as `tensor`.
pub fn ones_like(tensor: &Tensor) -> Result<Tensor, SocNetError> {
    ones(&tensor.shape())
}

/// Standard-normal tensor drawn from the thread rng.
pub fn randn(shape: &[usize]) -> Result<Tensor, SocNetError> {
    let numel: usize = shape.iter().product();
    let mut rng = rand::thread_rng();
    let data: Vec<f32> = (0..numel).map(|_| rng.sample(StandardNormal)).collect();
    Tensor::new(data, shape.to_vec())
}

/// Standard-normal tensor drawn from an explicit rng stream.
///
/// Simulation and initialization use this variant so runs are reproducible
/// under a fixed seed.
pub fn randn_with(shape: &[usize], rng: &mut StdRng) -> Result<Tensor, SocNetError> {
    let numel: usize = shape.iter().product();
    let data: Vec<f32> = (0..numel).map(|_| rng.sample(StandardNormal)).collect();
    Tensor::new(data, shape.to_vec())
}
