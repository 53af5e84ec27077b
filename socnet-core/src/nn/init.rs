use rand::rngs::StdRng;
use rand::Rng;

/// Uniform fan-in initialization, `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`.
///
/// Drawn from an explicit rng so compared optimizers can start from identical
/// weights by reusing the seed.
pub fn uniform_fan_in(rng: &mut StdRng, fan_in: usize, numel: usize) -> Vec<f32> {
    let bound = if fan_in == 0 {
        0.0
    } else {
        1.0 / (fan_in as f32).sqrt()
    };
    (0..numel).map(|_| rng.gen_range(-bound..=bound)).collect()
}
