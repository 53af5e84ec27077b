//! Finite-difference checks of reverse-mode gradients through a small MLP.

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use socnet_core::nn::{Linear, Module, Sequential, Tanh};
use socnet_core::ops::reduction::mean_op;
use socnet_core::tensor::Tensor;

fn build_net(seed: u64) -> Sequential {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut net = Sequential::new();
    net.add_module("fc1", Box::new(Linear::new(2, 3, true, &mut rng).unwrap()));
    net.add_module("act", Box::new(Tanh));
    net.add_module("fc2", Box::new(Linear::new(3, 1, true, &mut rng).unwrap()));
    net
}

fn scalar_loss(net: &Sequential, x: &Tensor) -> f32 {
    let y = net.forward(x).unwrap();
    mean_op(&y).unwrap().item().unwrap()
}

#[test]
fn analytic_gradients_match_finite_differences() {
    let net = build_net(11);
    let x = Tensor::new(vec![0.3, -0.7, 1.1, 0.4], vec![2, 2]).unwrap();

    let y = net.forward(&x).unwrap();
    let loss = mean_op(&y).unwrap();
    loss.backward(None).unwrap();

    let eps = 1e-3_f32;
    for param in net.parameters() {
        let analytic = param.read().unwrap().grad().unwrap().get_data();
        let base = param.read().unwrap().data();
        for i in 0..base.len() {
            let mut bumped = base.clone();
            bumped[i] += eps;
            param.write().unwrap().set_data(bumped).unwrap();
            let plus = scalar_loss(&net, &x);

            let mut bumped = base.clone();
            bumped[i] -= eps;
            param.write().unwrap().set_data(bumped).unwrap();
            let minus = scalar_loss(&net, &x);

            param.write().unwrap().set_data(base.clone()).unwrap();

            let numeric = (plus - minus) / (2.0 * eps);
            assert_relative_eq!(analytic[i], numeric, epsilon = 1e-2, max_relative = 1e-2);
        }
    }
}

#[test]
fn zero_grad_clears_accumulated_gradients() {
    let net = build_net(5);
    let x = Tensor::new(vec![0.5, 0.5], vec![1, 2]).unwrap();
    let loss = mean_op(&net.forward(&x).unwrap()).unwrap();
    loss.backward(None).unwrap();
    for param in net.parameters() {
        assert!(param.read().unwrap().grad().is_some());
        param.write().unwrap().zero_grad();
        assert!(param.read().unwrap().grad().is_none());
    }
}
