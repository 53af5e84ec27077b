//! Stochastic optimal control experiments.
//!
//! A control problem is a [`ControlledSde`] (drift, diffusion, costs); the
//! [`Simulator`] unrolls it with Euler–Maruyama steps, pulling the control
//! action at each step from a neural [`ControlProvider`]. The whole rollout
//! is differentiable, so the terminal loss trains the control networks.
//! [`Experiment`] compares Langevin-augmented optimizers on such problems and
//! persists the loss curves as CSV.

pub mod control;
pub mod error;
pub mod experiment;
pub mod model;
pub mod models;
pub mod simulator;

pub use control::ControlProvider;
pub use error::ExperimentError;
pub use experiment::{load_history, EpochRecord, Experiment, OptimizerSpec, RunHistory};
pub use model::{ModelBuilder, SocModel};
pub use simulator::{ControlledSde, NoiseCoupling, Rollout, Simulator, TrajectoryPoint};
