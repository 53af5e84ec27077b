//! Gradient optimizers with optional Langevin noise.
//!
//! The classical rules (Adam, RMSProp, Adadelta, momentum SGD) are expressed
//! as [`BaseRule`] update-delta computations; [`Langevin`] wraps any of them
//! and adds Gaussian exploration noise with a tunable scale, either on every
//! parameter or on a selected set of layers.

pub mod adadelta;
pub mod adam;
pub mod base;
pub mod langevin;
pub mod optimizer;
pub mod rmsprop;
pub mod schedule;
pub mod sgd;

pub use adadelta::Adadelta;
pub use adam::Adam;
pub use base::{BaseRule, BaseRuleKind};
pub use langevin::{Langevin, NoiseScope};
pub use optimizer::Optimizer;
pub use rmsprop::RmsProp;
pub use schedule::Schedule;
pub use sgd::Sgd;
