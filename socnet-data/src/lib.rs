//! Initial-condition datasets for stochastic control experiments.
//!
//! A training "sample" here is an initial state of the controlled SDE. The
//! loaders produce train/test splits of such states, batched into tensors of
//! shape `(batch, dim)` per state variable.

pub mod dataloader;
pub mod dataset;
pub mod loaders;

pub use dataloader::{DataLoader, InitialConditions};
pub use dataset::{Dataset, VecDataset};
pub use loaders::{ConstantLoader, ConstantsLoader, DatasetLoader, MapFn, MapLoader};
