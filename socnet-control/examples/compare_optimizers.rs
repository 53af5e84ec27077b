//! Compares Langevin-Adam against plain Adam on the fishing-quota problem
//! and dumps the loss curves plus a sampled trajectory.
//!
//! Run with `RUST_LOG=info cargo run --example compare_optimizers`.

use socnet_control::models::FishingBuilder;
use socnet_control::{Experiment, OptimizerSpec};
use socnet_data::ConstantLoader;
use socnet_optim::BaseRuleKind;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let builder = FishingBuilder::new(2, 1.0, 20)?;
    let loader = ConstantLoader::new(vec![1.0, 1.0])?.with_sizes(512, 512, 512)?;

    let specs = vec![
        OptimizerSpec::new("adam", BaseRuleKind::adam(), 0.01, 0.0),
        OptimizerSpec::new("langevin_adam", BaseRuleKind::adam(), 0.01, 1e-3).seed(1),
    ];

    let mut experiment = Experiment::new(Box::new(builder), Box::new(loader), specs, 7)?;
    experiment.load_data()?;
    experiment.run_experiment(30)?;

    for index in 0..2 {
        let history = experiment.history(index)?;
        let last = history.records.last().map(|r| r.test_loss);
        println!("{}: final test loss {:?}", history.name, last);
    }

    experiment.save_data("results")?;
    experiment.save_traj("results/trajectory.csv", 1, 99)?;
    Ok(())
}
