use socnet_control::models::FishingBuilder;
use socnet_control::{load_history, Experiment, ExperimentError, OptimizerSpec};
use socnet_data::ConstantLoader;
use socnet_optim::{BaseRuleKind, NoiseScope};
use std::collections::HashSet;

fn small_experiment(specs: Vec<OptimizerSpec>) -> Experiment {
    let builder = FishingBuilder::new(1, 1.0, 2).unwrap().hidden(4);
    let loader = ConstantLoader::new(vec![1.0])
        .unwrap()
        .with_sizes(8, 8, 4)
        .unwrap();
    Experiment::new(Box::new(builder), Box::new(loader), specs, 3).unwrap()
}

fn two_specs() -> Vec<OptimizerSpec> {
    vec![
        OptimizerSpec::new("adam", BaseRuleKind::adam(), 0.01, 0.0),
        OptimizerSpec::new("langevin_sgd", BaseRuleKind::sgd(0.9), 0.01, 1e-3).seed(5),
    ]
}

#[test]
fn run_before_load_is_a_sequencing_error() {
    let mut experiment = small_experiment(two_specs());
    assert!(matches!(
        experiment.run_experiment(1),
        Err(ExperimentError::DataNotLoaded)
    ));
}

#[test]
fn accessors_fail_before_training() {
    let mut experiment = small_experiment(two_specs());
    experiment.load_data().unwrap();
    assert!(matches!(
        experiment.history(0),
        Err(ExperimentError::NotTrained { index: 0 })
    ));
    assert!(matches!(
        experiment.sample_trajectory(1, 0),
        Err(ExperimentError::NotTrained { index: 1 })
    ));
    assert!(matches!(
        experiment.history(2),
        Err(ExperimentError::BadOptimizerIndex { index: 2, len: 2 })
    ));
}

#[test]
fn two_optimizers_five_epochs() {
    let mut experiment = small_experiment(two_specs());
    experiment.load_data().unwrap();
    experiment.run_experiment(5).unwrap();
    assert_eq!(experiment.num_trained(), 2);

    for index in 0..2 {
        let history = experiment.history(index).unwrap();
        assert_eq!(history.records.len(), 5);
        for (epoch, record) in history.records.iter().enumerate() {
            assert_eq!(record.epoch, epoch);
            assert!(record.train_loss.is_finite());
            assert!(record.test_loss.is_finite());
        }
    }
    assert_ne!(
        experiment.history(0).unwrap().name,
        experiment.history(1).unwrap().name
    );
}

#[test]
fn repeated_runs_are_deterministic() {
    let run = || {
        let mut experiment = small_experiment(two_specs());
        experiment.load_data().unwrap();
        experiment.run_experiment(3).unwrap();
        experiment.history(1).unwrap().clone()
    };
    assert_eq!(run(), run());
}

#[test]
fn layer_selective_spec_trains() {
    let specs = vec![OptimizerSpec::new(
        "layer_langevin",
        BaseRuleKind::adam(),
        0.01,
        1e-3,
    )
    .scope(NoiseScope::Layers(HashSet::from([0])))];
    let mut experiment = small_experiment(specs);
    experiment.load_data().unwrap();
    experiment.run_experiment(2).unwrap();
    assert_eq!(experiment.history(0).unwrap().records.len(), 2);
}

#[test]
fn history_round_trips_through_csv() {
    let mut experiment = small_experiment(two_specs());
    experiment.load_data().unwrap();
    experiment.run_experiment(4).unwrap();

    let dir = tempfile::tempdir().unwrap();
    experiment.save_data(dir.path()).unwrap();

    for index in 0..2 {
        let history = experiment.history(index).unwrap();
        let path = dir.path().join(format!("{}.csv", history.name));
        let loaded = load_history(&path).unwrap();
        assert_eq!(loaded, history.records);
    }
}

#[test]
fn save_data_creates_missing_directories() {
    let mut experiment = small_experiment(two_specs());
    experiment.load_data().unwrap();
    experiment.run_experiment(1).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    experiment.save_data(&nested).unwrap();
    assert!(nested.join("adam.csv").exists());
}

#[test]
fn save_traj_does_not_create_directories() {
    let mut experiment = small_experiment(two_specs());
    experiment.load_data().unwrap();
    experiment.run_experiment(1).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope").join("traj.csv");
    assert!(experiment.save_traj(&missing, 0, 0).is_err());

    let present = dir.path().join("traj.csv");
    experiment.save_traj(&present, 0, 0).unwrap();
    let contents = std::fs::read_to_string(&present).unwrap();
    let mut lines = contents.lines();
    // fishing reports one diagnostic column (remaining biomass)
    assert_eq!(lines.next().unwrap(), "step,t,x0_0,u_0,d_0");
    let rows: Vec<&str> = lines.collect();
    // 2 Euler steps: two control rows plus the terminal row
    assert_eq!(rows.len(), 3);
    let terminal: Vec<&str> = rows[2].split(',').collect();
    assert_eq!(terminal.len(), 5);
    // control is blank on the terminal row, the diagnostic is not
    assert!(terminal[3].is_empty());
    assert!(terminal[4].parse::<f32>().unwrap().is_finite());
}

#[test]
fn sampled_trajectories_are_seed_deterministic() {
    let mut experiment = small_experiment(two_specs());
    experiment.load_data().unwrap();
    experiment.run_experiment(1).unwrap();

    let a = experiment.sample_trajectory(0, 42).unwrap();
    let b = experiment.sample_trajectory(0, 42).unwrap();
    assert_eq!(a.loss.get_data(), b.loss.get_data());
    let c = experiment.sample_trajectory(0, 43).unwrap();
    assert_ne!(a.loss.get_data(), c.loss.get_data());
}
