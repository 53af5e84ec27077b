use crate::error::ExperimentError;
use crate::model::{ModelBuilder, SocModel};
use crate::simulator::Rollout;
use rand::rngs::StdRng;
use rand::SeedableRng;
use socnet_core::SocNetError;
use socnet_data::{DatasetLoader, InitialConditions};
use socnet_optim::{BaseRuleKind, Langevin, NoiseScope, Optimizer, Schedule};
use std::fs;
use std::path::Path;

/// One optimizer configuration entered in the comparison.
#[derive(Debug, Clone)]
pub struct OptimizerSpec {
    pub name: String,
    pub rule: BaseRuleKind,
    pub lr: Schedule,
    pub sigma: Schedule,
    pub scope: NoiseScope,
    pub seed: u64,
}

impl OptimizerSpec {
    pub fn new(
        name: &str,
        rule: BaseRuleKind,
        lr: impl Into<Schedule>,
        sigma: impl Into<Schedule>,
    ) -> Self {
        OptimizerSpec {
            name: name.to_string(),
            rule,
            lr: lr.into(),
            sigma: sigma.into(),
            scope: NoiseScope::All,
            seed: 0,
        }
    }

    pub fn scope(mut self, scope: NoiseScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// One epoch's losses.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochRecord {
    pub epoch: usize,
    pub train_loss: f32,
    pub test_loss: f32,
}

/// Loss curve of one trained optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RunHistory {
    pub name: String,
    pub records: Vec<EpochRecord>,
}

struct TrainedRun {
    history: RunHistory,
    model: SocModel,
}

/// Compares optimizer configurations on one control problem.
///
/// Each configuration trains a freshly built model (same init seed, so all
/// start from identical weights) strictly in list order. `load_data` must run
/// before `run_experiment`; histories and trajectories are only readable for
/// optimizers that finished training.
pub struct Experiment {
    builder: Box<dyn ModelBuilder>,
    loader: Box<dyn DatasetLoader>,
    specs: Vec<OptimizerSpec>,
    model_seed: u64,
    data: Option<(InitialConditions, InitialConditions)>,
    runs: Vec<TrainedRun>,
}

impl Experiment {
    pub fn new(
        builder: Box<dyn ModelBuilder>,
        loader: Box<dyn DatasetLoader>,
        specs: Vec<OptimizerSpec>,
        model_seed: u64,
    ) -> Result<Self, ExperimentError> {
        if specs.is_empty() {
            return Err(ExperimentError::Core(SocNetError::ConfigurationError(
                "experiment needs at least one optimizer spec".to_string(),
            )));
        }
        Ok(Experiment {
            builder,
            loader,
            specs,
            model_seed,
            data: None,
            runs: Vec::new(),
        })
    }

    /// Materializes the train/test splits from the configured loader.
    pub fn load_data(&mut self) -> Result<(), ExperimentError> {
        let (train, test) = self.loader.load_data()?;
        log::info!(
            "loaded {} train / {} test initial states",
            train.num_rows(),
            test.num_rows()
        );
        self.data = Some((train, test));
        Ok(())
    }

    /// Trains every configured optimizer for `n_epochs`, in order. Earlier
    /// results are discarded on re-run.
    pub fn run_experiment(&mut self, n_epochs: usize) -> Result<(), ExperimentError> {
        let (train, test) = self.data.clone().ok_or(ExperimentError::DataNotLoaded)?;
        self.runs.clear();
        let specs = self.specs.clone();

        for spec in specs {
            log::info!("training optimizer '{}' ({:?})", spec.name, spec.rule);
            let mut init_rng = StdRng::seed_from_u64(self.model_seed);
            let model = self.builder.build(&mut init_rng)?;

            let mut optimizer = Langevin::new(
                model.parameters(),
                spec.rule.build()?,
                spec.lr.clone(),
                spec.sigma.clone(),
                spec.scope.clone(),
                spec.seed,
            )?;
            if optimizer.needs_binding() {
                optimizer.bind_layers(&model.layer_parameters()?)?;
            }

            // one noise stream per run, shared by train and eval rollouts
            let mut sim_rng = StdRng::seed_from_u64(self.model_seed.wrapping_add(1));
            let mut records = Vec::with_capacity(n_epochs);
            for epoch in 0..n_epochs {
                let train_loss = train_epoch(&model, &mut optimizer, &train, &mut sim_rng)?;
                let test_loss = evaluate(&model, &test, &mut sim_rng)?;
                log::info!(
                    "optimizer '{}' epoch {}: train {:.6} test {:.6}",
                    spec.name,
                    epoch,
                    train_loss,
                    test_loss
                );
                records.push(EpochRecord {
                    epoch,
                    train_loss,
                    test_loss,
                });
            }

            self.runs.push(TrainedRun {
                history: RunHistory {
                    name: spec.name,
                    records,
                },
                model,
            });
        }
        Ok(())
    }

    pub fn num_trained(&self) -> usize {
        self.runs.len()
    }

    fn run(&self, index: usize) -> Result<&TrainedRun, ExperimentError> {
        if index >= self.specs.len() {
            return Err(ExperimentError::BadOptimizerIndex {
                index,
                len: self.specs.len(),
            });
        }
        self.runs
            .get(index)
            .ok_or(ExperimentError::NotTrained { index })
    }

    /// Loss curve of the `index`-th optimizer.
    pub fn history(&self, index: usize) -> Result<&RunHistory, ExperimentError> {
        Ok(&self.run(index)?.history)
    }

    /// Fresh rollout of the `index`-th trained model on the first test batch,
    /// with its own noise seed.
    pub fn sample_trajectory(&self, index: usize, seed: u64) -> Result<Rollout, ExperimentError> {
        let run = self.run(index)?;
        let (_, test) = self.data.as_ref().ok_or(ExperimentError::DataNotLoaded)?;
        let batch = test
            .batches()
            .next()
            .ok_or(ExperimentError::Core(SocNetError::ConfigurationError(
                "test split is empty".to_string(),
            )))??;
        let mut rng = StdRng::seed_from_u64(seed);
        Ok(run.model.forward(&batch, &mut rng)?)
    }

    /// Writes one loss-history CSV per trained optimizer into `dir`, creating
    /// the directory if needed.
    pub fn save_data(&self, dir: impl AsRef<Path>) -> Result<(), ExperimentError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        for run in &self.runs {
            let path = dir.join(format!("{}.csv", run.history.name));
            write_history(&run.history, &path)?;
        }
        Ok(())
    }

    /// Writes a sampled trajectory CSV to `path`. Unlike `save_data`, missing
    /// parent directories are an error.
    pub fn save_traj(
        &self,
        path: impl AsRef<Path>,
        index: usize,
        seed: u64,
    ) -> Result<(), ExperimentError> {
        let rollout = self.sample_trajectory(index, seed)?;
        let mut writer = csv::Writer::from_path(path.as_ref())?;

        let first = match rollout.trajectory.first() {
            Some(point) => point,
            None => return Ok(()),
        };
        let mut header = vec!["step".to_string(), "t".to_string()];
        for (v, values) in first.states.iter().enumerate() {
            for j in 0..values.len() {
                header.push(format!("x{}_{}", v, j));
            }
        }
        let action_dim = first.control.as_ref().map(Vec::len).unwrap_or(0);
        for j in 0..action_dim {
            header.push(format!("u_{}", j));
        }
        for j in 0..first.diagnostics.len() {
            header.push(format!("d_{}", j));
        }
        writer.write_record(&header)?;

        for (step, point) in rollout.trajectory.iter().enumerate() {
            let mut record = vec![step.to_string(), point.t.to_string()];
            for values in &point.states {
                record.extend(values.iter().map(f32::to_string));
            }
            match &point.control {
                Some(control) => record.extend(control.iter().map(f32::to_string)),
                None => record.extend(std::iter::repeat(String::new()).take(action_dim)),
            }
            record.extend(point.diagnostics.iter().map(f32::to_string));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn train_epoch(
    model: &SocModel,
    optimizer: &mut Langevin,
    data: &InitialConditions,
    rng: &mut StdRng,
) -> Result<f32, ExperimentError> {
    let mut total = 0.0;
    let mut count = 0usize;
    for batch in data.batches() {
        let batch = batch?;
        let rollout = model.forward(&batch, rng)?;
        let objective = SocModel::objective(&rollout.loss)?;
        optimizer.zero_grad()?;
        objective.backward(None)?;
        optimizer.step()?;
        let rows = batch[0].shape()[0];
        total += objective.item()? * rows as f32;
        count += rows;
    }
    mean_or_err(total, count)
}

fn evaluate(
    model: &SocModel,
    data: &InitialConditions,
    rng: &mut StdRng,
) -> Result<f32, ExperimentError> {
    let mut total = 0.0;
    let mut count = 0usize;
    for batch in data.batches() {
        let batch = batch?;
        let rollout = model.forward(&batch, rng)?;
        let objective = SocModel::objective(&rollout.loss)?;
        let rows = batch[0].shape()[0];
        total += objective.item()? * rows as f32;
        count += rows;
    }
    mean_or_err(total, count)
}

fn mean_or_err(total: f32, count: usize) -> Result<f32, ExperimentError> {
    if count == 0 {
        return Err(ExperimentError::Core(SocNetError::ConfigurationError(
            "data split is empty".to_string(),
        )));
    }
    Ok(total / count as f32)
}

fn write_history(history: &RunHistory, path: &Path) -> Result<(), ExperimentError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["epoch", "train_loss", "test_loss"])?;
    for record in &history.records {
        writer.write_record([
            record.epoch.to_string(),
            record.train_loss.to_string(),
            record.test_loss.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a loss-history CSV written by [`Experiment::save_data`].
pub fn load_history(path: impl AsRef<Path>) -> Result<Vec<EpochRecord>, ExperimentError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let parse = |field: Option<&str>, name: &str| -> Result<f32, ExperimentError> {
            field
                .and_then(|s| s.parse::<f32>().ok())
                .ok_or_else(|| ExperimentError::BadRecord {
                    path: path.display().to_string(),
                    message: format!("missing or invalid {}", name),
                })
        };
        let epoch = row
            .get(0)
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| ExperimentError::BadRecord {
                path: path.display().to_string(),
                message: "missing or invalid epoch".to_string(),
            })?;
        records.push(EpochRecord {
            epoch,
            train_loss: parse(row.get(1), "train_loss")?,
            test_loss: parse(row.get(2), "test_loss")?,
        });
    }
    Ok(records)
}
