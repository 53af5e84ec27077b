use crate::dataloader::InitialConditions;
use rand::rngs::StdRng;
use rand::SeedableRng;
use socnet_core::SocNetError;
use std::fmt;
use std::sync::Arc;

/// Default split sizes, matching the reference experiments.
pub const DEFAULT_N_TRAIN: usize = 100;
pub const DEFAULT_N_TEST: usize = 1000;
pub const DEFAULT_BATCH_SIZE: usize = 512;

/// Produces the train/test splits of initial states for an experiment.
pub trait DatasetLoader: Send + Sync {
    fn load_data(&self) -> Result<(InitialConditions, InitialConditions), SocNetError>;
}

fn check_sizes(n_train: usize, n_test: usize, batch_size: usize) -> Result<(), SocNetError> {
    if n_train == 0 || n_test == 0 {
        return Err(SocNetError::ConfigurationError(
            "split sizes must be positive".to_string(),
        ));
    }
    if batch_size == 0 {
        return Err(SocNetError::ConfigurationError(
            "batch_size must be positive".to_string(),
        ));
    }
    Ok(())
}

/// A single constant initial state, broadcast over every row of both splits.
#[derive(Debug, Clone)]
pub struct ConstantLoader {
    x0: Vec<f32>,
    n_train: usize,
    n_test: usize,
    batch_size: usize,
}

impl ConstantLoader {
    pub fn new(x0: Vec<f32>) -> Result<Self, SocNetError> {
        if x0.is_empty() {
            return Err(SocNetError::ConfigurationError(
                "ConstantLoader x0 must be non-empty".to_string(),
            ));
        }
        Ok(ConstantLoader {
            x0,
            n_train: DEFAULT_N_TRAIN,
            n_test: DEFAULT_N_TEST,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    pub fn with_sizes(
        mut self,
        n_train: usize,
        n_test: usize,
        batch_size: usize,
    ) -> Result<Self, SocNetError> {
        check_sizes(n_train, n_test, batch_size)?;
        self.n_train = n_train;
        self.n_test = n_test;
        self.batch_size = batch_size;
        Ok(self)
    }
}

impl DatasetLoader for ConstantLoader {
    fn load_data(&self) -> Result<(InitialConditions, InitialConditions), SocNetError> {
        let dims = vec![self.x0.len()];
        let row = vec![self.x0.clone()];
        let train = InitialConditions::new(vec![row.clone(); self.n_train], dims.clone(), self.batch_size)?;
        let test = InitialConditions::new(vec![row; self.n_test], dims, self.batch_size)?;
        Ok((train, test))
    }
}

/// Several constant state variables (e.g. price and volatility), each
/// broadcast over every row.
#[derive(Debug, Clone)]
pub struct ConstantsLoader {
    x0s: Vec<Vec<f32>>,
    n_train: usize,
    n_test: usize,
    batch_size: usize,
}

impl ConstantsLoader {
    pub fn new(x0s: Vec<Vec<f32>>) -> Result<Self, SocNetError> {
        if x0s.is_empty() || x0s.iter().any(|v| v.is_empty()) {
            return Err(SocNetError::ConfigurationError(
                "ConstantsLoader needs non-empty state vectors".to_string(),
            ));
        }
        Ok(ConstantsLoader {
            x0s,
            n_train: DEFAULT_N_TRAIN,
            n_test: DEFAULT_N_TEST,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    pub fn with_sizes(
        mut self,
        n_train: usize,
        n_test: usize,
        batch_size: usize,
    ) -> Result<Self, SocNetError> {
        check_sizes(n_train, n_test, batch_size)?;
        self.n_train = n_train;
        self.n_test = n_test;
        self.batch_size = batch_size;
        Ok(self)
    }
}

impl DatasetLoader for ConstantsLoader {
    fn load_data(&self) -> Result<(InitialConditions, InitialConditions), SocNetError> {
        let dims: Vec<usize> = self.x0s.iter().map(Vec::len).collect();
        let row = self.x0s.clone();
        let train = InitialConditions::new(vec![row.clone(); self.n_train], dims.clone(), self.batch_size)?;
        let test = InitialConditions::new(vec![row; self.n_test], dims, self.batch_size)?;
        Ok((train, test))
    }
}

/// Closure signature for generated initial states: `(rng, row index, dim)`
/// returns one state vector.
pub type MapFn = Arc<dyn Fn(&mut StdRng, usize, usize) -> Vec<f32> + Send + Sync>;

/// Generates each initial state from a user closure, reproducibly from a
/// fixed seed.
#[derive(Clone)]
pub struct MapLoader {
    map: MapFn,
    dim: usize,
    seed: u64,
    n_train: usize,
    n_test: usize,
    batch_size: usize,
}

impl fmt::Debug for MapLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapLoader")
            .field("dim", &self.dim)
            .field("seed", &self.seed)
            .field("n_train", &self.n_train)
            .field("n_test", &self.n_test)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl MapLoader {
    pub fn new(map: MapFn, dim: usize, seed: u64) -> Result<Self, SocNetError> {
        if dim == 0 {
            return Err(SocNetError::ConfigurationError(
                "MapLoader dim must be positive".to_string(),
            ));
        }
        Ok(MapLoader {
            map,
            dim,
            seed,
            n_train: DEFAULT_N_TRAIN,
            n_test: DEFAULT_N_TEST,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    pub fn with_sizes(
        mut self,
        n_train: usize,
        n_test: usize,
        batch_size: usize,
    ) -> Result<Self, SocNetError> {
        check_sizes(n_train, n_test, batch_size)?;
        self.n_train = n_train;
        self.n_test = n_test;
        self.batch_size = batch_size;
        Ok(self)
    }

    fn generate(&self, rng: &mut StdRng, rows: usize) -> Result<Vec<Vec<Vec<f32>>>, SocNetError> {
        let mut out = Vec::with_capacity(rows);
        for index in 0..rows {
            let values = (self.map)(rng, index, self.dim);
            if values.len() != self.dim {
                return Err(SocNetError::DimensionMismatch {
                    expected: self.dim,
                    actual: values.len(),
                });
            }
            out.push(vec![values]);
        }
        Ok(out)
    }
}

impl DatasetLoader for MapLoader {
    fn load_data(&self) -> Result<(InitialConditions, InitialConditions), SocNetError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let train_rows = self.generate(&mut rng, self.n_train)?;
        let test_rows = self.generate(&mut rng, self.n_test)?;
        let dims = vec![self.dim];
        let train = InitialConditions::new(train_rows, dims.clone(), self.batch_size)?;
        let test = InitialConditions::new(test_rows, dims, self.batch_size)?;
        Ok((train, test))
    }
}
