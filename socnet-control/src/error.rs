use socnet_core::SocNetError;
use thiserror::Error;

/// Errors raised by the experiment orchestrator.
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("data not loaded; call load_data before run_experiment")]
    DataNotLoaded,

    #[error("optimizer {index} has not finished training yet")]
    NotTrained { index: usize },

    #[error("optimizer index {index} out of range ({len} configured)")]
    BadOptimizerIndex { index: usize, len: usize },

    #[error("malformed record in {path}: {message}")]
    BadRecord { path: String, message: String },

    #[error(transparent)]
    Core(#[from] SocNetError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
