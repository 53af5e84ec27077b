use thiserror::Error;

/// Error type shared across the socnet crates.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum SocNetError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Cannot broadcast shapes: {shape1:?} and {shape2:?}")]
    BroadcastError {
        shape1: Vec<usize>,
        shape2: Vec<usize>,
    },

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("Index out of bounds: index {index} for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Backward called on non-scalar tensor without explicit gradient.")]
    BackwardNonScalar,

    #[error("Backward error: {0}")]
    BackwardError(String),

    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    #[error("Arithmetic error: {0}")]
    ArithmeticError(String),

    #[error("Layer-selective noise is not bound: call bind_layers() once the model is built, before the first step()")]
    UnboundLayerNoise,

    #[error("Internal error: {0}")]
    InternalError(String),
}
