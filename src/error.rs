//! Error types for the coexp-sig library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum CoexpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Duplicate gene identifier '{0}'")]
    DuplicateGene(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Module '{0}' not found in the module map")]
    UnknownModule(String),

    #[error("Sample index {index} out of range for {n_samples} samples")]
    SampleIndexOutOfRange { index: usize, n_samples: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, CoexpError>;
