//! Error type shared by the catalog loaders, input validation and the engine

use thiserror::Error;

/// Failures the optimizer cannot turn into a result.
///
/// A model with no solution is not an error: it comes back as an
/// `OptimizationResult` whose `status` explains what happened.
#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid account '{name}': {reason}")]
    InvalidAccount { name: String, reason: String },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown account type: {0}")]
    UnknownAccountType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OptimizerError>;
