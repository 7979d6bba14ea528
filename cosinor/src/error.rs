//! Error types for cosinor fitting and configuration.

use thiserror::Error;

/// Why a group of observations cannot support a three-parameter cosinor fit
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InsufficientData {
    #[error("need at least {required} distinct time points, got {distinct}")]
    TooFewTimePoints { distinct: usize, required: usize },

    #[error("design matrix is rank deficient: rank {rank} of {columns} columns")]
    RankDeficient { rank: usize, columns: usize },
}

/// Errors raised by the fitting core and configuration validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CosinorError {
    #[error("insufficient data: {0}")]
    InsufficientData(#[from] InsufficientData),

    #[error("length mismatch: {times} time values, {values} observed values")]
    LengthMismatch { times: usize, values: usize },

    #[error("non-finite input at index {index}")]
    NonFiniteInput { index: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("least-squares solve failed: {0}")]
    SolveFailed(String),
}

impl CosinorError {
    /// Short machine-readable tag used when a failure is recorded in an output table
    pub fn kind(&self) -> &'static str {
        match self {
            CosinorError::InsufficientData(_) => "insufficient_data",
            CosinorError::LengthMismatch { .. } => "length_mismatch",
            CosinorError::NonFiniteInput { .. } => "non_finite_input",
            CosinorError::InvalidConfig(_) => "invalid_config",
            CosinorError::SolveFailed(_) => "solve_failed",
        }
    }
}
