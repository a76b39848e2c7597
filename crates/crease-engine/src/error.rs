//! Error types for the analysis core.
//!
//! Insufficient tracking data is not an error here: stages report it as data
//! (`InsufficientReason`, `SpeedOutcome::Unavailable`). Errors cover invalid
//! configuration and unusable caller inputs.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Degenerate pitch calibration: {0}")]
    DegenerateCalibration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl EngineError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn degenerate_calibration(message: impl Into<String>) -> Self {
        Self::DegenerateCalibration(message.into())
    }
}
