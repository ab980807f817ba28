//! Error types for stagectl

use powerstage_control::ControlError;
use powerstage_pwm::{BringUpError, PwmError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Expectation failed: {0}")]
    ExpectationFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ControlError),

    #[error("PWM bring-up failed: {0}")]
    BringUp(#[from] BringUpError),

    #[error("PWM request rejected: {0}")]
    PwmRequest(#[from] PwmError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl SimError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            SimError::ExpectationFailed(_) => 3,
            SimError::InvalidScenario(_)
            | SimError::InvalidConfiguration(_)
            | SimError::PwmRequest(_)
            | SimError::JsonError(_)
            | SimError::YamlError(_) => 2,
            SimError::BringUp(_) | SimError::IoError(_) => 1,
        }
    }
}
