//! Error types for controller construction.

use powerstage_measurement::MeasurementError;
use powerstage_protection::ThresholdError;
use powerstage_pwm::{BringUpError, LimitsError};
use thiserror::Error;

/// Errors raised while validating a configuration or bringing up the stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// Protection threshold table rejected.
    #[error("invalid protection thresholds: {0}")]
    Thresholds(#[from] ThresholdError),

    /// PWM limits rejected.
    #[error("invalid PWM limits: {0}")]
    Limits(#[from] LimitsError),

    /// Calibration table rejected.
    #[error("invalid calibration: {0}")]
    Calibration(#[from] MeasurementError),

    /// Waveform bring-up failed. The power stage must not be energised.
    #[error("power stage bring-up failed: {0}")]
    BringUp(#[from] BringUpError),

    /// A controller section is inconsistent.
    #[error("invalid {section} configuration: {reason}")]
    InvalidSection {
        /// Section name.
        section: &'static str,
        /// What is wrong.
        reason: &'static str,
    },
}

impl ControlError {
    /// Whether the error came from the hardware rather than the configuration.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, ControlError::BringUp(BringUpError::Hardware(_)))
    }
}

/// Result type for controller construction.
pub type ControlResult<T> = Result<T, ControlError>;
