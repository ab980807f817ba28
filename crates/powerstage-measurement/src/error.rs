//! Error types for measurement configuration.

use crate::Channel;

/// Errors raised while building a calibration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MeasurementError {
    /// Calibration gain outside the accepted Q12 range.
    #[error("{channel} calibration gain {gain_q12} is out of range [1, {max}]")]
    GainOutOfRange {
        /// Channel being calibrated.
        channel: Channel,
        /// Rejected gain.
        gain_q12: u32,
        /// Largest accepted gain.
        max: u32,
    },
    /// Calibration offset outside the accepted code range.
    #[error("{channel} calibration offset {offset} exceeds ±{max}")]
    OffsetOutOfRange {
        /// Channel being calibrated.
        channel: Channel,
        /// Rejected offset.
        offset: i32,
        /// Largest accepted magnitude.
        max: i32,
    },
}

/// Result type for measurement operations.
pub type MeasurementResult<T> = Result<T, MeasurementError>;
