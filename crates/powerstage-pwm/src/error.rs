//! Error types for the PWM timing engine.

use crate::{ChannelPair, HalError};

/// Inconsistent [`PwmLimits`](crate::PwmLimits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid PWM limits: {reason}")]
pub struct LimitsError {
    /// What is inconsistent.
    pub reason: &'static str,
}

/// A rejected or failed timing request.
///
/// Rejections leave the programmed configuration untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PwmError {
    /// Requested frequency outside the accepted window.
    #[error("frequency {requested_hz} Hz is out of range [{min_hz}, {max_hz}]")]
    FrequencyOutOfRange {
        /// Requested frequency.
        requested_hz: u32,
        /// Lowest accepted frequency.
        min_hz: u32,
        /// Highest accepted frequency.
        max_hz: u32,
    },
    /// Derived period outside the accepted tick window.
    #[error("period {period} ticks is out of range [{min}, {max}]")]
    PeriodOutOfRange {
        /// Derived period.
        period: u64,
        /// Smallest accepted period.
        min: u32,
        /// Largest accepted period.
        max: u32,
    },
    /// Requested dead-time above the maximum.
    #[error("dead-time {requested_tenths}/1000 exceeds maximum {max_tenths}/1000")]
    DeadTimeOutOfRange {
        /// Requested dead-time in tenths of a percent.
        requested_tenths: u16,
        /// Largest accepted dead-time.
        max_tenths: u16,
    },
    /// Requested duty outside the pair's window.
    #[error("duty {requested_percent}% for {pair} is out of range [{min_percent}, {max_percent}]")]
    DutyOutOfRange {
        /// Addressed pair.
        pair: ChannelPair,
        /// Requested duty.
        requested_percent: u8,
        /// Smallest accepted duty.
        min_percent: u8,
        /// Largest accepted duty.
        max_percent: u8,
    },
    /// Limits failed validation.
    #[error(transparent)]
    InvalidLimits(#[from] LimitsError),
    /// The timer rejected a programming call.
    #[error("timer programming failed: {0}")]
    Hardware(#[from] HalError),
}

/// Result type for timing requests.
pub type PwmResult<T> = Result<T, PwmError>;

/// Waveform bring-up failed; the power stage must not be energised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BringUpError {
    /// The waveform parameters cannot be programmed.
    #[error("invalid waveform: {reason}")]
    InvalidWaveform {
        /// What is wrong.
        reason: &'static str,
    },
    /// Limits failed validation.
    #[error(transparent)]
    InvalidLimits(#[from] LimitsError),
    /// The timer rejected a programming call.
    #[error("waveform bring-up failed: {0}")]
    Hardware(#[from] HalError),
}
