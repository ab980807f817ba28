//! Error types for protection configuration.

use thiserror::Error;

/// Inconsistent protection threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ThresholdError {
    /// The undervoltage release level does not sit above the trip level.
    #[error("undervoltage release threshold {release} must exceed trip threshold {trip}")]
    InvertedHysteresis {
        /// Trip level.
        trip: u32,
        /// Release level.
        release: u32,
    },

    /// A current threshold at or below the zero-current code can never be
    /// told apart from an idle sensor.
    #[error("{name} threshold {value} must exceed the zero-current code {zero}")]
    CurrentBelowZero {
        /// Threshold name.
        name: &'static str,
        /// Configured value.
        value: u32,
        /// Zero-current code.
        zero: u32,
    },

    /// A tick window of zero.
    #[error("{name} must be at least one tick")]
    ZeroWindow {
        /// Window name.
        name: &'static str,
    },
}

/// Result type for protection configuration.
pub type ProtectionResult<T> = Result<T, ThresholdError>;
