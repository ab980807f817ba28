//! Trip levels and tick windows of the protection monitors.

use powerstage_measurement::CURRENT_ZERO_CODE;

use crate::{ProtectionResult, ThresholdError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Threshold table handed to [`ProtectionSystem`](crate::ProtectionSystem).
///
/// Levels are calibrated codes (4096 = 68 V or the current sensor's full
/// scale). Counters compare strictly: a window of `n` acts on tick `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProtectionThresholds {
    /// Short circuit: output current above this...
    pub short_circuit_current: u32,
    /// ...while output voltage is below this.
    pub short_circuit_voltage: u32,
    /// Output overcurrent level.
    pub overcurrent: u32,
    /// Output overvoltage level (50 V).
    pub output_overvoltage: u32,
    /// Input undervoltage trip level (11.4 V).
    pub undervoltage_trip: u32,
    /// Input undervoltage release level (13.2 V).
    pub undervoltage_release: u32,
    /// Input overvoltage level (50 V).
    pub input_overvoltage: u32,
    /// Ticks between automatic retries of a bounded-retry fault.
    pub retry_window_ticks: u16,
    /// Retries allowed before outputs are held off until reset.
    pub retry_limit: u8,
    /// Overcurrent confirmation ticks.
    pub overcurrent_debounce_ticks: u16,
    /// Over/undervoltage confirmation ticks.
    pub voltage_debounce_ticks: u16,
    /// Ticks above the release level before undervoltage clears.
    pub undervoltage_recovery_ticks: u16,
}

impl Default for ProtectionThresholds {
    fn default() -> Self {
        Self {
            short_circuit_current: 3444,
            short_circuit_voltage: 289,
            overcurrent: 3165,
            output_overvoltage: 3012,
            undervoltage_trip: 686,
            undervoltage_release: 795,
            input_overvoltage: 3012,
            retry_window_ticks: 400,
            retry_limit: 10,
            overcurrent_debounce_ticks: 10,
            voltage_debounce_ticks: 2,
            undervoltage_recovery_ticks: 200,
        }
    }
}

impl ProtectionThresholds {
    /// Checks the table for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> ProtectionResult<()> {
        if self.undervoltage_release <= self.undervoltage_trip {
            return Err(ThresholdError::InvertedHysteresis {
                trip: self.undervoltage_trip,
                release: self.undervoltage_release,
            });
        }
        for (name, value) in [
            ("short-circuit current", self.short_circuit_current),
            ("overcurrent", self.overcurrent),
        ] {
            if value <= CURRENT_ZERO_CODE {
                return Err(ThresholdError::CurrentBelowZero {
                    name,
                    value,
                    zero: CURRENT_ZERO_CODE,
                });
            }
        }
        if self.retry_window_ticks == 0 {
            return Err(ThresholdError::ZeroWindow {
                name: "retry window",
            });
        }
        if self.undervoltage_recovery_ticks == 0 {
            return Err(ThresholdError::ZeroWindow {
                name: "undervoltage recovery window",
            });
        }
        Ok(())
    }

    /// Retry counter value that marks retries as exhausted.
    #[must_use]
    pub const fn exhausted_retries(&self) -> u8 {
        self.retry_limit.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        assert_eq!(ProtectionThresholds::default().validate(), Ok(()));
        assert_eq!(ProtectionThresholds::default().exhausted_retries(), 11);
    }

    #[test]
    fn release_must_sit_above_trip() {
        let thresholds = ProtectionThresholds {
            undervoltage_release: 686,
            ..ProtectionThresholds::default()
        };
        assert_eq!(
            thresholds.validate(),
            Err(ThresholdError::InvertedHysteresis {
                trip: 686,
                release: 686
            })
        );
    }

    #[test]
    fn overcurrent_at_zero_code_is_rejected() {
        let thresholds = ProtectionThresholds {
            overcurrent: 2048,
            ..ProtectionThresholds::default()
        };
        assert!(matches!(
            thresholds.validate(),
            Err(ThresholdError::CurrentBelowZero {
                name: "overcurrent",
                ..
            })
        ));
    }
}
