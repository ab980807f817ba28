//! Bring-up waveform parameters.

use crate::{BringUpError, PwmConfiguration, PwmLimits, Prescaler};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Nominal period the waveform parameters are expressed against.
pub const WAVEFORM_SCALE: u32 = 16_000;

/// Prescaler used by the bring-up waveform.
pub const BRING_UP_PRESCALER: Prescaler = Prescaler::Mul16;

/// Four-channel waveform established at power-up.
///
/// `half_period`, `duty` and `dead_time` are given against a nominal
/// period of [`WAVEFORM_SCALE`] ticks and rescaled to `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WaveformSpec {
    /// Period of master, A and B timers in counter ticks.
    pub period: u32,
    /// Phase offset of timer B, and end of the TA1/TB1 active phase.
    pub half_period: u32,
    /// End of the TA2/TB2 active phase.
    pub duty: u32,
    /// Gap between the end of TA1/TB1 and the half-period point.
    pub dead_time: u32,
}

impl Default for WaveformSpec {
    fn default() -> Self {
        Self {
            period: 16_000,
            half_period: 8_000,
            duty: 5_760,
            dead_time: 320,
        }
    }
}

/// Register values derived from a [`WaveformSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveformTiming {
    /// Period of all three timers.
    pub period: u32,
    /// Master compare 1, the reset event of timer B.
    pub master_compare: u32,
    /// Compare 1 of timers A and B.
    pub pair_a_compare: u32,
    /// Compare 2 of timers A and B.
    pub pair_b_compare: u32,
    /// Dead-time in counter ticks.
    pub dead_time_ticks: u32,
}

impl WaveformSpec {
    /// Derives register values and checks them against `limits`.
    ///
    /// # Errors
    ///
    /// Returns [`BringUpError::InvalidWaveform`] if any compare point falls
    /// outside the period or the period is outside the accepted window.
    pub fn timing(&self, limits: &PwmLimits) -> Result<WaveformTiming, BringUpError> {
        let invalid = |reason| Err(BringUpError::InvalidWaveform { reason });
        if !limits.accepts_period(self.period) {
            return invalid("period outside the accepted window");
        }
        if self.half_period == 0 || self.half_period >= WAVEFORM_SCALE {
            return invalid("half period must lie inside the period");
        }
        if self.duty == 0 || self.duty >= WAVEFORM_SCALE {
            return invalid("duty must lie inside the period");
        }
        let master_compare = rescale(self.half_period, self.period);
        let Some(pair_a_compare) = master_compare.checked_sub(self.dead_time) else {
            return invalid("dead time exceeds the half period");
        };
        if pair_a_compare == 0 {
            return invalid("dead time consumes the whole half period");
        }
        Ok(WaveformTiming {
            period: self.period,
            master_compare,
            pair_a_compare,
            pair_b_compare: rescale(self.duty, self.period),
            dead_time_ticks: self.dead_time,
        })
    }
}

impl WaveformTiming {
    /// Configuration record for the engine after a successful bring-up.
    #[must_use]
    pub fn configuration(&self, limits: &PwmLimits) -> PwmConfiguration {
        let clock = limits.count_clock_hz(BRING_UP_PRESCALER);
        let frequency = clock / u64::from(self.period.max(1));
        let tenths = u64::from(self.dead_time_ticks) * 1000 / u64::from(self.period.max(1));
        PwmConfiguration {
            frequency_hz: u32::try_from(frequency).unwrap_or(u32::MAX),
            period: self.period,
            prescaler: BRING_UP_PRESCALER,
            dead_time_tenths: u16::try_from(tenths).unwrap_or(u16::MAX),
            dead_time_ticks: self.dead_time_ticks,
            pair_a_compare: self.pair_a_compare,
            pair_b_compare: self.pair_b_compare,
            tb2_compare: self.pair_b_compare,
        }
    }
}

fn rescale(value: u32, period: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(period) / u64::from(WAVEFORM_SCALE);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn default_waveform_timing() -> TestResult {
        let timing = WaveformSpec::default().timing(&PwmLimits::default())?;
        assert_eq!(timing.master_compare, 8000);
        assert_eq!(timing.pair_a_compare, 7680);
        assert_eq!(timing.pair_b_compare, 5760);
        Ok(())
    }

    #[test]
    fn shorter_period_rescales_compare_points() -> TestResult {
        let spec = WaveformSpec {
            period: 12_000,
            ..WaveformSpec::default()
        };
        let timing = spec.timing(&PwmLimits::default())?;
        assert_eq!(timing.master_compare, 6000);
        assert_eq!(timing.pair_a_compare, 5680);
        assert_eq!(timing.pair_b_compare, 4320);
        Ok(())
    }

    #[test]
    fn default_configuration_runs_at_100_khz() -> TestResult {
        let limits = PwmLimits::default();
        let config = WaveformSpec::default().timing(&limits)?.configuration(&limits);
        assert_eq!(config.frequency_hz, 100_000);
        assert_eq!(config.prescaler, Prescaler::Mul16);
        assert_eq!(config.dead_time_tenths, 20);
        Ok(())
    }

    #[test]
    fn oversized_dead_time_is_rejected() {
        let spec = WaveformSpec {
            dead_time: 9000,
            ..WaveformSpec::default()
        };
        assert_eq!(
            spec.timing(&PwmLimits::default()),
            Err(BringUpError::InvalidWaveform {
                reason: "dead time exceeds the half period"
            })
        );
    }

    #[test]
    fn period_outside_window_is_rejected() {
        let spec = WaveformSpec {
            period: 500,
            ..WaveformSpec::default()
        };
        assert!(spec.timing(&PwmLimits::default()).is_err());
    }
}
