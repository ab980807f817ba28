//! Hardware limits and the live PWM configuration record.

use core::fmt;

use crate::{LimitsError, Prescaler};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Inclusive duty window of one channel pair, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DutyWindow {
    /// Smallest accepted duty.
    pub min_percent: u8,
    /// Largest accepted duty.
    pub max_percent: u8,
}

impl DutyWindow {
    /// Whether `percent` lies inside the window.
    #[must_use]
    pub const fn contains(&self, percent: u8) -> bool {
        percent >= self.min_percent && percent <= self.max_percent
    }
}

/// Channel pair addressed by a duty request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChannelPair {
    /// TA1/TB1, reset on compare 1 of each timer.
    A,
    /// TA2/TB2, reset on compare 2 of each timer.
    B,
}

impl fmt::Display for ChannelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelPair::A => f.write_str("TA1/TB1"),
            ChannelPair::B => f.write_str("TA2/TB2"),
        }
    }
}

/// Limits the timing engine validates every request against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PwmLimits {
    /// Timer input clock before the prescaler.
    pub base_clock_hz: u32,
    /// Lowest accepted switching frequency.
    pub min_frequency_hz: u32,
    /// Highest accepted switching frequency.
    pub max_frequency_hz: u32,
    /// Frequencies at or above this use the ×16 prescaler, below it ×8.
    pub high_prescaler_from_hz: u32,
    /// Smallest accepted period in counter ticks.
    pub min_period: u32,
    /// Largest accepted period in counter ticks.
    pub max_period: u32,
    /// Largest dead-time, in tenths of a percent of the period.
    pub max_dead_time_tenths: u16,
    /// Duty window of TA1/TB1.
    pub pair_a_duty: DutyWindow,
    /// Duty window of TA2/TB2.
    pub pair_b_duty: DutyWindow,
}

impl PwmLimits {
    /// Prescaler selected for `frequency_hz`.
    #[must_use]
    pub const fn prescaler_for(&self, frequency_hz: u32) -> Prescaler {
        if frequency_hz >= self.high_prescaler_from_hz {
            Prescaler::Mul16
        } else {
            Prescaler::Mul8
        }
    }

    /// Counter clock produced by `prescaler`.
    #[must_use]
    pub fn count_clock_hz(&self, prescaler: Prescaler) -> u64 {
        u64::from(self.base_clock_hz) * u64::from(prescaler.multiplier())
    }

    /// Duty window of `pair`.
    #[must_use]
    pub const fn duty_window(&self, pair: ChannelPair) -> DutyWindow {
        match pair {
            ChannelPair::A => self.pair_a_duty,
            ChannelPair::B => self.pair_b_duty,
        }
    }

    /// Whether `period` lies inside the accepted period window.
    #[must_use]
    pub const fn accepts_period(&self, period: u32) -> bool {
        period >= self.min_period && period <= self.max_period
    }

    /// Checks the limits for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns a [`LimitsError`] naming the first inconsistency.
    pub fn validate(&self) -> Result<(), LimitsError> {
        let invalid = |reason| Err(LimitsError { reason });
        if self.base_clock_hz == 0 {
            return invalid("base clock must be non-zero");
        }
        if self.min_frequency_hz == 0 || self.min_frequency_hz > self.max_frequency_hz {
            return invalid("frequency window is empty");
        }
        if self.min_period == 0 || self.min_period > self.max_period {
            return invalid("period window is empty");
        }
        if self.max_dead_time_tenths > 1000 {
            return invalid("dead-time cannot exceed the period");
        }
        for window in [self.pair_a_duty, self.pair_b_duty] {
            if window.min_percent > window.max_percent || window.max_percent > 100 {
                return invalid("duty window must lie within 0..=100 percent");
            }
        }
        Ok(())
    }
}

impl Default for PwmLimits {
    fn default() -> Self {
        Self {
            base_clock_hz: 100_000_000,
            min_frequency_hz: 70_000,
            max_frequency_hz: 130_000,
            high_prescaler_from_hz: 100_000,
            min_period: 1000,
            max_period: 16_000,
            max_dead_time_tenths: 50,
            pair_a_duty: DutyWindow {
                min_percent: 5,
                max_percent: 95,
            },
            pair_b_duty: DutyWindow {
                min_percent: 5,
                max_percent: 45,
            },
        }
    }
}

/// Timing currently programmed into the channel timers.
///
/// Owned by [`PwmEngine`](crate::PwmEngine); everything else reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PwmConfiguration {
    /// Switching frequency.
    pub frequency_hz: u32,
    /// Period in counter ticks.
    pub period: u32,
    /// Counter clock multiplier.
    pub prescaler: Prescaler,
    /// Dead-time in tenths of a percent of the period.
    pub dead_time_tenths: u16,
    /// Dead-time in counter ticks.
    pub dead_time_ticks: u32,
    /// Reset point of TA1/TB1.
    pub pair_a_compare: u32,
    /// Reset point of TA2.
    pub pair_b_compare: u32,
    /// Reset point of TB2. Differs from `pair_b_compare` only after a
    /// dead-time change, which places it at `period - dt`.
    pub tb2_compare: u32,
}

impl PwmConfiguration {
    /// Duty of `pair` in tenths of a percent.
    #[must_use]
    pub fn duty_tenths(&self, pair: ChannelPair) -> u32 {
        let compare = match pair {
            ChannelPair::A => self.pair_a_compare,
            ChannelPair::B => self.pair_b_compare,
        };
        if self.period == 0 {
            return 0;
        }
        let tenths = u64::from(compare) * 1000 / u64::from(self.period);
        u32::try_from(tenths).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_are_consistent() {
        assert!(PwmLimits::default().validate().is_ok());
    }

    #[test]
    fn prescaler_switches_at_100_khz() {
        let limits = PwmLimits::default();
        assert_eq!(limits.prescaler_for(99_999), Prescaler::Mul8);
        assert_eq!(limits.prescaler_for(100_000), Prescaler::Mul16);
        assert_eq!(limits.count_clock_hz(Prescaler::Mul16), 1_600_000_000);
    }

    #[test]
    fn inverted_duty_window_is_rejected() {
        let limits = PwmLimits {
            pair_b_duty: DutyWindow {
                min_percent: 50,
                max_percent: 45,
            },
            ..PwmLimits::default()
        };
        assert_eq!(
            limits.validate(),
            Err(LimitsError {
                reason: "duty window must lie within 0..=100 percent"
            })
        );
    }

    #[test]
    fn duty_tenths_from_compare() {
        let config = PwmConfiguration {
            frequency_hz: 100_000,
            period: 16_000,
            prescaler: Prescaler::Mul16,
            dead_time_tenths: 20,
            dead_time_ticks: 320,
            pair_a_compare: 7680,
            pair_b_compare: 5760,
            tb2_compare: 5760,
        };
        assert_eq!(config.duty_tenths(ChannelPair::A), 480);
        assert_eq!(config.duty_tenths(ChannelPair::B), 360);
    }
}
