//! Shared control parameters and their duty limits.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ControlError, ControlResult};

/// Q12 full scale of a duty value.
pub const DUTY_FULL_SCALE: u32 = 4096;

/// Duty bounds of one topology, in Q12.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DutyRange {
    /// Starting duty and lower bound.
    pub min: u32,
    /// Hardware maximum.
    pub max: u32,
}

impl DutyRange {
    /// `value` clamped into the range.
    #[must_use]
    pub fn clamp(&self, value: u32) -> u32 {
        value.max(self.min).min(self.max)
    }
}

/// Duty bounds of the buck and boost legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DutyLimits {
    /// Buck leg.
    pub buck: DutyRange,
    /// Boost leg.
    pub boost: DutyRange,
}

impl Default for DutyLimits {
    fn default() -> Self {
        Self {
            buck: DutyRange { min: 80, max: 3809 },
            boost: DutyRange { min: 80, max: 2867 },
        }
    }
}

impl DutyLimits {
    /// Checks both ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::InvalidSection`] if a range is empty or
    /// exceeds full scale.
    pub fn validate(&self) -> ControlResult<()> {
        for range in [self.buck, self.boost] {
            if range.min == 0 || range.min >= range.max {
                return Err(ControlError::InvalidSection {
                    section: "duty",
                    reason: "minimum must be non-zero and below the maximum",
                });
            }
            if range.max >= DUTY_FULL_SCALE {
                return Err(ControlError::InvalidSection {
                    section: "duty",
                    reason: "maximum must stay below full scale",
                });
            }
        }
        Ok(())
    }
}

/// Reference and duty values shared with the regulation loop.
///
/// All values are Q12 codes; a reference of 4096 is 68 V.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlParameters {
    /// Output voltage reference.
    pub voref: u32,
    /// Buck duty.
    pub buck_duty: u32,
    /// Buck duty ceiling.
    pub buck_max_duty: u32,
    /// Boost duty.
    pub boost_duty: u32,
    /// Boost duty ceiling.
    pub boost_max_duty: u32,
}

impl ControlParameters {
    /// Power-up values: no reference, duties and ceilings at minimum.
    #[must_use]
    pub const fn initial(limits: &DutyLimits) -> Self {
        Self {
            voref: 0,
            buck_duty: limits.buck.min,
            buck_max_duty: limits.buck.min,
            boost_duty: limits.boost.min,
            boost_max_duty: limits.boost.min,
        }
    }

    /// Stores regulation output, clamped between the minimum duty and the
    /// current ceiling of each leg.
    pub fn set_duties(&mut self, limits: &DutyLimits, buck: u32, boost: u32) {
        self.buck_duty = buck.min(self.buck_max_duty).max(limits.buck.min);
        self.boost_duty = boost.min(self.boost_max_duty).max(limits.boost.min);
    }

    /// Whether both ceilings have reached their hardware maxima.
    #[must_use]
    pub const fn at_full_authority(&self, limits: &DutyLimits) -> bool {
        self.buck_max_duty == limits.buck.max && self.boost_max_duty == limits.boost.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duties_are_bounded_by_the_current_ceiling() {
        let limits = DutyLimits::default();
        let mut params = ControlParameters::initial(&limits);
        params.buck_max_duty = 1000;
        params.boost_max_duty = 500;

        params.set_duties(&limits, 2000, 10);
        assert_eq!(params.buck_duty, 1000);
        assert_eq!(params.boost_duty, 80);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let limits = DutyLimits {
            boost: DutyRange { min: 3000, max: 2867 },
            ..DutyLimits::default()
        };
        assert!(matches!(
            limits.validate(),
            Err(ControlError::InvalidSection { section: "duty", .. })
        ));
        assert_eq!(DutyLimits::default().validate(), Ok(()));
    }
}
