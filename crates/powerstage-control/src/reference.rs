//! Slew-limited output voltage reference.

use powerstage_measurement::{MAX_SHIFT, MovingAverage};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ControlError, ControlResult};

/// Reference tracker settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReferenceConfig {
    /// Reference with the adjust input at zero (4.5 V).
    pub min_reference: u32,
    /// Largest change per tick.
    pub step: u32,
    /// Ceiling as a Q12 fraction of the averaged input voltage (0.85).
    pub ceiling_q12: u32,
    /// Shift of the adjust input average (3 = 8 samples).
    pub adjust_shift: u8,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            min_reference: 271,
            step: 10,
            ceiling_q12: 3482,
            adjust_shift: 3,
        }
    }
}

impl ReferenceConfig {
    /// Checks the tracker can move and the ceiling is a fraction.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::InvalidSection`] on the first problem.
    pub fn validate(&self) -> ControlResult<()> {
        let invalid = |reason| {
            Err(ControlError::InvalidSection {
                section: "reference",
                reason,
            })
        };
        if self.step == 0 {
            return invalid("step must be non-zero");
        }
        if self.ceiling_q12 == 0 || self.ceiling_q12 > 4096 {
            return invalid("ceiling must lie in 1..=4096");
        }
        if self.adjust_shift > MAX_SHIFT {
            return invalid("adjust filter shift too large");
        }
        Ok(())
    }
}

/// Moves the reference toward `min_reference + adjust` by at most one
/// step per tick, then caps it at a fraction of the input voltage.
#[derive(Debug, Clone)]
pub struct ReferenceTracker {
    config: ReferenceConfig,
    adjust: MovingAverage,
}

impl ReferenceTracker {
    /// Creates a tracker with an empty adjust filter.
    #[must_use]
    pub const fn new(config: ReferenceConfig) -> Self {
        Self {
            config,
            adjust: MovingAverage::new(config.adjust_shift),
        }
    }

    /// Feeds one raw adjust sample and returns the next reference.
    pub fn update(&mut self, adjust_raw: u16, vin_average: u32, voref: u32) -> u32 {
        let target = self
            .config
            .min_reference
            .saturating_add(self.adjust.update(u32::from(adjust_raw)));
        let step = self.config.step;

        let next = if target > voref.saturating_add(step) {
            voref.saturating_add(step)
        } else if target < voref.saturating_sub(step) {
            voref.saturating_sub(step)
        } else {
            target
        };
        next.min(self.ceiling(vin_average))
    }

    /// Largest reference the input voltage allows.
    #[must_use]
    pub fn ceiling(&self, vin_average: u32) -> u32 {
        let scaled = u64::from(vin_average) * u64::from(self.config.ceiling_q12) >> 12;
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }

    /// Averaged adjust input.
    #[must_use]
    pub const fn adjust_average(&self) -> u32 {
        self.adjust.value()
    }

    /// Settings in use.
    #[must_use]
    pub const fn config(&self) -> &ReferenceConfig {
        &self.config
    }
}
