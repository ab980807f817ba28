//! Per-channel affine calibration in Q12 fixed point.

use crate::{Channel, MeasurementError, MeasurementResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unity gain in Q12.
pub const Q12_ONE: u32 = 1 << 12;

/// Largest accepted calibration gain (×4).
pub const MAX_GAIN_Q12: u32 = 4 * Q12_ONE;

/// Largest accepted calibration offset magnitude, in codes.
pub const MAX_OFFSET: i32 = 4096;

/// Affine correction `raw × gain_q12 >> 12 + offset` for one ADC channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelCalibration {
    /// Gain in Q12 (4096 = 1.0).
    pub gain_q12: u32,
    /// Offset added after scaling, in codes.
    pub offset: i32,
}

impl ChannelCalibration {
    /// Pass-through calibration.
    pub const IDENTITY: Self = Self {
        gain_q12: Q12_ONE,
        offset: 0,
    };

    /// Creates a calibration for `channel`.
    ///
    /// # Errors
    ///
    /// Returns an error if the gain is zero or above [`MAX_GAIN_Q12`], or
    /// if the offset magnitude exceeds [`MAX_OFFSET`].
    pub fn new(channel: Channel, gain_q12: u32, offset: i32) -> MeasurementResult<Self> {
        let calibration = Self { gain_q12, offset };
        calibration.validate(channel)?;
        Ok(calibration)
    }

    /// Checks this calibration against the accepted ranges.
    ///
    /// # Errors
    ///
    /// See [`ChannelCalibration::new`].
    pub fn validate(&self, channel: Channel) -> MeasurementResult<()> {
        if self.gain_q12 == 0 || self.gain_q12 > MAX_GAIN_Q12 {
            return Err(MeasurementError::GainOutOfRange {
                channel,
                gain_q12: self.gain_q12,
                max: MAX_GAIN_Q12,
            });
        }
        if self.offset.unsigned_abs() > MAX_OFFSET.unsigned_abs() {
            return Err(MeasurementError::OffsetOutOfRange {
                channel,
                offset: self.offset,
                max: MAX_OFFSET,
            });
        }
        Ok(())
    }

    /// Applies the correction to a raw code.
    ///
    /// A negative result saturates at zero.
    #[must_use]
    pub fn apply(&self, raw: u16) -> u32 {
        let scaled = (u64::from(raw) * u64::from(self.gain_q12)) >> 12;
        let shifted = i64::try_from(scaled).unwrap_or(i64::MAX) + i64::from(self.offset);
        u32::try_from(shifted.max(0)).unwrap_or(u32::MAX)
    }
}

impl Default for ChannelCalibration {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Calibration for all four sampled channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CalibrationTable {
    /// Input voltage.
    pub vin: ChannelCalibration,
    /// Input current.
    pub iin: ChannelCalibration,
    /// Output voltage.
    pub vout: ChannelCalibration,
    /// Output current.
    pub iout: ChannelCalibration,
}

impl CalibrationTable {
    /// Calibration used for `channel`.
    #[must_use]
    pub const fn get(&self, channel: Channel) -> &ChannelCalibration {
        match channel {
            Channel::Vin => &self.vin,
            Channel::Iin => &self.iin,
            Channel::Vout => &self.vout,
            Channel::Iout => &self.iout,
        }
    }

    /// Validates every channel.
    ///
    /// # Errors
    ///
    /// Returns the first channel whose calibration is out of range.
    pub fn validate(&self) -> MeasurementResult<()> {
        Channel::ALL
            .iter()
            .try_for_each(|&channel| self.get(channel).validate(channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn identity_passes_codes_through() {
        for raw in [0u16, 1, 100, 2048, 4095] {
            assert_eq!(ChannelCalibration::IDENTITY.apply(raw), u32::from(raw));
        }
    }

    #[test]
    fn gain_and_offset_apply_in_order() -> TestResult {
        // 1.5 × 1000 = 1500, then +12
        let cal = ChannelCalibration::new(Channel::Vout, 6144, 12)?;
        assert_eq!(cal.apply(1000), 1512);
        Ok(())
    }

    #[test]
    fn scaling_truncates_before_offset() -> TestResult {
        // 3 × 4095 >> 12 = 2 (truncated), then -1
        let cal = ChannelCalibration::new(Channel::Iin, 3, -1)?;
        assert_eq!(cal.apply(4095), 1);
        Ok(())
    }

    #[test]
    fn negative_result_saturates_at_zero() -> TestResult {
        let cal = ChannelCalibration::new(Channel::Vin, Q12_ONE, -50)?;
        assert_eq!(cal.apply(10), 0);
        Ok(())
    }

    #[test]
    fn zero_gain_is_rejected() {
        let result = ChannelCalibration::new(Channel::Iout, 0, 0);
        assert_eq!(
            result,
            Err(MeasurementError::GainOutOfRange {
                channel: Channel::Iout,
                gain_q12: 0,
                max: MAX_GAIN_Q12,
            })
        );
    }

    #[test]
    fn table_validation_reports_offending_channel() {
        let table = CalibrationTable {
            vout: ChannelCalibration {
                gain_q12: Q12_ONE,
                offset: 5000,
            },
            ..CalibrationTable::default()
        };
        assert!(matches!(
            table.validate(),
            Err(MeasurementError::OffsetOutOfRange {
                channel: Channel::Vout,
                ..
            })
        ));
    }
}
