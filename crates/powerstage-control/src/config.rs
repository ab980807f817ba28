//! Converter configuration.

use powerstage_measurement::CalibrationTable;
use powerstage_protection::ProtectionThresholds;
use powerstage_pwm::{PwmLimits, WaveformSpec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ControlResult, DutyLimits, KeyConfig, ReferenceConfig, SoftStartConfig};

/// Everything needed to build a [`Controller`](crate::Controller).
///
/// Every section defaults to the firmware constants. With the `serde`
/// feature, missing sections and fields fall back to those defaults, so a
/// partial YAML file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConverterConfig {
    /// Protection thresholds.
    pub protection: ProtectionThresholds,
    /// PWM hardware limits.
    pub pwm: PwmLimits,
    /// Bring-up waveform.
    pub waveform: WaveformSpec,
    /// Soft-start timing.
    pub soft_start: SoftStartConfig,
    /// Buck/boost duty bounds.
    pub duty: DutyLimits,
    /// Reference tracker.
    pub reference: ReferenceConfig,
    /// Ticks in Wait before outputs are started (1 s).
    pub wait_hold_ticks: u16,
    /// ADC calibration.
    pub calibration: CalibrationTable,
    /// Start/stop key debounce.
    pub key: KeyConfig,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            protection: ProtectionThresholds::default(),
            pwm: PwmLimits::default(),
            waveform: WaveformSpec::default(),
            soft_start: SoftStartConfig::default(),
            duty: DutyLimits::default(),
            reference: ReferenceConfig::default(),
            wait_hold_ticks: 200,
            calibration: CalibrationTable::default(),
            key: KeyConfig::default(),
        }
    }
}

impl ConverterConfig {
    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns the first section error found. The bring-up waveform is
    /// checked against the PWM limits as well.
    pub fn validate(&self) -> ControlResult<()> {
        self.protection.validate()?;
        self.pwm.validate()?;
        self.waveform.timing(&self.pwm)?;
        self.soft_start.validate()?;
        self.duty.validate()?;
        self.reference.validate()?;
        self.calibration.validate()?;
        Ok(())
    }
}
