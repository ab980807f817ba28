//! Read-only view for displays and logs.

use core::fmt;

use powerstage_measurement::Measurements;
use powerstage_measurement::units::{code_to_centivolts, current_code_to_centiamps};
use powerstage_protection::ErrorFlags;
use powerstage_pwm::PwmConfiguration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ControlParameters, OperatingState, SoftStartState};

/// Status LEDs lit for an operating state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndicatorPattern {
    /// Green LED.
    pub green: bool,
    /// Yellow LED.
    pub yellow: bool,
    /// Red LED.
    pub red: bool,
}

impl IndicatorPattern {
    /// Pattern shown in `state`.
    #[must_use]
    pub const fn for_state(state: OperatingState) -> Self {
        let (green, yellow, red) = match state {
            OperatingState::Init | OperatingState::Wait => (true, true, true),
            OperatingState::Rise => (true, true, false),
            OperatingState::Run => (true, false, false),
            OperatingState::Err => (false, false, true),
        };
        Self { green, yellow, red }
    }
}

impl fmt::Display for IndicatorPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lit = [(self.green, 'G'), (self.yellow, 'Y'), (self.red, 'R')];
        for (on, name) in lit {
            write!(f, "{}", if on { name } else { '-' })?;
        }
        Ok(())
    }
}

/// Snapshot of the controller taken between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TelemetrySnapshot {
    /// Ticks since construction.
    pub tick: u64,
    /// Operating state.
    pub state: OperatingState,
    /// Soft-start sub-state while in Rise.
    pub soft_start: Option<SoftStartState>,
    /// Active faults.
    pub flags: ErrorFlags,
    /// Latest measurements.
    pub measurements: Measurements,
    /// PWM timing in effect.
    pub pwm: PwmConfiguration,
    /// Reference and duties.
    pub parameters: ControlParameters,
    /// Status LEDs.
    pub indicators: IndicatorPattern,
    /// Averaged output voltage.
    pub vout_centivolts: u32,
    /// Averaged output current.
    pub iout_centiamps: u32,
}

impl TelemetrySnapshot {
    pub(crate) fn new(
        tick: u64,
        state: OperatingState,
        soft_start: Option<SoftStartState>,
        flags: ErrorFlags,
        measurements: Measurements,
        pwm: PwmConfiguration,
        parameters: ControlParameters,
    ) -> Self {
        Self {
            tick,
            state,
            soft_start,
            flags,
            measurements,
            pwm,
            parameters,
            indicators: IndicatorPattern::for_state(state),
            vout_centivolts: code_to_centivolts(measurements.vout.average),
            iout_centiamps: current_code_to_centiamps(measurements.iout.average),
        }
    }
}
