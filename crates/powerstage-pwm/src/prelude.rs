//! Prelude for convenient imports.
//!
//! ```rust
//! use powerstage_pwm::prelude::*;
//! ```

pub use crate::{
    BringUpError, ChannelPair, HalError, HalOperation, HrTimer, OutputSet, Prescaler,
    PwmConfiguration, PwmEngine, PwmError, PwmLimits, PwmResult, SimulatedTimer, Step, TimerSet,
    TimerUnit, WaveformSpec,
};
