//! PWM timing engine for a four-channel complementary power stage.
//!
//! The engine owns the high-resolution timer and turns frequency, dead-time
//! and duty requests into validated register programming. Requests outside
//! the hardware limits are rejected and leave the running configuration
//! untouched.
//!
//! # Waveform topology
//!
//! ```text
//!            ┌──────── period ────────┐
//! master  ───┴────────────┬───────────┴──── compare 1 = half period
//! timer A ─ reset on master period
//!           TA1 ▔▔▔▔▔▔▔▔▔▁▁▁  (reset on A.cmp1)
//!           TA2 ▔▔▔▔▔▔▁▁▁▁▁▁  (reset on A.cmp2)
//! timer B ─ reset on master compare 1 (half-period phase shift)
//!           TB1, TB2 mirror TA1, TA2
//! ```
//!
//! # Example
//!
//! ```rust
//! use powerstage_pwm::prelude::*;
//!
//! let mut engine = PwmEngine::initialize_waveform(
//!     SimulatedTimer::new(),
//!     WaveformSpec::default(),
//!     PwmLimits::default(),
//! )?;
//! engine.configure_frequency(80_000)?;
//! assert_eq!(engine.configuration().period, 10_000);
//! assert!(engine.configure_frequency(140_000).is_err());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod config;
mod engine;
mod error;
mod hal;
mod sim;
mod waveform;

pub mod prelude;

pub use config::{ChannelPair, DutyWindow, PwmConfiguration, PwmLimits};
pub use engine::{PwmEngine, Step};
pub use error::{BringUpError, LimitsError, PwmError, PwmResult};
pub use hal::{
    CompareUnit, HalError, HalOperation, HalResult, HrTimer, OutputConfig, OutputSet, Prescaler,
    ResetTrigger, TimeBase, TimerSet, TimerUnit,
};
pub use sim::{OutputRegisters, SimulatedTimer, TimerRegisters};
pub use waveform::{WAVEFORM_SCALE, WaveformSpec, WaveformTiming};
