//! Protection subsystem for the buck/boost power stage.
//!
//! Five independent monitors run every control tick on the latest
//! calibrated samples:
//!
//! | Monitor             | Trip                              | Recovery                 |
//! |---------------------|-----------------------------------|--------------------------|
//! | Short circuit       | Iout high and Vout low, 1 sample  | retry every 2 s, bounded |
//! | Output overcurrent  | Iout high > 10 ticks, Run only    | retry every 2 s, bounded |
//! | Output overvoltage  | Vout high > 2 ticks               | latched                  |
//! | Input undervoltage  | Vin low > 2 ticks, not in Init    | Vin above release > 1 s  |
//! | Input overvoltage   | Vin high > 2 ticks                | latched                  |
//!
//! A trip raises the monitor's [`ErrorFlags`] bit and forces all PWM
//! outputs off in the same tick. Only the owning monitor clears a bit;
//! [`ProtectionSystem::reinitialize`] clears them all.
//!
//! # Example
//!
//! ```rust
//! use powerstage_measurement::{ChannelReading, Measurements};
//! use powerstage_protection::prelude::*;
//! use powerstage_pwm::prelude::*;
//!
//! let mut pwm = PwmEngine::initialize_waveform(
//!     SimulatedTimer::new(),
//!     WaveformSpec::default(),
//!     PwmLimits::default(),
//! )?;
//! let mut protection = ProtectionSystem::new(ProtectionThresholds::default())?;
//!
//! let shorted = Measurements {
//!     vin: ChannelReading { instant: 1500, average: 1500 },
//!     vout: ChannelReading { instant: 10, average: 10 },
//!     iout: ChannelReading { instant: 3500, average: 3500 },
//!     ..Measurements::POWER_UP
//! };
//! let verdict = protection.evaluate(&shorted, ProtectionPhase::Regulating, &mut pwm);
//! assert!(verdict.enter_err());
//! assert!(protection.flags().short_circuit());
//! assert!(pwm.outputs_running().is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod error;
mod faults;
mod monitors;
mod system;
mod thresholds;

pub mod prelude;

pub use error::{ProtectionResult, ThresholdError};
pub use faults::{ErrorFlags, FaultKind, RecoveryPolicy};
pub use monitors::{
    MonitorReport, OvercurrentMonitor, OvervoltageMonitor, Recovery, ShortCircuitMonitor,
    UndervoltageMonitor, VoltageSide,
};
pub use system::{
    FAULT_LOG_CAPACITY, FaultEvent, FaultEventKind, ProtectionPhase, ProtectionSystem,
    ProtectionVerdict,
};
pub use thresholds::ProtectionThresholds;

#[cfg(test)]
mod tests;
