//! Control core of a buck/boost power stage.
//!
//! [`Controller`] is the context object of the 5 ms control tick. It owns
//! the [`PwmEngine`](powerstage_pwm::PwmEngine), the
//! [`ProtectionSystem`](powerstage_protection::ProtectionSystem), the
//! measurement pipeline and the shared [`ControlParameters`], and sequences
//! the converter through [`OperatingState`]:
//!
//! - **Init** stops the outputs, clears flags and parameters.
//! - **Wait** holds for one second, then waits for the start input.
//! - **Rise** runs the [`SoftStartEngine`] until both duty ceilings are at
//!   their maxima.
//! - **Run** leaves regulation to the external compensator.
//! - **Err** keeps the outputs off until every fault flag has cleared.
//!
//! # Example
//!
//! ```rust
//! use powerstage_control::prelude::*;
//! use powerstage_pwm::SimulatedTimer;
//!
//! let mut controller: Controller<SimulatedTimer> =
//!     Controller::new(SimulatedTimer::new(), ConverterConfig::default())?;
//! controller.sample(&[1500, 2100, 0, 2048]);
//!
//! let report = controller.tick(TickInputs { start: true, adjust: 0 });
//! assert_eq!(report.state, OperatingState::Wait);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod compensator;
mod config;
mod controller;
mod error;
mod key;
mod params;
mod reference;
mod soft_start;
mod state;
mod telemetry;

pub mod prelude;

pub use compensator::{Compensator, ErrorIntegrators};
pub use config::ConverterConfig;
pub use controller::{Controller, TickInputs, TickReport};
pub use error::{ControlError, ControlResult};
pub use key::{KeyConfig, KeyToggle};
pub use params::{ControlParameters, DUTY_FULL_SCALE, DutyLimits, DutyRange};
pub use reference::{ReferenceConfig, ReferenceTracker};
pub use soft_start::{SoftStartConfig, SoftStartEngine, SoftStartStep};
pub use state::{OperatingState, SoftStartState};
pub use telemetry::{IndicatorPattern, TelemetrySnapshot};
