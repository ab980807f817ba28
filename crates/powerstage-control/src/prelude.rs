//! Prelude for convenient imports.
//!
//! ```rust
//! use powerstage_control::prelude::*;
//! ```

pub use crate::{
    Compensator, ControlError, ControlParameters, ControlResult, Controller, ConverterConfig,
    DutyLimits, ErrorIntegrators, KeyToggle, OperatingState, SoftStartState, TelemetrySnapshot,
    TickInputs, TickReport,
};
