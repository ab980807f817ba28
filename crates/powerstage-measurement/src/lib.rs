//! Measurement pipeline for the power stage control core.
//!
//! Turns the four raw ADC codes sampled every PWM-synchronous cycle
//! (input voltage, input current, output voltage, output current) into
//! calibrated instantaneous values and smoothed averages.
//!
//! # Pipeline
//!
//! ```text
//! raw code ──► calibrate (raw × K >> 12 + B) ──► condition ──► moving average
//!                                                  │
//!                          voltages: < 100  → 0    │
//!                          currents: < 2048 → 2048 │
//! ```
//!
//! All values stay in the 12-bit fixed-point code space. Physical units
//! are only produced at the telemetry edge, see [`units`].
//!
//! # Example
//!
//! ```rust
//! use powerstage_measurement::{CalibrationTable, MeasurementPipeline};
//!
//! let mut pipeline = MeasurementPipeline::new(CalibrationTable::default());
//! let m = pipeline.process(&[1200, 2100, 900, 2300]);
//! assert_eq!(m.vin.instant, 1200);
//! assert_eq!(m.vin.average, 300);
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod calibration;
mod error;
mod filter;
mod pipeline;
mod shared;
pub mod units;

pub mod prelude;

pub use calibration::{CalibrationTable, ChannelCalibration, MAX_GAIN_Q12, MAX_OFFSET, Q12_ONE};
pub use error::{MeasurementError, MeasurementResult};
pub use filter::{MAX_SHIFT, MovingAverage};
pub use pipeline::{
    AVERAGE_SHIFT, CURRENT_ZERO_CODE, Channel, ChannelReading, MeasurementPipeline, Measurements,
    RawSamples, VOLTAGE_NOISE_FLOOR,
};
pub use shared::MeasurementCell;
