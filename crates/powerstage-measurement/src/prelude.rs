//! Prelude for convenient imports.
//!
//! ```rust
//! use powerstage_measurement::prelude::*;
//! ```

pub use crate::{
    CalibrationTable, Channel, ChannelCalibration, ChannelReading, MeasurementCell,
    MeasurementError, MeasurementPipeline, MeasurementResult, Measurements, MovingAverage,
    RawSamples,
};
