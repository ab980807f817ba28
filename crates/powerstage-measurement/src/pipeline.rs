//! Sampling-cycle processing: calibrate, condition, average.

use core::fmt;

use crate::{CalibrationTable, MovingAverage};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Calibrated voltage codes below this are treated as zero.
pub const VOLTAGE_NOISE_FLOOR: u32 = 100;

/// Code of zero current for the mid-rail current sensors.
pub const CURRENT_ZERO_CODE: u32 = 2048;

/// Shift of the per-channel average (4-sample window).
pub const AVERAGE_SHIFT: u8 = 2;

/// One sampling cycle of raw ADC codes, ordered as [`Channel::ALL`].
pub type RawSamples = [u16; 4];

/// A sampled analog channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Channel {
    /// Input voltage.
    Vin,
    /// Input current.
    Iin,
    /// Output voltage.
    Vout,
    /// Output current.
    Iout,
}

impl Channel {
    /// All channels in buffer order.
    pub const ALL: [Channel; 4] = [Channel::Vin, Channel::Iin, Channel::Vout, Channel::Iout];

    /// Whether the channel senses current around mid-rail.
    #[must_use]
    pub const fn is_current(self) -> bool {
        matches!(self, Channel::Iin | Channel::Iout)
    }

    fn condition(self, value: u32) -> u32 {
        if self.is_current() {
            value.max(CURRENT_ZERO_CODE)
        } else if value < VOLTAGE_NOISE_FLOOR {
            0
        } else {
            value
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Vin => "Vin",
            Channel::Iin => "Iin",
            Channel::Vout => "Vout",
            Channel::Iout => "Iout",
        };
        f.write_str(name)
    }
}

/// Instantaneous and averaged value of one channel, in calibrated codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelReading {
    /// Value of the latest sample after calibration and conditioning.
    pub instant: u32,
    /// Moving average.
    pub average: u32,
}

impl ChannelReading {
    const fn flat(code: u32) -> Self {
        Self {
            instant: code,
            average: code,
        }
    }
}

/// Process values of all four channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measurements {
    /// Input voltage.
    pub vin: ChannelReading,
    /// Input current.
    pub iin: ChannelReading,
    /// Output voltage.
    pub vout: ChannelReading,
    /// Output current.
    pub iout: ChannelReading,
}

impl Measurements {
    /// Power-up values: voltages at zero, currents at the zero-current code.
    pub const POWER_UP: Self = Self {
        vin: ChannelReading::flat(0),
        iin: ChannelReading::flat(CURRENT_ZERO_CODE),
        vout: ChannelReading::flat(0),
        iout: ChannelReading::flat(CURRENT_ZERO_CODE),
    };

    /// Reading of `channel`.
    #[must_use]
    pub const fn get(&self, channel: Channel) -> ChannelReading {
        match channel {
            Channel::Vin => self.vin,
            Channel::Iin => self.iin,
            Channel::Vout => self.vout,
            Channel::Iout => self.iout,
        }
    }

    fn set(&mut self, channel: Channel, reading: ChannelReading) {
        match channel {
            Channel::Vin => self.vin = reading,
            Channel::Iin => self.iin = reading,
            Channel::Vout => self.vout = reading,
            Channel::Iout => self.iout = reading,
        }
    }
}

impl Default for Measurements {
    fn default() -> Self {
        Self::POWER_UP
    }
}

/// Converts raw sample buffers into [`Measurements`].
///
/// Runs in the sampling context; every call consumes one complete buffer.
#[derive(Debug, Clone)]
pub struct MeasurementPipeline {
    calibration: CalibrationTable,
    filters: [MovingAverage; 4],
    latest: Measurements,
    samples: u64,
}

impl MeasurementPipeline {
    /// Creates a pipeline with empty averages.
    #[must_use]
    pub fn new(calibration: CalibrationTable) -> Self {
        Self {
            calibration,
            filters: [MovingAverage::new(AVERAGE_SHIFT); 4],
            latest: Measurements::POWER_UP,
            samples: 0,
        }
    }

    /// Processes one sampling cycle and returns the refreshed values.
    pub fn process(&mut self, raw: &RawSamples) -> Measurements {
        let channels = Channel::ALL.iter().zip(raw.iter());
        for ((&channel, &code), filter) in channels.zip(self.filters.iter_mut()) {
            let instant = channel.condition(self.calibration.get(channel).apply(code));
            let average = filter.update(instant);
            self.latest.set(channel, ChannelReading { instant, average });
        }
        self.samples = self.samples.wrapping_add(1);
        self.latest
    }

    /// Values produced by the most recent cycle.
    #[must_use]
    pub const fn latest(&self) -> &Measurements {
        &self.latest
    }

    /// Calibration in use.
    #[must_use]
    pub const fn calibration(&self) -> &CalibrationTable {
        &self.calibration
    }

    /// Number of cycles processed since creation or the last reset.
    #[must_use]
    pub const fn sample_count(&self) -> u64 {
        self.samples
    }

    /// Returns the pipeline to its power-up state.
    pub fn reset(&mut self) {
        self.filters.iter_mut().for_each(MovingAverage::reset);
        self.latest = Measurements::POWER_UP;
        self.samples = 0;
    }
}

impl Default for MeasurementPipeline {
    fn default() -> Self {
        Self::new(CalibrationTable::default())
    }
}
