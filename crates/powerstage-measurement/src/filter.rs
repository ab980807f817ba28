//! Shift-based exponential moving average.

/// Largest supported filter shift (time constant of 2^15 samples).
pub const MAX_SHIFT: u8 = 15;

/// Single-pole exponential moving average over `2^shift` samples.
///
/// Each update performs `sum += sample - (sum >> shift)` and reports
/// `sum >> shift`. A constant input converges exactly to that input.
///
/// # RT Safety
///
/// - No allocations
/// - Bounded execution time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct MovingAverage {
    sum: u32,
    shift: u8,
}

impl MovingAverage {
    /// Creates an empty filter. `shift` is clamped to [`MAX_SHIFT`].
    #[must_use]
    pub const fn new(shift: u8) -> Self {
        let shift = if shift > MAX_SHIFT { MAX_SHIFT } else { shift };
        Self { sum: 0, shift }
    }

    /// Feeds one sample and returns the updated average.
    #[inline]
    pub fn update(&mut self, sample: u32) -> u32 {
        self.sum = (self.sum - (self.sum >> self.shift)).saturating_add(sample);
        self.value()
    }

    /// Current average.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.sum >> self.shift
    }

    /// Filter shift.
    #[must_use]
    pub const fn shift(&self) -> u8 {
        self.shift
    }

    /// Clears the accumulator.
    pub fn reset(&mut self) {
        self.sum = 0;
    }
}
