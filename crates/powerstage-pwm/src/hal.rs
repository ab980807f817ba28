//! Hardware timer capability.
//!
//! The engine drives the timer exclusively through [`HrTimer`]. A board
//! support crate implements it on top of the vendor HAL; host builds use
//! [`SimulatedTimer`](crate::SimulatedTimer).

use core::fmt;

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A timer unit of the high-resolution timer block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimerUnit {
    /// Master timer, the phase reference of both channel timers.
    Master,
    /// Timer A, owner of outputs TA1 and TA2.
    A,
    /// Timer B, owner of outputs TB1 and TB2.
    B,
}

impl TimerUnit {
    /// Timer-set bit of this unit.
    #[must_use]
    pub const fn as_set(self) -> TimerSet {
        match self {
            TimerUnit::Master => TimerSet::MASTER,
            TimerUnit::A => TimerSet::TIMER_A,
            TimerUnit::B => TimerSet::TIMER_B,
        }
    }
}

/// A compare unit within a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CompareUnit {
    /// Compare 1.
    Cmp1,
    /// Compare 2.
    Cmp2,
    /// Compare 3.
    Cmp3,
    /// Compare 4.
    Cmp4,
}

/// Counter clock multiplier relative to the timer input clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Prescaler {
    /// ×8.
    Mul8,
    /// ×16.
    Mul16,
}

impl Prescaler {
    /// Multiplication factor.
    #[must_use]
    pub const fn multiplier(self) -> u32 {
        match self {
            Prescaler::Mul8 => 8,
            Prescaler::Mul16 => 16,
        }
    }
}

impl fmt::Display for Prescaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.multiplier())
    }
}

/// Period and clocking of one timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBase {
    /// Period in counter ticks.
    pub period: u32,
    /// Counter clock multiplier.
    pub prescaler: Prescaler,
}

/// Event that restarts a channel timer's counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTrigger {
    /// The master timer period event.
    MasterPeriod,
    /// The master timer compare 1 event.
    MasterCompare1,
}

/// Set/reset sources of one output.
///
/// Outputs are set on their timer's period event and reset on a compare
/// event of the same timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Compare event that ends the active phase.
    pub reset_on: CompareUnit,
}

bitflags! {
    /// A set of PWM outputs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct OutputSet: u8 {
        /// Timer A, output 1.
        const TA1 = 0b0001;
        /// Timer A, output 2.
        const TA2 = 0b0010;
        /// Timer B, output 1.
        const TB1 = 0b0100;
        /// Timer B, output 2.
        const TB2 = 0b1000;
        /// Both outputs of timer A.
        const GROUP_A = Self::TA1.bits() | Self::TA2.bits();
        /// Both outputs of timer B.
        const GROUP_B = Self::TB1.bits() | Self::TB2.bits();
        /// All four outputs.
        const ALL = Self::GROUP_A.bits() | Self::GROUP_B.bits();
    }
}

bitflags! {
    /// A set of timer units.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TimerSet: u8 {
        /// Master timer.
        const MASTER = 0b001;
        /// Timer A.
        const TIMER_A = 0b010;
        /// Timer B.
        const TIMER_B = 0b100;
        /// Both channel timers.
        const CHANNELS = Self::TIMER_A.bits() | Self::TIMER_B.bits();
    }
}

/// Timer operation that failed, for error reporting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HalOperation {
    /// Delay-line calibration.
    Calibrate,
    /// Time base programming.
    ConfigureTimeBase,
    /// Compare programming.
    ConfigureCompare,
    /// Reset trigger selection.
    ConfigureResetTrigger,
    /// Output set/reset source programming.
    ConfigureOutput,
    /// Synchronised counter reset.
    SoftwareReset,
    /// Counter start.
    StartCounters,
    /// Output enable.
    StartOutputs,
    /// Output disable.
    StopOutputs,
}

impl fmt::Display for HalOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HalOperation::Calibrate => "calibrate",
            HalOperation::ConfigureTimeBase => "configure time base",
            HalOperation::ConfigureCompare => "configure compare",
            HalOperation::ConfigureResetTrigger => "configure reset trigger",
            HalOperation::ConfigureOutput => "configure output",
            HalOperation::SoftwareReset => "software reset",
            HalOperation::StartCounters => "start counters",
            HalOperation::StopOutputs => "stop outputs",
            HalOperation::StartOutputs => "start outputs",
        };
        f.write_str(name)
    }
}

/// A timer call reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("timer operation '{operation}' failed")]
pub struct HalError {
    /// Operation that failed.
    pub operation: HalOperation,
}

impl HalError {
    /// Creates an error for `operation`.
    #[must_use]
    pub const fn new(operation: HalOperation) -> Self {
        Self { operation }
    }
}

/// Result type for timer calls.
pub type HalResult<T> = Result<T, HalError>;

/// Register-level access to the high-resolution timer block.
///
/// All calls are synchronous and bounded.
pub trait HrTimer {
    /// Runs the delay-line calibration and waits for it to finish.
    fn calibrate(&mut self) -> HalResult<()>;

    /// Programs period and prescaler of `timer`. The counter runs continuously.
    fn configure_time_base(&mut self, timer: TimerUnit, base: TimeBase) -> HalResult<()>;

    /// Programs compare `unit` of `timer`.
    fn configure_compare(&mut self, timer: TimerUnit, unit: CompareUnit, value: u32)
    -> HalResult<()>;

    /// Selects the event that restarts the counter of a channel timer.
    fn configure_reset_trigger(&mut self, timer: TimerUnit, trigger: ResetTrigger)
    -> HalResult<()>;

    /// Programs set/reset sources of a single output.
    fn configure_output(&mut self, output: OutputSet, config: OutputConfig) -> HalResult<()>;

    /// Restarts the counters of `timers` in the same clock cycle.
    fn software_reset(&mut self, timers: TimerSet) -> HalResult<()>;

    /// Starts the counters of `timers`.
    fn start_counters(&mut self, timers: TimerSet) -> HalResult<()>;

    /// Enables `outputs`.
    fn start_outputs(&mut self, outputs: OutputSet) -> HalResult<()>;

    /// Disables `outputs`, driving them to their inactive level.
    fn stop_outputs(&mut self, outputs: OutputSet) -> HalResult<()>;
}
