//! Host-side timer that records every programming call.

use crate::{
    CompareUnit, HalError, HalOperation, HalResult, HrTimer, OutputConfig, OutputSet,
    ResetTrigger, TimeBase, TimerSet, TimerUnit,
};

/// Register image of one simulated timer unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerRegisters {
    /// Programmed time base.
    pub time_base: Option<TimeBase>,
    /// Compare 1 to 4.
    pub compare: [u32; 4],
    /// Counter reset source.
    pub reset_trigger: Option<ResetTrigger>,
    /// Whether the counter is running.
    pub counting: bool,
    /// Number of software resets applied.
    pub resets: u32,
}

impl TimerRegisters {
    /// Value of compare `unit`.
    #[must_use]
    pub fn compare(&self, unit: CompareUnit) -> u32 {
        self.compare
            .get(compare_index(unit))
            .copied()
            .unwrap_or_default()
    }
}

/// Set/reset programming of the four outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputRegisters {
    /// TA1.
    pub ta1: Option<OutputConfig>,
    /// TA2.
    pub ta2: Option<OutputConfig>,
    /// TB1.
    pub tb1: Option<OutputConfig>,
    /// TB2.
    pub tb2: Option<OutputConfig>,
}

/// [`HrTimer`] implementation backed by plain registers.
///
/// Supports failure injection per [`HalOperation`], either once or
/// persistently, to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct SimulatedTimer {
    master: TimerRegisters,
    timer_a: TimerRegisters,
    timer_b: TimerRegisters,
    outputs: OutputRegisters,
    running: OutputSet,
    calibrated: bool,
    start_calls: u32,
    stop_calls: u32,
    fail_once: Option<HalOperation>,
    fail_always: Option<HalOperation>,
}

impl SimulatedTimer {
    /// Creates a timer with all registers cleared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call of `operation` fail.
    pub fn fail_next(&mut self, operation: HalOperation) {
        self.fail_once = Some(operation);
    }

    /// Makes every call of `operation` fail until [`SimulatedTimer::heal`].
    pub fn fail_always(&mut self, operation: HalOperation) {
        self.fail_always = Some(operation);
    }

    /// Clears all injected failures.
    pub fn heal(&mut self) {
        self.fail_once = None;
        self.fail_always = None;
    }

    /// Registers of `timer`.
    #[must_use]
    pub const fn registers(&self, timer: TimerUnit) -> &TimerRegisters {
        match timer {
            TimerUnit::Master => &self.master,
            TimerUnit::A => &self.timer_a,
            TimerUnit::B => &self.timer_b,
        }
    }

    /// Output set/reset programming.
    #[must_use]
    pub const fn outputs(&self) -> &OutputRegisters {
        &self.outputs
    }

    /// Outputs currently enabled.
    #[must_use]
    pub const fn running_outputs(&self) -> OutputSet {
        self.running
    }

    /// Whether calibration has completed.
    #[must_use]
    pub const fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// Number of successful output start calls.
    #[must_use]
    pub const fn start_calls(&self) -> u32 {
        self.start_calls
    }

    /// Number of successful output stop calls.
    #[must_use]
    pub const fn stop_calls(&self) -> u32 {
        self.stop_calls
    }

    fn check(&mut self, operation: HalOperation) -> HalResult<()> {
        if self.fail_always == Some(operation) || self.fail_once.take_if(|op| *op == operation).is_some() {
            return Err(HalError::new(operation));
        }
        Ok(())
    }

    fn registers_mut(&mut self, timer: TimerUnit) -> &mut TimerRegisters {
        match timer {
            TimerUnit::Master => &mut self.master,
            TimerUnit::A => &mut self.timer_a,
            TimerUnit::B => &mut self.timer_b,
        }
    }

    fn for_each_timer(&mut self, timers: TimerSet, mut f: impl FnMut(&mut TimerRegisters)) {
        for unit in [TimerUnit::Master, TimerUnit::A, TimerUnit::B] {
            if timers.contains(unit.as_set()) {
                f(self.registers_mut(unit));
            }
        }
    }
}

impl HrTimer for SimulatedTimer {
    fn calibrate(&mut self) -> HalResult<()> {
        self.check(HalOperation::Calibrate)?;
        self.calibrated = true;
        Ok(())
    }

    fn configure_time_base(&mut self, timer: TimerUnit, base: TimeBase) -> HalResult<()> {
        self.check(HalOperation::ConfigureTimeBase)?;
        self.registers_mut(timer).time_base = Some(base);
        Ok(())
    }

    fn configure_compare(
        &mut self,
        timer: TimerUnit,
        unit: CompareUnit,
        value: u32,
    ) -> HalResult<()> {
        self.check(HalOperation::ConfigureCompare)?;
        if let Some(slot) = self.registers_mut(timer).compare.get_mut(compare_index(unit)) {
            *slot = value;
        }
        Ok(())
    }

    fn configure_reset_trigger(
        &mut self,
        timer: TimerUnit,
        trigger: ResetTrigger,
    ) -> HalResult<()> {
        self.check(HalOperation::ConfigureResetTrigger)?;
        if timer == TimerUnit::Master {
            return Err(HalError::new(HalOperation::ConfigureResetTrigger));
        }
        self.registers_mut(timer).reset_trigger = Some(trigger);
        Ok(())
    }

    fn configure_output(&mut self, output: OutputSet, config: OutputConfig) -> HalResult<()> {
        self.check(HalOperation::ConfigureOutput)?;
        let slots = [
            (OutputSet::TA1, &mut self.outputs.ta1),
            (OutputSet::TA2, &mut self.outputs.ta2),
            (OutputSet::TB1, &mut self.outputs.tb1),
            (OutputSet::TB2, &mut self.outputs.tb2),
        ];
        for (flag, slot) in slots {
            if output.contains(flag) {
                *slot = Some(config);
            }
        }
        Ok(())
    }

    fn software_reset(&mut self, timers: TimerSet) -> HalResult<()> {
        self.check(HalOperation::SoftwareReset)?;
        self.for_each_timer(timers, |regs| regs.resets += 1);
        Ok(())
    }

    fn start_counters(&mut self, timers: TimerSet) -> HalResult<()> {
        self.check(HalOperation::StartCounters)?;
        self.for_each_timer(timers, |regs| regs.counting = true);
        Ok(())
    }

    fn start_outputs(&mut self, outputs: OutputSet) -> HalResult<()> {
        self.check(HalOperation::StartOutputs)?;
        self.running.insert(outputs);
        self.start_calls += 1;
        Ok(())
    }

    fn stop_outputs(&mut self, outputs: OutputSet) -> HalResult<()> {
        self.check(HalOperation::StopOutputs)?;
        self.running.remove(outputs);
        self.stop_calls += 1;
        Ok(())
    }
}

const fn compare_index(unit: CompareUnit) -> usize {
    match unit {
        CompareUnit::Cmp1 => 0,
        CompareUnit::Cmp2 => 1,
        CompareUnit::Cmp3 => 2,
        CompareUnit::Cmp4 => 3,
    }
}
