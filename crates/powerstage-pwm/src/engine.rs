//! The PWM timing engine.
//!
//! Compare usage per channel timer:
//!
//! | Unit | Role                                                             |
//! |------|------------------------------------------------------------------|
//! | Cmp1 | reset point of TA1/TB1, half-period minus dead-time at bring-up  |
//! | Cmp2 | reset point of TA2/TB2                                           |
//!
//! Compare 2 has three writers: the pair B duty (same value on both timers),
//! a frequency change (half-period on both timers) and a dead-time change
//! (`dt` on timer A, `period - dt` on timer B). The last write wins.
//!
//! Master compare 1 holds the half-period phase offset of timer B.

use tracing::{debug, error, info, warn};

use crate::{
    BringUpError, ChannelPair, CompareUnit, HalError, HalResult, HrTimer, OutputConfig, OutputSet,
    PwmConfiguration, PwmError, PwmLimits, PwmResult, ResetTrigger, TimeBase, TimerSet, TimerUnit,
    WaveformSpec, WaveformTiming, waveform::BRING_UP_PRESCALER,
};

/// Direction of a single manual adjustment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Increase.
    Up,
    /// Decrease.
    Down,
}

/// Translates frequency, dead-time and duty requests into timer programming.
///
/// An engine exists only after the waveform topology has been fully
/// established by [`PwmEngine::initialize_waveform`]. It is the sole
/// writer of the timer; other components read [`PwmEngine::configuration`].
#[derive(Debug)]
pub struct PwmEngine<T: HrTimer> {
    timer: T,
    limits: PwmLimits,
    config: PwmConfiguration,
    running: OutputSet,
}

impl<T: HrTimer> PwmEngine<T> {
    /// Programs the four-channel waveform and starts all outputs and counters.
    ///
    /// Timer A restarts on the master period and timer B on master compare
    /// 1, so both channel timers share a period with a fixed phase offset.
    /// TA1/TB1 end their active phase on compare 1, TA2/TB2 on compare 2.
    ///
    /// # Errors
    ///
    /// Any failure is fatal. The engine attempts to stop all outputs before
    /// returning, and the caller must not energise the power stage.
    pub fn initialize_waveform(
        mut timer: T,
        spec: WaveformSpec,
        limits: PwmLimits,
    ) -> Result<Self, BringUpError> {
        limits.validate()?;
        let timing = spec.timing(&limits)?;

        if let Err(err) = program_waveform(&mut timer, &timing) {
            error!(operation = %err.operation, "waveform bring-up failed, disabling outputs");
            if let Err(stop) = timer.stop_outputs(OutputSet::ALL) {
                error!(operation = %stop.operation, "could not disable outputs after failed bring-up");
            }
            return Err(BringUpError::Hardware(err));
        }

        let config = timing.configuration(&limits);
        info!(
            frequency_hz = config.frequency_hz,
            period = config.period,
            "PWM waveform established"
        );
        Ok(Self {
            timer,
            limits,
            config,
            running: OutputSet::ALL,
        })
    }

    /// Changes the switching frequency of both channel timers.
    ///
    /// Selects ×16 at or above the prescaler switch point and ×8 below it,
    /// programs the new period and a half-period compare into both timers,
    /// then restarts them together. Requesting the current frequency again
    /// reprograms the same values.
    ///
    /// # Errors
    ///
    /// Rejects frequencies outside the window and derived periods outside
    /// the tick window without touching the timer. On a timer failure the
    /// previous period and compare are reprogrammed and the recorded
    /// configuration stays unchanged.
    pub fn configure_frequency(&mut self, frequency_hz: u32) -> PwmResult<()> {
        let limits = &self.limits;
        if !(limits.min_frequency_hz..=limits.max_frequency_hz).contains(&frequency_hz) {
            return Err(PwmError::FrequencyOutOfRange {
                requested_hz: frequency_hz,
                min_hz: limits.min_frequency_hz,
                max_hz: limits.max_frequency_hz,
            });
        }

        let prescaler = limits.prescaler_for(frequency_hz);
        let period = limits.count_clock_hz(prescaler) / u64::from(frequency_hz);
        let Some(period) = u32::try_from(period)
            .ok()
            .filter(|&p| limits.accepts_period(p))
        else {
            return Err(PwmError::PeriodOutOfRange {
                period,
                min: limits.min_period,
                max: limits.max_period,
            });
        };

        let base = TimeBase { period, prescaler };
        let midpoint = (period / 2).saturating_sub(1);
        if let Err(err) = self.program_frequency(base, Edges::both(midpoint)) {
            let previous = TimeBase {
                period: self.config.period,
                prescaler: self.config.prescaler,
            };
            warn!(operation = %err.operation, frequency_hz, "frequency change failed, restoring previous timing");
            let restored = Edges {
                a: self.config.pair_b_compare,
                b: self.config.tb2_compare,
            };
            if let Err(restore) = self.program_frequency(previous, restored) {
                error!(operation = %restore.operation, "could not restore previous timing");
            }
            return Err(err.into());
        }

        self.config.frequency_hz = frequency_hz;
        self.config.period = period;
        self.config.prescaler = prescaler;
        self.config.pair_b_compare = midpoint;
        self.config.tb2_compare = midpoint;
        debug!(frequency_hz, period, %prescaler, "switching frequency changed");
        Ok(())
    }

    /// Sets the dead-time in tenths of a percent of the period (0..=50 by default).
    ///
    /// Moves the TA2/TB2 reset points: TA2 resets at `dt` and TB2 at
    /// `period - dt`. Both channel timers are then restarted together.
    /// This replaces the pair B duty until the next duty or frequency
    /// request rewrites compare 2.
    ///
    /// # Errors
    ///
    /// Rejects values above the configured maximum. On a timer failure the
    /// previous reset points are reprogrammed.
    pub fn set_dead_time_manual(&mut self, tenths: u16) -> PwmResult<()> {
        if tenths > self.limits.max_dead_time_tenths {
            return Err(PwmError::DeadTimeOutOfRange {
                requested_tenths: tenths,
                max_tenths: self.limits.max_dead_time_tenths,
            });
        }

        let ticks = proportion(self.config.period, u32::from(tenths), 1000);
        let edges = Edges {
            a: ticks,
            b: self.config.period.saturating_sub(ticks),
        };
        let previous = Edges {
            a: self.config.pair_b_compare,
            b: self.config.tb2_compare,
        };
        if let Err(err) = self.program_dead_time(edges) {
            warn!(operation = %err.operation, tenths, "dead-time change failed, restoring previous edges");
            if let Err(restore) = self.program_dead_time(previous) {
                error!(operation = %restore.operation, "could not restore previous dead-time");
            }
            return Err(err.into());
        }

        self.config.dead_time_tenths = tenths;
        self.config.dead_time_ticks = ticks;
        self.config.pair_b_compare = edges.a;
        self.config.tb2_compare = edges.b;
        debug!(tenths, ticks, "dead-time changed");
        Ok(())
    }

    /// Sets the duty of TA1/TB1 (5..=95 % by default).
    ///
    /// # Errors
    ///
    /// See [`PwmEngine::set_duty_cycle`].
    pub fn set_duty_cycle_pair_a(&mut self, percent: u8) -> PwmResult<u32> {
        self.set_duty_cycle(ChannelPair::A, percent)
    }

    /// Sets the duty of TA2/TB2 (5..=45 % by default).
    ///
    /// # Errors
    ///
    /// See [`PwmEngine::set_duty_cycle`].
    pub fn set_duty_cycle_pair_b(&mut self, percent: u8) -> PwmResult<u32> {
        self.set_duty_cycle(ChannelPair::B, percent)
    }

    /// Programs `period × percent / 100` into both channels of `pair` and
    /// returns the compare value.
    ///
    /// # Errors
    ///
    /// Rejects values outside the pair's duty window. On a timer failure
    /// the previous compare value is reprogrammed.
    pub fn set_duty_cycle(&mut self, pair: ChannelPair, percent: u8) -> PwmResult<u32> {
        let window = self.limits.duty_window(pair);
        if !window.contains(percent) {
            return Err(PwmError::DutyOutOfRange {
                pair,
                requested_percent: percent,
                min_percent: window.min_percent,
                max_percent: window.max_percent,
            });
        }

        let compare = proportion(self.config.period, u32::from(percent), 100);
        let previous = match pair {
            ChannelPair::A => Edges::both(self.config.pair_a_compare),
            ChannelPair::B => Edges {
                a: self.config.pair_b_compare,
                b: self.config.tb2_compare,
            },
        };
        if let Err(err) = self.program_pair(pair, Edges::both(compare)) {
            warn!(operation = %err.operation, %pair, percent, "duty change failed, restoring previous compare");
            if let Err(restore) = self.program_pair(pair, previous) {
                error!(operation = %restore.operation, %pair, "could not restore previous duty");
            }
            return Err(err.into());
        }

        match pair {
            ChannelPair::A => self.config.pair_a_compare = compare,
            ChannelPair::B => {
                self.config.pair_b_compare = compare;
                self.config.tb2_compare = compare;
            }
        }
        debug!(%pair, percent, compare, "duty changed");
        Ok(compare)
    }

    /// Moves the frequency by 0.1 % (at least 1 Hz), clamped to the window.
    ///
    /// Returns the frequency in effect afterwards. At the window edge the
    /// request is a no-op.
    ///
    /// # Errors
    ///
    /// See [`PwmEngine::configure_frequency`].
    pub fn nudge_frequency(&mut self, step: Step) -> PwmResult<u32> {
        let current = self.config.frequency_hz;
        let delta = (current / 1000).max(1);
        let target = match step {
            Step::Up if current < self.limits.max_frequency_hz => {
                current.saturating_add(delta).min(self.limits.max_frequency_hz)
            }
            Step::Down if current > self.limits.min_frequency_hz => {
                current.saturating_sub(delta).max(self.limits.min_frequency_hz)
            }
            _ => return Ok(current),
        };
        self.configure_frequency(target)?;
        Ok(target)
    }

    /// Moves the dead-time by one tenth of a percent within `0..=max`.
    ///
    /// Returns the dead-time in effect afterwards.
    ///
    /// # Errors
    ///
    /// See [`PwmEngine::set_dead_time_manual`].
    pub fn nudge_dead_time(&mut self, step: Step) -> PwmResult<u16> {
        let current = self.config.dead_time_tenths;
        let target = match step {
            Step::Up if current < self.limits.max_dead_time_tenths => current + 1,
            Step::Down if current > 0 => current - 1,
            _ => return Ok(current),
        };
        self.set_dead_time_manual(target)?;
        Ok(target)
    }

    /// Enables the outputs of `outputs` that are not already running.
    ///
    /// # Errors
    ///
    /// Returns the timer error; the running set is unchanged in that case.
    pub fn start_outputs(&mut self, outputs: OutputSet) -> HalResult<()> {
        let missing = outputs.difference(self.running);
        if missing.is_empty() {
            return Ok(());
        }
        self.timer.start_outputs(missing)?;
        self.running.insert(missing);
        debug!(outputs = ?missing, "outputs enabled");
        Ok(())
    }

    /// Disables `outputs`. The stop is always issued to the timer.
    ///
    /// # Errors
    ///
    /// Returns the timer error; the running set is unchanged in that case.
    pub fn stop_outputs(&mut self, outputs: OutputSet) -> HalResult<()> {
        self.timer.stop_outputs(outputs)?;
        if self.running.intersects(outputs) {
            debug!(outputs = ?self.running.intersection(outputs), "outputs disabled");
        }
        self.running.remove(outputs);
        Ok(())
    }

    /// Disables all four outputs.
    ///
    /// # Errors
    ///
    /// Returns the timer error after logging it.
    pub fn force_outputs_off(&mut self) -> HalResult<()> {
        self.stop_outputs(OutputSet::ALL).inspect_err(|err| {
            error!(operation = %err.operation, "failed to force outputs off");
        })
    }

    /// Outputs currently enabled.
    #[must_use]
    pub const fn outputs_running(&self) -> OutputSet {
        self.running
    }

    /// Timing currently programmed.
    #[must_use]
    pub const fn configuration(&self) -> &PwmConfiguration {
        &self.config
    }

    /// Limits requests are validated against.
    #[must_use]
    pub const fn limits(&self) -> &PwmLimits {
        &self.limits
    }

    /// Read access to the timer.
    #[must_use]
    pub const fn timer(&self) -> &T {
        &self.timer
    }

    /// Mutable access to the timer, for fault injection on simulated targets.
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Consumes the engine and returns the timer.
    pub fn into_timer(self) -> T {
        self.timer
    }

    fn program_frequency(&mut self, base: TimeBase, pair_b: Edges) -> HalResult<()> {
        self.timer.configure_time_base(TimerUnit::A, base)?;
        self.timer.configure_time_base(TimerUnit::B, base)?;
        self.program_pair(ChannelPair::B, pair_b)?;
        self.timer.software_reset(TimerSet::CHANNELS)
    }

    fn program_dead_time(&mut self, pair_b: Edges) -> HalResult<()> {
        self.program_pair(ChannelPair::B, pair_b)?;
        self.timer.software_reset(TimerSet::CHANNELS)?;
        self.timer.start_counters(TimerSet::CHANNELS)
    }

    fn program_pair(&mut self, pair: ChannelPair, edges: Edges) -> HalResult<()> {
        let unit = compare_unit(pair);
        self.timer.configure_compare(TimerUnit::A, unit, edges.a)?;
        self.timer.configure_compare(TimerUnit::B, unit, edges.b)
    }
}

/// Reset points of one channel pair on timers A and B.
#[derive(Debug, Clone, Copy)]
struct Edges {
    a: u32,
    b: u32,
}

impl Edges {
    const fn both(compare: u32) -> Self {
        Self {
            a: compare,
            b: compare,
        }
    }
}

const fn compare_unit(pair: ChannelPair) -> CompareUnit {
    match pair {
        ChannelPair::A => CompareUnit::Cmp1,
        ChannelPair::B => CompareUnit::Cmp2,
    }
}

fn proportion(period: u32, numerator: u32, denominator: u32) -> u32 {
    let value = u64::from(period) * u64::from(numerator) / u64::from(denominator);
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn program_waveform<T: HrTimer>(timer: &mut T, timing: &WaveformTiming) -> Result<(), HalError> {
    let base = TimeBase {
        period: timing.period,
        prescaler: BRING_UP_PRESCALER,
    };

    timer.calibrate()?;
    timer.configure_time_base(TimerUnit::Master, base)?;
    timer.configure_compare(TimerUnit::Master, CompareUnit::Cmp1, timing.master_compare)?;

    timer.configure_time_base(TimerUnit::A, base)?;
    timer.configure_reset_trigger(TimerUnit::A, ResetTrigger::MasterPeriod)?;
    timer.configure_reset_trigger(TimerUnit::B, ResetTrigger::MasterCompare1)?;
    timer.configure_compare(TimerUnit::A, CompareUnit::Cmp1, timing.pair_a_compare)?;
    timer.configure_compare(TimerUnit::A, CompareUnit::Cmp2, timing.pair_b_compare)?;

    let pair_a = OutputConfig {
        reset_on: compare_unit(ChannelPair::A),
    };
    let pair_b = OutputConfig {
        reset_on: compare_unit(ChannelPair::B),
    };
    timer.configure_output(OutputSet::TA1, pair_a)?;
    timer.configure_output(OutputSet::TB1, pair_a)?;
    timer.configure_output(OutputSet::TA2, pair_b)?;
    timer.configure_output(OutputSet::TB2, pair_b)?;

    timer.configure_time_base(TimerUnit::B, base)?;
    timer.configure_compare(TimerUnit::B, CompareUnit::Cmp1, timing.pair_a_compare)?;
    timer.configure_compare(TimerUnit::B, CompareUnit::Cmp2, timing.pair_b_compare)?;

    timer.start_outputs(OutputSet::ALL)?;
    timer.start_counters(TimerSet::MASTER | TimerSet::CHANNELS)
}
