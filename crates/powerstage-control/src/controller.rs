//! The control-tick context: state machine plus everything it drives.

use powerstage_measurement::{MeasurementCell, MeasurementPipeline, Measurements, RawSamples};
use powerstage_protection::{ErrorFlags, ProtectionSystem};
use powerstage_pwm::{HalError, HrTimer, OutputSet, PwmEngine};
use tracing::{debug, info, warn};

use crate::{
    Compensator, ControlParameters, ControlResult, ConverterConfig, ErrorIntegrators,
    OperatingState, ReferenceTracker, SoftStartEngine, SoftStartState, SoftStartStep,
    TelemetrySnapshot,
};

/// External inputs read once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickInputs {
    /// May-run input. Deasserting it in Rise or Run stops the converter.
    pub start: bool,
    /// Raw reference adjust sample.
    pub adjust: u16,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// State at the start of the tick.
    pub previous: OperatingState,
    /// State at the end of the tick.
    pub state: OperatingState,
    /// Faults confirmed during this tick.
    pub tripped: ErrorFlags,
    /// Active faults at the end of the tick.
    pub flags: ErrorFlags,
    /// First timer failure seen during the tick.
    pub hardware_error: Option<HalError>,
}

impl TickReport {
    /// Whether the operating state changed.
    #[must_use]
    pub fn transitioned(&self) -> bool {
        self.previous != self.state
    }
}

/// Owns the PWM engine, protection, measurements and control parameters,
/// and advances the operating state machine once per tick.
///
/// Sampling ([`Controller::sample`]) and ticking ([`Controller::tick`])
/// are independent; a tick reads whatever was published last.
#[derive(Debug)]
pub struct Controller<T: HrTimer, C: Compensator = ErrorIntegrators> {
    config: ConverterConfig,
    pwm: PwmEngine<T>,
    protection: ProtectionSystem,
    pipeline: MeasurementPipeline,
    latest: MeasurementCell,
    measured: Measurements,
    reference: ReferenceTracker,
    soft_start: SoftStartEngine,
    compensator: C,
    params: ControlParameters,
    state: OperatingState,
    wait_ticks: u16,
    ticks: u64,
}

impl<T: HrTimer, C: Compensator + Default> Controller<T, C> {
    /// Validates `config`, brings up the waveform on `timer` and starts in
    /// Init.
    ///
    /// # Errors
    ///
    /// Returns the configuration error, or [`ControlError::BringUp`] if the
    /// timer could not be programmed. In that case the power stage must not
    /// be energised.
    ///
    /// [`ControlError::BringUp`]: crate::ControlError::BringUp
    pub fn new(timer: T, config: ConverterConfig) -> ControlResult<Self> {
        Self::with_compensator(timer, config, C::default())
    }
}

impl<T: HrTimer, C: Compensator> Controller<T, C> {
    /// Like [`Controller::new`] with an explicit compensator.
    ///
    /// # Errors
    ///
    /// See [`Controller::new`].
    pub fn with_compensator(timer: T, config: ConverterConfig, compensator: C) -> ControlResult<Self> {
        config.validate()?;
        let pwm = PwmEngine::initialize_waveform(timer, config.waveform, config.pwm)?;
        let protection = ProtectionSystem::new(config.protection)?;
        Ok(Self {
            pwm,
            protection,
            pipeline: MeasurementPipeline::new(config.calibration),
            latest: MeasurementCell::new(Measurements::POWER_UP),
            measured: Measurements::POWER_UP,
            reference: ReferenceTracker::new(config.reference),
            soft_start: SoftStartEngine::new(config.soft_start),
            compensator,
            params: ControlParameters::initial(&config.duty),
            state: OperatingState::Init,
            wait_ticks: 0,
            ticks: 0,
            config,
        })
    }

    /// Processes one sampling cycle and publishes the result.
    pub fn sample(&mut self, raw: &RawSamples) -> Measurements {
        let m = self.pipeline.process(raw);
        self.latest.publish(&m);
        m
    }

    /// Advances the controller by one 5 ms tick.
    ///
    /// Order: reference tracker, protection monitors, manual stop, then the
    /// active state's handler.
    pub fn tick(&mut self, inputs: TickInputs) -> TickReport {
        self.ticks = self.ticks.wrapping_add(1);
        let previous = self.state;
        match self.latest.load() {
            Some(m) => self.measured = m,
            None => debug!("measurement publish raced the tick, reusing previous values"),
        }
        let m = self.measured;
        let mut hardware_error = None;

        self.params.voref = self
            .reference
            .update(inputs.adjust, m.vin.average, self.params.voref);

        let verdict = self
            .protection
            .evaluate(&m, self.state.protection_phase(), &mut self.pwm);
        hardware_error = hardware_error.or(verdict.stop_error);
        if verdict.enter_err() && self.state != OperatingState::Init {
            self.transition(OperatingState::Err);
        }

        if !inputs.start && self.state.is_energised() {
            hardware_error = hardware_error.or(self.pwm.force_outputs_off().err());
            info!("start input released, stopping");
            self.transition(OperatingState::Wait);
        }

        hardware_error = hardware_error.or(self.dispatch(inputs).err());

        TickReport {
            tick: self.ticks,
            previous,
            state: self.state,
            tripped: verdict.tripped,
            flags: self.protection.flags(),
            hardware_error,
        }
    }

    fn dispatch(&mut self, inputs: TickInputs) -> Result<(), HalError> {
        match self.state {
            OperatingState::Init => {
                self.reinitialize()?;
                self.transition(OperatingState::Wait);
            }
            OperatingState::Wait => {
                self.wait_ticks = self.wait_ticks.saturating_add(1);
                if self.wait_ticks > self.config.wait_hold_ticks {
                    self.wait_ticks = self.config.wait_hold_ticks;
                    self.pwm.start_outputs(OutputSet::GROUP_A)?;
                    if self.protection.flags().is_empty() && inputs.start {
                        self.soft_start.restart();
                        self.transition(OperatingState::Rise);
                    }
                }
            }
            OperatingState::Rise => {
                let step = self.soft_start.step(
                    &mut self.params,
                    &self.config.duty,
                    &mut self.pwm,
                    &mut self.compensator,
                )?;
                if step == SoftStartStep::Complete {
                    self.transition(OperatingState::Run);
                }
            }
            OperatingState::Run => {}
            OperatingState::Err => {
                self.pwm.force_outputs_off()?;
                if self.protection.flags().is_empty() {
                    self.transition(OperatingState::Wait);
                }
            }
        }
        Ok(())
    }

    fn reinitialize(&mut self) -> Result<(), HalError> {
        self.pwm.force_outputs_off()?;
        self.protection.reinitialize();
        self.params = ControlParameters::initial(&self.config.duty);
        self.compensator.reset_error_state();
        debug!("control parameters reset");
        Ok(())
    }

    fn transition(&mut self, next: OperatingState) {
        if next == self.state {
            return;
        }
        if next == OperatingState::Err {
            warn!(from = %self.state, flags = %self.protection.flags(), "entering error state");
        } else {
            info!(from = %self.state, to = %next, "operating state change");
        }
        if next == OperatingState::Wait {
            self.wait_ticks = 0;
        }
        self.state = next;
    }

    /// Stores regulation output. Ignored outside Run.
    ///
    /// Returns whether the duties were applied.
    pub fn apply_duties(&mut self, buck: u32, boost: u32) -> bool {
        if self.state != OperatingState::Run {
            return false;
        }
        self.params.set_duties(&self.config.duty, buck, boost);
        true
    }

    /// Forces the state machine back to Init, as after a power cycle.
    ///
    /// Protection counters, the fault event log and the soft-start ramp
    /// counters start from zero again. Measurement averages are kept.
    pub fn restart(&mut self) {
        self.protection.reset();
        self.soft_start = SoftStartEngine::new(self.config.soft_start);
        self.transition(OperatingState::Init);
    }

    /// Current operating state.
    #[must_use]
    pub const fn state(&self) -> OperatingState {
        self.state
    }

    /// Soft-start sub-state while in Rise.
    #[must_use]
    pub fn soft_start_state(&self) -> Option<SoftStartState> {
        (self.state == OperatingState::Rise).then(|| self.soft_start.state())
    }

    /// Active faults.
    #[must_use]
    pub const fn flags(&self) -> ErrorFlags {
        self.protection.flags()
    }

    /// Reference and duties.
    #[must_use]
    pub const fn parameters(&self) -> &ControlParameters {
        &self.params
    }

    /// Latest published measurements, or those the last tick used if a
    /// publish is racing this read.
    #[must_use]
    pub fn measurements(&self) -> Measurements {
        self.latest.load().unwrap_or(self.measured)
    }

    /// Publish slot read by every tick. Safe to read from another thread.
    #[must_use]
    pub const fn measurement_cell(&self) -> &MeasurementCell {
        &self.latest
    }

    /// The PWM engine, for timing requests between ticks.
    pub fn pwm_mut(&mut self) -> &mut PwmEngine<T> {
        &mut self.pwm
    }

    /// The PWM engine.
    #[must_use]
    pub const fn pwm(&self) -> &PwmEngine<T> {
        &self.pwm
    }

    /// The protection subsystem.
    #[must_use]
    pub const fn protection(&self) -> &ProtectionSystem {
        &self.protection
    }

    /// The soft-start engine.
    #[must_use]
    pub const fn soft_start(&self) -> &SoftStartEngine {
        &self.soft_start
    }

    /// The compensator.
    #[must_use]
    pub const fn compensator(&self) -> &C {
        &self.compensator
    }

    /// Mutable access for the regulation loop.
    pub fn compensator_mut(&mut self) -> &mut C {
        &mut self.compensator
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Ticks since construction.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Read-only view for displays and logs.
    #[must_use]
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot::new(
            self.ticks,
            self.state,
            self.soft_start_state(),
            self.protection.flags(),
            self.measurements(),
            *self.pwm.configuration(),
            self.params,
        )
    }
}
