//! Soft-start ramp from outputs-off to full duty authority.

use powerstage_pwm::{HalResult, HrTimer, OutputSet, PwmEngine};
use tracing::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Compensator, ControlError, ControlParameters, ControlResult, DutyLimits, SoftStartState};

/// Soft-start timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SoftStartConfig {
    /// Ticks spent in SSWait before ramping (100 ms).
    pub hold_ticks: u16,
    /// Multiplier of the per-tick ceiling increment.
    pub ramp_step: u32,
}

impl Default for SoftStartConfig {
    fn default() -> Self {
        Self {
            hold_ticks: 20,
            ramp_step: 5,
        }
    }
}

impl SoftStartConfig {
    /// Checks the ramp can make progress.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::InvalidSection`] for a zero ramp step.
    pub fn validate(&self) -> ControlResult<()> {
        if self.ramp_step == 0 {
            return Err(ControlError::InvalidSection {
                section: "soft-start",
                reason: "ramp step must be non-zero",
            });
        }
        Ok(())
    }
}

/// Outcome of one soft-start step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftStartStep {
    /// Still ramping, now in the given sub-state.
    InProgress(SoftStartState),
    /// Both ceilings reached their maxima; the engine is back at SSInit.
    Complete,
}

/// Drives [`SoftStartState`] while the converter is in Rise.
///
/// In SSRun each leg's ceiling grows by `ramp × step` where `ramp` counts
/// SSRun ticks, so the increment itself grows every tick. The ramp counters
/// live as long as the engine: a later soft-start continues the increment
/// where the previous one stopped and therefore reaches full authority in
/// fewer ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftStartEngine {
    config: SoftStartConfig,
    state: SoftStartState,
    hold: u16,
    buck_ramp: u32,
    boost_ramp: u32,
}

impl SoftStartEngine {
    /// Creates an engine at SSInit.
    #[must_use]
    pub const fn new(config: SoftStartConfig) -> Self {
        Self {
            config,
            state: SoftStartState::SsInit,
            hold: 0,
            buck_ramp: 0,
            boost_ramp: 0,
        }
    }

    /// Returns to SSInit with a cleared hold counter. Called on every Rise
    /// entry. The ramp counters are kept.
    pub fn restart(&mut self) {
        self.state = SoftStartState::SsInit;
        self.hold = 0;
    }

    /// Current sub-state.
    #[must_use]
    pub const fn state(&self) -> SoftStartState {
        self.state
    }

    /// Ticks counted in SSWait.
    #[must_use]
    pub const fn hold_ticks(&self) -> u16 {
        self.hold
    }

    /// Ramp counters of the buck and boost legs.
    #[must_use]
    pub const fn ramp_counters(&self) -> (u32, u32) {
        (self.buck_ramp, self.boost_ramp)
    }

    /// Runs one tick of the active sub-state.
    ///
    /// # Errors
    ///
    /// A failing output stop or start leaves the sub-state unchanged so the
    /// step is repeated on the next tick.
    pub fn step<T: HrTimer, C: Compensator>(
        &mut self,
        params: &mut ControlParameters,
        limits: &DutyLimits,
        pwm: &mut PwmEngine<T>,
        compensator: &mut C,
    ) -> HalResult<SoftStartStep> {
        match self.state {
            SoftStartState::SsInit => {
                pwm.stop_outputs(OutputSet::ALL)?;
                params.buck_max_duty = limits.buck.min;
                params.boost_max_duty = limits.boost.min;
                compensator.reset_error_state();
                self.enter(SoftStartState::SsWait);
            }
            SoftStartState::SsWait => {
                self.hold = self.hold.saturating_add(1);
                if self.hold > self.config.hold_ticks {
                    self.hold = 0;
                    *params = ControlParameters {
                        voref: params.voref >> 1,
                        ..ControlParameters::initial(limits)
                    };
                    compensator.reset_error_state();
                    self.enter(SoftStartState::SsRun);
                }
            }
            SoftStartState::SsRun => {
                if !pwm.outputs_running().contains(OutputSet::ALL) {
                    compensator.reset_error_state();
                    pwm.start_outputs(OutputSet::ALL)?;
                }
                self.buck_ramp = self.buck_ramp.saturating_add(1);
                self.boost_ramp = self.boost_ramp.saturating_add(1);
                params.buck_max_duty = ramp(params.buck_max_duty, self.buck_ramp, self.config.ramp_step)
                    .min(limits.buck.max);
                params.boost_max_duty =
                    ramp(params.boost_max_duty, self.boost_ramp, self.config.ramp_step)
                        .min(limits.boost.max);
                debug!(
                    buck_max = params.buck_max_duty,
                    boost_max = params.boost_max_duty,
                    "soft-start ramp"
                );

                if params.at_full_authority(limits) {
                    info!(ramp_ticks = self.buck_ramp, "soft-start complete");
                    self.state = SoftStartState::SsInit;
                    return Ok(SoftStartStep::Complete);
                }
            }
        }
        Ok(SoftStartStep::InProgress(self.state))
    }

    fn enter(&mut self, next: SoftStartState) {
        info!(from = %self.state, to = %next, "soft-start state change");
        self.state = next;
    }
}

fn ramp(ceiling: u32, counter: u32, step: u32) -> u32 {
    ceiling.saturating_add(counter.saturating_mul(step))
}
