//! Drives a controller on a simulated timer through a scenario.

use powerstage_control::{
    Controller, ConverterConfig, KeyToggle, OperatingState, TelemetrySnapshot, TickInputs,
};
use powerstage_protection::{ErrorFlags, FaultEvent};
use powerstage_pwm::SimulatedTimer;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::error::SimError;
use crate::scenario::{Expectation, Scenario};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub tick: u64,
    pub from: OperatingState,
    pub to: OperatingState,
}

/// Where one phase left the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseSummary {
    pub label: Option<String>,
    pub first_tick: u64,
    pub last_tick: u64,
    pub end_state: OperatingState,
    pub flags: ErrorFlags,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub scenario: String,
    pub ticks: u64,
    pub final_state: OperatingState,
    pub flags: ErrorFlags,
    pub phases: Vec<PhaseSummary>,
    pub transitions: Vec<Transition>,
    pub fault_events: Vec<FaultEvent>,
    pub hardware_errors: u32,
    pub snapshot: TelemetrySnapshot,
}

pub struct Runner {
    controller: Controller<SimulatedTimer>,
    key: KeyToggle,
}

impl Runner {
    pub fn new(config: ConverterConfig) -> Result<Self, SimError> {
        let key = KeyToggle::new(config.key);
        let controller = Controller::new(SimulatedTimer::new(), config)?;
        Ok(Self { controller, key })
    }

    pub fn run(mut self, scenario: &Scenario) -> RunSummary {
        let _span = info_span!("scenario", name = %scenario.name).entered();
        let mut transitions = Vec::new();
        let mut phases = Vec::with_capacity(scenario.phases.len());
        let mut hardware_errors = 0u32;

        for phase in &scenario.phases {
            debug!(label = ?phase.label, ticks = phase.ticks, "phase start");
            let raw = phase.samples.raw();
            let first_tick = self.controller.ticks().saturating_add(1);
            for _ in 0..phase.ticks {
                let latch = self.key.update(phase.key);
                self.controller.sample(&raw);
                let report = self.controller.tick(TickInputs {
                    start: phase.start.unwrap_or(latch),
                    adjust: phase.adjust.unwrap_or(scenario.adjust),
                });
                if report.transitioned() {
                    transitions.push(Transition {
                        tick: report.tick,
                        from: report.previous,
                        to: report.state,
                    });
                }
                if let Some(err) = report.hardware_error {
                    warn!(tick = report.tick, operation = %err.operation, "timer failure");
                    hardware_errors = hardware_errors.saturating_add(1);
                }
            }
            phases.push(PhaseSummary {
                label: phase.label.clone(),
                first_tick,
                last_tick: self.controller.ticks(),
                end_state: self.controller.state(),
                flags: self.controller.flags(),
            });
        }

        let snapshot = self.controller.snapshot();
        info!(
            ticks = snapshot.tick,
            state = %snapshot.state,
            flags = %snapshot.flags,
            "scenario finished"
        );
        RunSummary {
            scenario: scenario.name.clone(),
            ticks: snapshot.tick,
            final_state: snapshot.state,
            flags: snapshot.flags,
            phases,
            transitions,
            fault_events: self.controller.protection().events().copied().collect(),
            hardware_errors,
            snapshot,
        }
    }
}

/// Compares the end of a run against the scenario's expectation.
pub fn check_expectation(summary: &RunSummary, expect: &Expectation) -> Result<(), SimError> {
    if let Some(state) = expect.state
        && state != summary.final_state
    {
        return Err(SimError::ExpectationFailed(format!(
            "expected final state {state}, got {}",
            summary.final_state
        )));
    }
    if let Some(flags) = expect.flags
        && flags != summary.flags
    {
        return Err(SimError::ExpectationFailed(format!(
            "expected faults [{flags}], got [{}]",
            summary.flags
        )));
    }
    Ok(())
}
