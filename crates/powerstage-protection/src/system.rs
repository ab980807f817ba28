//! Protection coordinator: runs the monitors every tick and forces the
//! outputs off on a trip.

use heapless::Deque;
use powerstage_measurement::Measurements;
use powerstage_pwm::{HalError, HrTimer, PwmEngine};
use tracing::{info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    ErrorFlags, FaultKind, MonitorReport, OvercurrentMonitor, OvervoltageMonitor,
    ProtectionResult, ProtectionThresholds, Recovery, ShortCircuitMonitor, UndervoltageMonitor,
    VoltageSide,
};

/// Capacity of the fault event log.
pub const FAULT_LOG_CAPACITY: usize = 32;

/// Operating phase as seen by the monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProtectionPhase {
    /// Initialisation: undervoltage is disarmed.
    Initializing,
    /// Any non-regulating phase after initialisation.
    Standby,
    /// Regulating: overcurrent is armed.
    Regulating,
}

/// What happened to a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FaultEventKind {
    /// Flag raised.
    Tripped,
    /// Flag cleared by an automatic retry.
    Retried {
        /// Retry number, starting at 1.
        attempt: u8,
    },
    /// Retries used up, outputs held off.
    RetriesExhausted,
    /// Flag cleared after the signal recovered.
    Recovered,
}

/// Entry of the fault event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FaultEvent {
    /// Evaluation tick, counted from construction.
    pub tick: u64,
    /// Fault concerned.
    pub fault: FaultKind,
    /// Transition.
    pub kind: FaultEventKind,
}

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProtectionVerdict {
    /// Faults whose condition was confirmed this tick.
    pub tripped: ErrorFlags,
    /// Outputs were forced off this tick.
    pub outputs_forced_off: bool,
    /// The timer rejected the forced stop.
    pub stop_error: Option<HalError>,
}

impl ProtectionVerdict {
    /// Whether the operating state must move to Err.
    #[must_use]
    pub const fn enter_err(&self) -> bool {
        !self.tripped.is_empty()
    }
}

/// The protection subsystem.
///
/// Owns the threshold table, the five monitors and the shared
/// [`ErrorFlags`]. Evaluated once per control tick.
#[derive(Debug)]
pub struct ProtectionSystem {
    thresholds: ProtectionThresholds,
    flags: ErrorFlags,
    short_circuit: ShortCircuitMonitor,
    overcurrent: OvercurrentMonitor,
    output_overvoltage: OvervoltageMonitor,
    undervoltage: UndervoltageMonitor,
    input_overvoltage: OvervoltageMonitor,
    events: Deque<FaultEvent, FAULT_LOG_CAPACITY>,
    tick: u64,
}

impl ProtectionSystem {
    /// Creates the subsystem with cleared flags and counters.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency in `thresholds`.
    pub fn new(thresholds: ProtectionThresholds) -> ProtectionResult<Self> {
        thresholds.validate()?;
        Ok(Self {
            thresholds,
            flags: ErrorFlags::EMPTY,
            short_circuit: ShortCircuitMonitor::new(),
            overcurrent: OvercurrentMonitor::new(),
            output_overvoltage: OvervoltageMonitor::new(VoltageSide::Output),
            undervoltage: UndervoltageMonitor::new(),
            input_overvoltage: OvervoltageMonitor::new(VoltageSide::Input),
            events: Deque::new(),
            tick: 0,
        })
    }

    /// Runs all five monitors against `m`.
    ///
    /// Any trip or exhausted retry forces every output off through `pwm`
    /// before returning. A failing stop is logged and reported in the
    /// verdict; the flags are raised regardless.
    pub fn evaluate<T: HrTimer>(
        &mut self,
        m: &Measurements,
        phase: ProtectionPhase,
        pwm: &mut PwmEngine<T>,
    ) -> ProtectionVerdict {
        self.tick = self.tick.wrapping_add(1);
        let before = self.flags;
        let th = self.thresholds;

        let reports = [
            (
                FaultKind::ShortCircuit,
                self.short_circuit.check(m, &th, &mut self.flags),
            ),
            (
                FaultKind::OutputOvercurrent,
                self.overcurrent.check(
                    m,
                    phase == ProtectionPhase::Regulating,
                    &th,
                    &mut self.flags,
                ),
            ),
            (
                FaultKind::OutputOvervoltage,
                self.output_overvoltage.check(m, &th, &mut self.flags),
            ),
            (
                FaultKind::InputUndervoltage,
                self.undervoltage.check(
                    m,
                    phase != ProtectionPhase::Initializing,
                    &th,
                    &mut self.flags,
                ),
            ),
            (
                FaultKind::InputOvervoltage,
                self.input_overvoltage.check(m, &th, &mut self.flags),
            ),
        ];

        let mut verdict = ProtectionVerdict::default();
        for (fault, report) in reports {
            self.record(fault, &report, before);
            if report.tripped {
                verdict.tripped.raise(fault);
            }
            verdict.outputs_forced_off |= report.hold_off;
        }

        if verdict.outputs_forced_off {
            verdict.stop_error = pwm.force_outputs_off().err();
        }
        verdict
    }

    fn record(&mut self, fault: FaultKind, report: &MonitorReport, before: ErrorFlags) {
        if report.tripped && !before.contains(fault) {
            warn!(fault = %fault, tick = self.tick, "protection tripped, outputs off");
            self.push(fault, FaultEventKind::Tripped);
        }
        match report.recovery {
            Some(Recovery::Retried { attempt }) => {
                info!(fault = %fault, attempt, "fault retry, flag cleared");
                self.push(fault, FaultEventKind::Retried { attempt });
            }
            Some(Recovery::Exhausted) => {
                warn!(fault = %fault, "retries exhausted, outputs held off until reset");
                self.push(fault, FaultEventKind::RetriesExhausted);
            }
            Some(Recovery::Released) => {
                info!(fault = %fault, "fault recovered, flag cleared");
                self.push(fault, FaultEventKind::Recovered);
            }
            None => {}
        }
    }

    fn push(&mut self, fault: FaultKind, kind: FaultEventKind) {
        if self.events.is_full() {
            self.events.pop_front();
        }
        let event = FaultEvent {
            tick: self.tick,
            fault,
            kind,
        };
        if self.events.push_back(event).is_err() {
            warn!("fault log rejected an event");
        }
    }

    /// Clears all flags, as the Init state does. Counters keep running.
    pub fn reinitialize(&mut self) {
        if !self.flags.is_empty() {
            info!(flags = %self.flags, "error flags cleared by reinitialisation");
        }
        self.flags = ErrorFlags::EMPTY;
    }

    /// Clears flags, monitor counters and the event log, as at power-up.
    pub fn reset(&mut self) {
        self.flags = ErrorFlags::EMPTY;
        self.short_circuit.reset();
        self.overcurrent.reset();
        self.output_overvoltage.reset();
        self.undervoltage.reset();
        self.input_overvoltage.reset();
        self.events.clear();
        self.tick = 0;
    }

    /// Active faults.
    #[must_use]
    pub const fn flags(&self) -> ErrorFlags {
        self.flags
    }

    /// Threshold table in use.
    #[must_use]
    pub const fn thresholds(&self) -> &ProtectionThresholds {
        &self.thresholds
    }

    /// Number of evaluations since construction or reset.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.tick
    }

    /// Short-circuit monitor state.
    #[must_use]
    pub const fn short_circuit(&self) -> &ShortCircuitMonitor {
        &self.short_circuit
    }

    /// Output overcurrent monitor state.
    #[must_use]
    pub const fn overcurrent(&self) -> &OvercurrentMonitor {
        &self.overcurrent
    }

    /// Output overvoltage monitor state.
    #[must_use]
    pub const fn output_overvoltage(&self) -> &OvervoltageMonitor {
        &self.output_overvoltage
    }

    /// Input undervoltage monitor state.
    #[must_use]
    pub const fn undervoltage(&self) -> &UndervoltageMonitor {
        &self.undervoltage
    }

    /// Input overvoltage monitor state.
    #[must_use]
    pub const fn input_overvoltage(&self) -> &OvervoltageMonitor {
        &self.input_overvoltage
    }

    /// Logged fault events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &FaultEvent> {
        self.events.iter()
    }

    /// Most recent fault event.
    #[must_use]
    pub fn last_event(&self) -> Option<&FaultEvent> {
        self.events.back()
    }
}
