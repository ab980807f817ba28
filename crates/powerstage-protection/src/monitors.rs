//! The five fault monitors.
//!
//! Each monitor owns its counters and raises or clears only its own flag.
//! All counters compare strictly against their window, so a debounce of
//! `n` trips on the `n + 1`-th consecutive tick.

use powerstage_measurement::Measurements;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ErrorFlags, FaultKind, ProtectionThresholds};

/// Recovery progress reported by a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Recovery {
    /// The flag was cleared by an automatic retry.
    Retried {
        /// Retry number, starting at 1.
        attempt: u8,
    },
    /// No retries remain; outputs stay off until reset.
    Exhausted,
    /// The flag was cleared after the signal recovered.
    Released,
}

/// Outcome of one monitor evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonitorReport {
    /// The fault condition was confirmed this tick.
    pub tripped: bool,
    /// Outputs must be forced off this tick.
    pub hold_off: bool,
    /// Recovery step taken this tick.
    pub recovery: Option<Recovery>,
}

impl MonitorReport {
    fn trip(&mut self) {
        self.tripped = true;
        self.hold_off = true;
    }
}

/// Counts consecutive ticks and fires once the count exceeds a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Counter(u16);

impl Counter {
    fn advance(&mut self, window: u16) -> bool {
        self.0 = self.0.saturating_add(1);
        if self.0 > window {
            self.0 = 0;
            true
        } else {
            false
        }
    }

    fn clear(&mut self) {
        self.0 = 0;
    }
}

/// Bounded retry counter shared by the short-circuit and overcurrent monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Retries {
    count: u8,
    exhausted: bool,
}

impl Retries {
    fn exhaust(&mut self, report: &mut MonitorReport, thresholds: &ProtectionThresholds) {
        self.count = thresholds.exhausted_retries();
        report.hold_off = true;
        if !self.exhausted {
            self.exhausted = true;
            report.recovery = Some(Recovery::Exhausted);
        }
    }
}

/// Short-circuit monitor: single-sample trip, retry every window.
///
/// The retry clears the flag without re-checking the fault condition. Once
/// more than `retry_limit` retries have been spent the flag stays raised
/// and outputs are held off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShortCircuitMonitor {
    retry_window: Counter,
    retries: Retries,
}

impl ShortCircuitMonitor {
    /// Creates a monitor with cleared counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            retry_window: Counter(0),
            retries: Retries {
                count: 0,
                exhausted: false,
            },
        }
    }

    /// Evaluates one tick.
    pub fn check(
        &mut self,
        m: &Measurements,
        thresholds: &ProtectionThresholds,
        flags: &mut ErrorFlags,
    ) -> MonitorReport {
        let mut report = MonitorReport::default();
        if m.iout.instant > thresholds.short_circuit_current
            && m.vout.instant < thresholds.short_circuit_voltage
        {
            flags.raise(FaultKind::ShortCircuit);
            report.trip();
        }

        if flags.short_circuit() && self.retry_window.advance(thresholds.retry_window_ticks) {
            if self.retries.count > thresholds.retry_limit {
                self.retries.exhaust(&mut report, thresholds);
            } else {
                self.retries.count = self.retries.count.saturating_add(1);
                flags.clear(FaultKind::ShortCircuit);
                report.recovery = Some(Recovery::Retried {
                    attempt: self.retries.count,
                });
            }
        }
        report
    }

    /// Ticks elapsed in the current retry window.
    #[must_use]
    pub const fn retry_ticks(&self) -> u16 {
        self.retry_window.0
    }

    /// Retries spent, saturating at `retry_limit + 1`.
    #[must_use]
    pub const fn retries(&self) -> u8 {
        self.retries.count
    }

    /// Clears all counters, as at power-up.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Output overcurrent monitor, armed only while regulating.
///
/// The retry window only runs while the current stays above the limit. A
/// drop below the limit restarts the window but leaves the flag raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OvercurrentMonitor {
    debounce: Counter,
    retry_window: Counter,
    retries: Retries,
}

impl OvercurrentMonitor {
    /// Creates a monitor with cleared counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            debounce: Counter(0),
            retry_window: Counter(0),
            retries: Retries {
                count: 0,
                exhausted: false,
            },
        }
    }

    /// Evaluates one tick. `regulating` arms the trip.
    pub fn check(
        &mut self,
        m: &Measurements,
        regulating: bool,
        thresholds: &ProtectionThresholds,
        flags: &mut ErrorFlags,
    ) -> MonitorReport {
        let mut report = MonitorReport::default();
        let over = m.iout.instant > thresholds.overcurrent;

        if over && regulating {
            if self.debounce.advance(thresholds.overcurrent_debounce_ticks) {
                flags.raise(FaultKind::OutputOvercurrent);
                report.trip();
            }
        } else {
            self.debounce.clear();
        }

        if !flags.output_overcurrent() || !over {
            self.retry_window.clear();
        } else if self.retry_window.advance(thresholds.retry_window_ticks) {
            self.retries.count = self.retries.count.saturating_add(1);
            if self.retries.count > thresholds.retry_limit {
                self.retries.exhaust(&mut report, thresholds);
            } else {
                flags.clear(FaultKind::OutputOvercurrent);
                report.recovery = Some(Recovery::Retried {
                    attempt: self.retries.count,
                });
            }
        }
        report
    }

    /// Consecutive over-limit ticks while regulating.
    #[must_use]
    pub const fn debounce_ticks(&self) -> u16 {
        self.debounce.0
    }

    /// Ticks elapsed in the current retry window.
    #[must_use]
    pub const fn retry_ticks(&self) -> u16 {
        self.retry_window.0
    }

    /// Retries spent, saturating at `retry_limit + 1`.
    #[must_use]
    pub const fn retries(&self) -> u8 {
        self.retries.count
    }

    /// Clears all counters, as at power-up.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Which voltage an [`OvervoltageMonitor`] watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VoltageSide {
    /// Output voltage.
    Output,
    /// Input voltage.
    Input,
}

/// Over-voltage monitor for either side. Latches: it never clears its flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OvervoltageMonitor {
    side: VoltageSide,
    debounce: Counter,
}

impl OvervoltageMonitor {
    /// Creates a monitor for `side` with a cleared counter.
    #[must_use]
    pub const fn new(side: VoltageSide) -> Self {
        Self {
            side,
            debounce: Counter(0),
        }
    }

    /// Fault raised by this monitor.
    #[must_use]
    pub const fn fault(&self) -> FaultKind {
        match self.side {
            VoltageSide::Output => FaultKind::OutputOvervoltage,
            VoltageSide::Input => FaultKind::InputOvervoltage,
        }
    }

    /// Evaluates one tick.
    pub fn check(
        &mut self,
        m: &Measurements,
        thresholds: &ProtectionThresholds,
        flags: &mut ErrorFlags,
    ) -> MonitorReport {
        let mut report = MonitorReport::default();
        let (value, limit) = match self.side {
            VoltageSide::Output => (m.vout.instant, thresholds.output_overvoltage),
            VoltageSide::Input => (m.vin.instant, thresholds.input_overvoltage),
        };
        if value > limit {
            if self.debounce.advance(thresholds.voltage_debounce_ticks) {
                flags.raise(self.fault());
                report.trip();
            }
        } else {
            self.debounce.clear();
        }
        report
    }

    /// Consecutive over-limit ticks.
    #[must_use]
    pub const fn debounce_ticks(&self) -> u16 {
        self.debounce.0
    }

    /// Clears the counter, as at power-up.
    pub fn reset(&mut self) {
        self.debounce.clear();
    }
}

/// Input undervoltage monitor with hysteretic recovery.
///
/// Disarmed during initialisation. Recovery needs the input to stay above
/// the release level for the whole recovery window; any dip restarts it.
/// Recoveries are not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UndervoltageMonitor {
    debounce: Counter,
    recovery: Counter,
}

impl UndervoltageMonitor {
    /// Creates a monitor with cleared counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            debounce: Counter(0),
            recovery: Counter(0),
        }
    }

    /// Evaluates one tick. `armed` is false during initialisation.
    pub fn check(
        &mut self,
        m: &Measurements,
        armed: bool,
        thresholds: &ProtectionThresholds,
        flags: &mut ErrorFlags,
    ) -> MonitorReport {
        let mut report = MonitorReport::default();
        let vin = m.vin.instant;

        if vin < thresholds.undervoltage_trip && armed {
            if self.debounce.advance(thresholds.voltage_debounce_ticks) {
                self.recovery.clear();
                flags.raise(FaultKind::InputUndervoltage);
                report.trip();
            }
        } else {
            self.debounce.clear();
        }

        if !flags.input_undervoltage() || vin <= thresholds.undervoltage_release {
            self.recovery.clear();
        } else if self.recovery.advance(thresholds.undervoltage_recovery_ticks) {
            self.debounce.clear();
            flags.clear(FaultKind::InputUndervoltage);
            report.recovery = Some(Recovery::Released);
        }
        report
    }

    /// Consecutive under-limit ticks.
    #[must_use]
    pub const fn debounce_ticks(&self) -> u16 {
        self.debounce.0
    }

    /// Consecutive ticks above the release level while the flag is raised.
    #[must_use]
    pub const fn recovery_ticks(&self) -> u16 {
        self.recovery.0
    }

    /// Clears all counters, as at power-up.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
