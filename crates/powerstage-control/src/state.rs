//! Operating and soft-start states.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use powerstage_protection::ProtectionPhase;

/// Top-level operating state, advanced once per control tick.
///
/// ```text
///  Init ──► Wait ──start──► Rise ──ramp done──► Run
///            ▲  ▲             │                  │
///            │  └──start off──┴──────────────────┤
///            │                                   │ trip
///            └──── flags empty ◄──── Err ◄───────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OperatingState {
    /// Resets parameters and flags, then moves to Wait.
    #[default]
    Init,
    /// Outputs idle, waiting for the start input.
    Wait,
    /// Soft-start ramp in progress.
    Rise,
    /// Regulating.
    Run,
    /// Outputs forced off until every fault flag has cleared.
    Err,
}

impl OperatingState {
    /// How the protection monitors see this state.
    #[must_use]
    pub const fn protection_phase(self) -> ProtectionPhase {
        match self {
            OperatingState::Init => ProtectionPhase::Initializing,
            OperatingState::Run => ProtectionPhase::Regulating,
            OperatingState::Wait | OperatingState::Rise | OperatingState::Err => {
                ProtectionPhase::Standby
            }
        }
    }

    /// Whether the outputs may switch in this state.
    #[must_use]
    pub const fn is_energised(self) -> bool {
        matches!(self, OperatingState::Rise | OperatingState::Run)
    }
}

impl fmt::Display for OperatingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperatingState::Init => "init",
            OperatingState::Wait => "wait",
            OperatingState::Rise => "rise",
            OperatingState::Run => "run",
            OperatingState::Err => "err",
        };
        f.write_str(name)
    }
}

/// Soft-start sub-state, meaningful only in [`OperatingState::Rise`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SoftStartState {
    /// Outputs off, limits at minimum.
    #[default]
    SsInit,
    /// Minimum hold time.
    SsWait,
    /// Max-duty ramp.
    SsRun,
}

impl fmt::Display for SoftStartState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SoftStartState::SsInit => "ss-init",
            SoftStartState::SsWait => "ss-wait",
            SoftStartState::SsRun => "ss-run",
        };
        f.write_str(name)
    }
}
