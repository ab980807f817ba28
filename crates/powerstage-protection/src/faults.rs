//! Fault kinds and the error flag set.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fault conditions detected by the protection monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum FaultKind {
    /// High output current with collapsed output voltage.
    ShortCircuit,
    /// Sustained output overcurrent while regulating.
    OutputOvercurrent,
    /// Output voltage above its limit.
    OutputOvervoltage,
    /// Input voltage below its trip level.
    InputUndervoltage,
    /// Input voltage above its limit.
    InputOvervoltage,
}

/// How a fault flag is cleared once raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RecoveryPolicy {
    /// Cleared after a retry window, a bounded number of times.
    BoundedRetry,
    /// Cleared once the signal stays past a release level.
    Hysteresis,
    /// Only cleared by reinitialisation.
    Latched,
}

impl FaultKind {
    /// All fault kinds in evaluation order.
    pub const ALL: [FaultKind; 5] = [
        FaultKind::ShortCircuit,
        FaultKind::OutputOvercurrent,
        FaultKind::OutputOvervoltage,
        FaultKind::InputUndervoltage,
        FaultKind::InputOvervoltage,
    ];

    /// Recovery policy of this fault.
    #[must_use]
    pub const fn recovery_policy(self) -> RecoveryPolicy {
        match self {
            FaultKind::ShortCircuit | FaultKind::OutputOvercurrent => RecoveryPolicy::BoundedRetry,
            FaultKind::InputUndervoltage => RecoveryPolicy::Hysteresis,
            FaultKind::OutputOvervoltage | FaultKind::InputOvervoltage => RecoveryPolicy::Latched,
        }
    }

    const fn bit(self) -> u8 {
        match self {
            FaultKind::ShortCircuit => 1 << 0,
            FaultKind::OutputOvercurrent => 1 << 1,
            FaultKind::OutputOvervoltage => 1 << 2,
            FaultKind::InputUndervoltage => 1 << 3,
            FaultKind::InputOvervoltage => 1 << 4,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaultKind::ShortCircuit => "short circuit",
            FaultKind::OutputOvercurrent => "output overcurrent",
            FaultKind::OutputOvervoltage => "output overvoltage",
            FaultKind::InputUndervoltage => "input undervoltage",
            FaultKind::InputOvervoltage => "input overvoltage",
        };
        f.write_str(name)
    }
}

/// Set of active faults.
///
/// Anyone may read the set. Bits are raised and cleared only inside this
/// crate, each by the monitor that owns the fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "Vec<FaultKind>", from = "Vec<FaultKind>"))]
pub struct ErrorFlags(u8);

impl ErrorFlags {
    /// No active fault.
    pub const EMPTY: Self = Self(0);

    /// Whether `kind` is active.
    #[must_use]
    pub const fn contains(self, kind: FaultKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Whether no fault is active.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of active faults.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Raw bit pattern, bit 0 = short circuit through bit 4 = input overvoltage.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Active faults in evaluation order.
    pub fn iter(self) -> impl Iterator<Item = FaultKind> {
        FaultKind::ALL.into_iter().filter(move |kind| self.contains(*kind))
    }

    /// Faults active in `self` but not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Short circuit active.
    #[must_use]
    pub const fn short_circuit(self) -> bool {
        self.contains(FaultKind::ShortCircuit)
    }

    /// Output overcurrent active.
    #[must_use]
    pub const fn output_overcurrent(self) -> bool {
        self.contains(FaultKind::OutputOvercurrent)
    }

    /// Output overvoltage active.
    #[must_use]
    pub const fn output_overvoltage(self) -> bool {
        self.contains(FaultKind::OutputOvervoltage)
    }

    /// Input undervoltage active.
    #[must_use]
    pub const fn input_undervoltage(self) -> bool {
        self.contains(FaultKind::InputUndervoltage)
    }

    /// Input overvoltage active.
    #[must_use]
    pub const fn input_overvoltage(self) -> bool {
        self.contains(FaultKind::InputOvervoltage)
    }

    pub(crate) fn raise(&mut self, kind: FaultKind) {
        self.0 |= kind.bit();
    }

    pub(crate) fn clear(&mut self, kind: FaultKind) {
        self.0 &= !kind.bit();
    }
}

impl FromIterator<FaultKind> for ErrorFlags {
    fn from_iter<I: IntoIterator<Item = FaultKind>>(iter: I) -> Self {
        let mut flags = Self::EMPTY;
        for kind in iter {
            flags.raise(kind);
        }
        flags
    }
}

impl From<Vec<FaultKind>> for ErrorFlags {
    fn from(kinds: Vec<FaultKind>) -> Self {
        kinds.into_iter().collect()
    }
}

impl From<ErrorFlags> for Vec<FaultKind> {
    fn from(flags: ErrorFlags) -> Self {
        flags.iter().collect()
    }
}

impl fmt::Display for ErrorFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (i, kind) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{kind}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_iterate_in_evaluation_order() {
        let flags: ErrorFlags = [FaultKind::InputOvervoltage, FaultKind::ShortCircuit]
            .into_iter()
            .collect();
        let kinds: Vec<_> = flags.iter().collect();
        assert_eq!(kinds, [FaultKind::ShortCircuit, FaultKind::InputOvervoltage]);
        assert_eq!(flags.bits(), 0b1_0001);
        assert_eq!(flags.to_string(), "short circuit, input overvoltage");
    }

    #[test]
    fn clear_only_touches_its_own_bit() {
        let mut flags: ErrorFlags = FaultKind::ALL.into_iter().collect();
        flags.clear(FaultKind::OutputOvercurrent);
        assert!(!flags.output_overcurrent());
        assert_eq!(flags.len(), 4);
        assert!(flags.short_circuit() && flags.input_undervoltage());
    }

    #[test]
    fn overvoltage_faults_are_latched() {
        assert_eq!(
            FaultKind::OutputOvervoltage.recovery_policy(),
            RecoveryPolicy::Latched
        );
        assert_eq!(
            FaultKind::InputUndervoltage.recovery_policy(),
            RecoveryPolicy::Hysteresis
        );
        assert_eq!(
            FaultKind::ShortCircuit.recovery_policy(),
            RecoveryPolicy::BoundedRetry
        );
    }
}
