//! Seam to the closed-loop compensator.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Regulation loop state the soft-start clears on every restart.
///
/// The control law itself lives outside this crate.
pub trait Compensator {
    /// Zeroes accumulated error and output history.
    fn reset_error_state(&mut self);
}

/// Error and output history of a two-pole, two-zero voltage loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ErrorIntegrators {
    /// Voltage error at k, k-1 and k-2.
    pub errors: [i32; 3],
    /// Controller output at k-1 and k-2.
    pub outputs: [i32; 2],
}

impl ErrorIntegrators {
    /// Whether every term is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl Compensator for ErrorIntegrators {
    fn reset_error_state(&mut self) {
        *self = Self::default();
    }
}
