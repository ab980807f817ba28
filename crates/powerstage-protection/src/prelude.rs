//! Prelude for convenient imports.
//!
//! ```rust
//! use powerstage_protection::prelude::*;
//! ```

pub use crate::{
    ErrorFlags, FaultEvent, FaultEventKind, FaultKind, ProtectionPhase, ProtectionResult,
    ProtectionSystem, ProtectionThresholds, ProtectionVerdict, RecoveryPolicy, ThresholdError,
};
