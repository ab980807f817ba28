//! Code-to-physical conversions for telemetry consumers.
//!
//! The control core never leaves the code space. These helpers exist for
//! displays and logs, and mirror the front-end scaling of the power stage:
//! a full-scale voltage code reads 68.00 V and a full-scale current swing
//! above mid-rail reads 22.00 A.

use crate::CURRENT_ZERO_CODE;

/// Centivolts represented by a full-scale (4096) voltage code.
pub const VOLTAGE_FULL_SCALE_CV: u32 = 6800;

/// Centiamps represented by a full-scale (4096) current swing.
pub const CURRENT_FULL_SCALE_CA: u32 = 2200;

/// Converts a voltage code to centivolts (`code × 6800 >> 12`).
#[must_use]
pub fn code_to_centivolts(code: u32) -> u32 {
    scale(code, VOLTAGE_FULL_SCALE_CV)
}

/// Converts a current code to centiamps (`(code − 2048) × 2200 >> 12`).
///
/// Codes below the zero-current point read as zero.
#[must_use]
pub fn current_code_to_centiamps(code: u32) -> u32 {
    scale(code.saturating_sub(CURRENT_ZERO_CODE), CURRENT_FULL_SCALE_CA)
}

/// Converts centivolts back to the nearest-below voltage code.
#[must_use]
pub fn centivolts_to_code(centivolts: u32) -> u32 {
    let code = (u64::from(centivolts) << 12) / u64::from(VOLTAGE_FULL_SCALE_CV);
    u32::try_from(code).unwrap_or(u32::MAX)
}

fn scale(code: u32, full_scale: u32) -> u32 {
    let value = (u64::from(code) * u64::from(full_scale)) >> 12;
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voltage_thresholds_match_their_design_points() {
        // 50 V overvoltage point
        assert_eq!(code_to_centivolts(3012), 5000);
        // 11.4 V undervoltage point
        assert_eq!(code_to_centivolts(686), 1138);
    }

    #[test]
    fn current_is_measured_from_mid_rail() {
        assert_eq!(current_code_to_centiamps(2048), 0);
        assert_eq!(current_code_to_centiamps(1000), 0);
        assert_eq!(current_code_to_centiamps(2048 + 4096), 2200);
    }

    #[test]
    fn centivolts_round_trip_stays_within_one_code() {
        for cv in [0u32, 500, 1200, 4800, 6799] {
            let back = code_to_centivolts(centivolts_to_code(cv));
            assert!(cv - back <= 2, "{cv} -> {back}");
        }
    }
}
