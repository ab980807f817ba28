//! Property-based tests for the protection monitors.

use crate::*;
use powerstage_measurement::{ChannelReading, Measurements};
use powerstage_pwm::{PwmEngine, PwmLimits, SimulatedTimer, WaveformSpec};
use proptest::prelude::*;

fn reading(code: u32) -> ChannelReading {
    ChannelReading {
        instant: code,
        average: code,
    }
}

fn measurement() -> impl Strategy<Value = Measurements> {
    (0u32..4096, 0u32..4096, 2048u32..4096).prop_map(|(vin, vout, iout)| Measurements {
        vin: reading(vin),
        vout: reading(vout),
        iout: reading(iout),
        ..Measurements::POWER_UP
    })
}

fn phase() -> impl Strategy<Value = ProtectionPhase> {
    prop_oneof![
        Just(ProtectionPhase::Initializing),
        Just(ProtectionPhase::Standby),
        Just(ProtectionPhase::Regulating),
    ]
}

fn setup() -> Result<(ProtectionSystem, PwmEngine<SimulatedTimer>), TestCaseError> {
    let pwm = PwmEngine::initialize_waveform(
        SimulatedTimer::new(),
        WaveformSpec::default(),
        PwmLimits::default(),
    )
    .map_err(|e| TestCaseError::fail(e.to_string()))?;
    let protection = ProtectionSystem::new(ProtectionThresholds::default())
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
    Ok((protection, pwm))
}

proptest! {
    #[test]
    fn latched_faults_never_clear(
        ticks in proptest::collection::vec((measurement(), phase()), 1..600),
    ) {
        let (mut protection, mut pwm) = setup()?;
        let mut latched = ErrorFlags::EMPTY;
        for (m, phase) in &ticks {
            protection.evaluate(m, *phase, &mut pwm);
            let flags = protection.flags();
            for kind in latched.iter() {
                prop_assert!(flags.contains(kind), "{kind} cleared");
            }
            latched = flags
                .iter()
                .filter(|k| k.recovery_policy() == RecoveryPolicy::Latched)
                .collect();
        }
    }

    #[test]
    fn any_trip_leaves_outputs_off(
        ticks in proptest::collection::vec((measurement(), phase()), 1..200),
    ) {
        let (mut protection, mut pwm) = setup()?;
        for (m, phase) in &ticks {
            let verdict = protection.evaluate(m, *phase, &mut pwm);
            if verdict.enter_err() {
                prop_assert!(verdict.outputs_forced_off);
                prop_assert!(pwm.outputs_running().is_empty());
            }
        }
    }

    #[test]
    fn undervoltage_is_disarmed_in_init(
        vins in proptest::collection::vec(0u32..686, 1..100),
    ) {
        let (mut protection, mut pwm) = setup()?;
        for vin in vins {
            let m = Measurements { vin: reading(vin), ..Measurements::POWER_UP };
            protection.evaluate(&m, ProtectionPhase::Initializing, &mut pwm);
        }
        prop_assert!(!protection.flags().input_undervoltage());
    }

    #[test]
    fn overcurrent_only_trips_while_regulating(
        ticks in proptest::collection::vec((measurement(), phase()), 1..300),
    ) {
        let (mut protection, mut pwm) = setup()?;
        for (m, phase) in &ticks {
            let verdict = protection.evaluate(m, *phase, &mut pwm);
            if verdict.tripped.output_overcurrent() {
                prop_assert_eq!(*phase, ProtectionPhase::Regulating);
            }
        }
    }

    #[test]
    fn retry_counts_stay_bounded(
        ticks in proptest::collection::vec((measurement(), phase()), 1..2000),
    ) {
        let (mut protection, mut pwm) = setup()?;
        let cap = protection.thresholds().exhausted_retries();
        for (m, phase) in &ticks {
            protection.evaluate(m, *phase, &mut pwm);
            prop_assert!(protection.short_circuit().retries() <= cap);
            prop_assert!(protection.overcurrent().retries() <= cap);
            prop_assert!(protection.short_circuit().retry_ticks() <= 400);
        }
    }
}
