//! A manual tuning session: frequency sweep, dead-time and duty edits.

use powerstage_pwm::prelude::*;
use powerstage_pwm::{CompareUnit, DutyWindow};

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn sweep_down_through_prescaler_switch() -> TestResult {
    let mut engine = PwmEngine::initialize_waveform(
        SimulatedTimer::new(),
        WaveformSpec::default(),
        PwmLimits::default(),
    )?;

    let mut last = engine.configuration().frequency_hz;
    let mut switched_at = None;
    while last > 99_000 {
        let next = engine.nudge_frequency(Step::Down)?;
        assert!(next < last);
        if switched_at.is_none() && engine.configuration().prescaler == Prescaler::Mul8 {
            switched_at = Some(next);
        }
        last = next;
    }
    assert!(switched_at.is_some_and(|f| f < 100_000));
    assert!(engine.configuration().period < 8_100);
    Ok(())
}

#[test]
fn edits_survive_a_frequency_change() -> TestResult {
    let mut engine = PwmEngine::initialize_waveform(
        SimulatedTimer::new(),
        WaveformSpec::default(),
        PwmLimits::default(),
    )?;
    engine.set_dead_time_manual(30)?;
    engine.set_duty_cycle_pair_a(60)?;
    engine.configure_frequency(120_000)?;

    let config = engine.configuration();
    assert_eq!(config.dead_time_tenths, 30);
    assert_eq!(config.pair_a_compare, 9_600);
    assert_eq!(config.pair_b_compare, 6_665);
    let b = engine.timer().registers(TimerUnit::B);
    assert_eq!(b.compare(CompareUnit::Cmp1), 9_600);
    Ok(())
}

#[test]
fn custom_limits_narrow_the_duty_window() -> TestResult {
    let limits = PwmLimits {
        pair_a_duty: DutyWindow {
            min_percent: 20,
            max_percent: 40,
        },
        ..PwmLimits::default()
    };
    let mut engine =
        PwmEngine::initialize_waveform(SimulatedTimer::new(), WaveformSpec::default(), limits)?;
    assert!(engine.set_duty_cycle_pair_a(50).is_err());
    assert_eq!(engine.set_duty_cycle_pair_a(25)?, 4_000);
    Ok(())
}

#[test]
fn failed_stop_keeps_outputs_marked_running() -> TestResult {
    let mut timer = SimulatedTimer::new();
    timer.fail_always(HalOperation::StopOutputs);
    let mut engine =
        PwmEngine::initialize_waveform(timer, WaveformSpec::default(), PwmLimits::default())?;
    assert!(engine.force_outputs_off().is_err());
    assert_eq!(engine.outputs_running(), OutputSet::ALL);
    Ok(())
}
