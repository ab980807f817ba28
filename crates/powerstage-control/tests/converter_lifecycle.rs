//! Full converter lifecycles driven through the public API.

use powerstage_control::prelude::*;
use powerstage_control::IndicatorPattern;
use powerstage_measurement::RawSamples;
use powerstage_pwm::{OutputSet, SimulatedTimer};

type TestResult = Result<(), Box<dyn std::error::Error>>;

// Vin, Iin, Vout, Iout.
const HEALTHY: RawSamples = [1500, 2100, 1000, 2300];
const OVERLOAD: RawSamples = [1500, 2600, 1000, 3300];

struct Bench {
    controller: Controller<SimulatedTimer>,
    inputs: TickInputs,
}

impl Bench {
    fn new() -> Result<Self, ControlError> {
        Ok(Self {
            controller: Controller::new(SimulatedTimer::new(), ConverterConfig::default())?,
            inputs: TickInputs {
                start: true,
                adjust: 300,
            },
        })
    }

    fn run(&mut self, raw: RawSamples, ticks: u32) -> OperatingState {
        for _ in 0..ticks {
            self.controller.sample(&raw);
            self.controller.tick(self.inputs);
        }
        self.controller.state()
    }

    /// Ticks until `state` is reached, giving up after `limit`.
    fn ticks_until(&mut self, raw: RawSamples, state: OperatingState, limit: u32) -> Option<u32> {
        (1..=limit).find(|_| self.run(raw, 1) == state)
    }
}

#[test]
fn startup_overload_recovery_and_restart() -> TestResult {
    let mut bench = Bench::new()?;

    assert_eq!(bench.ticks_until(HEALTHY, OperatingState::Run, 1000), Some(263));
    assert_eq!(bench.controller.pwm().timer().running_outputs(), OutputSet::ALL);

    assert_eq!(bench.run(OVERLOAD, 10), OperatingState::Run);
    assert_eq!(bench.run(OVERLOAD, 1), OperatingState::Err);
    assert!(bench.controller.flags().output_overcurrent());
    assert_eq!(bench.controller.pwm().timer().running_outputs(), OutputSet::empty());

    // One full retry window with the overload still present.
    assert_eq!(bench.run(OVERLOAD, 399), OperatingState::Err);
    assert_eq!(bench.run(OVERLOAD, 1), OperatingState::Wait);
    assert_eq!(bench.controller.protection().overcurrent().retries(), 1);

    assert_eq!(bench.ticks_until(HEALTHY, OperatingState::Rise, 1000), Some(201));
    // SSInit (1) + SSWait (21) + SSRun continuing from ramp counter 39 (16).
    assert_eq!(bench.ticks_until(HEALTHY, OperatingState::Run, 1000), Some(38));
    Ok(())
}

#[test]
fn reference_settles_on_the_adjust_input() -> TestResult {
    let mut bench = Bench::new()?;
    bench.ticks_until(HEALTHY, OperatingState::Run, 1000);
    bench.run(HEALTHY, 100);
    assert_eq!(bench.controller.parameters().voref, 271 + 300);

    bench.inputs.adjust = 4000;
    bench.run(HEALTHY, 200);
    // Capped at 0.85 of the input voltage.
    assert_eq!(bench.controller.parameters().voref, 1275);
    Ok(())
}

#[test]
fn stop_request_is_reflected_in_telemetry() -> TestResult {
    let mut bench = Bench::new()?;
    bench.ticks_until(HEALTHY, OperatingState::Run, 1000);
    let snapshot = bench.controller.snapshot();
    assert_eq!(snapshot.indicators, IndicatorPattern::for_state(OperatingState::Run));
    assert_eq!(snapshot.soft_start, None);

    bench.inputs.start = false;
    assert_eq!(bench.run(HEALTHY, 1), OperatingState::Wait);
    let snapshot = bench.controller.snapshot();
    assert_eq!(snapshot.indicators.to_string(), "GYR");
    assert!(snapshot.flags.is_empty());
    assert_eq!(bench.controller.pwm().timer().running_outputs(), OutputSet::empty());
    Ok(())
}
