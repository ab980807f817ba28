//! PWM timing calculator on a simulated timer

use anyhow::Result;
use powerstage_pwm::{PwmEngine, PwmLimits, SimulatedTimer, WaveformSpec};
use tracing::debug;

use crate::commands::PwmArgs;
use crate::error::SimError;
use crate::output;

pub fn execute(args: &PwmArgs, json: bool) -> Result<()> {
    let mut engine = PwmEngine::initialize_waveform(
        SimulatedTimer::new(),
        WaveformSpec::default(),
        PwmLimits::default(),
    )
    .map_err(SimError::from)?;

    if let Some(hz) = args.frequency {
        debug!(hz, "frequency request");
        engine.configure_frequency(hz).map_err(SimError::from)?;
    }
    if let Some(tenths) = args.dead_time {
        engine.set_dead_time_manual(tenths).map_err(SimError::from)?;
    }
    if let Some(percent) = args.duty_a {
        engine.set_duty_cycle_pair_a(percent).map_err(SimError::from)?;
    }
    if let Some(percent) = args.duty_b {
        engine.set_duty_cycle_pair_b(percent).map_err(SimError::from)?;
    }

    output::print_pwm(engine.configuration(), json);
    Ok(())
}
