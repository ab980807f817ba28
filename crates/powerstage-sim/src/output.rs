//! Output formatting for stagectl

use anyhow::Error;
use colored::*;
use powerstage_control::{ConverterConfig, OperatingState};
use powerstage_pwm::{ChannelPair, PwmConfiguration};
use serde::Serialize;
use serde_json::json;

use crate::runner::RunSummary;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": format!("{error:#}"),
        }
    });
    print_json(&error_json);
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format output as JSON: {e}"),
    }
}

fn state_label(state: OperatingState) -> ColoredString {
    let name = state.to_string();
    match state {
        OperatingState::Run => name.green(),
        OperatingState::Rise => name.yellow(),
        OperatingState::Err => name.red().bold(),
        OperatingState::Init | OperatingState::Wait => name.normal(),
    }
}

/// Print the result of a scenario run
pub fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        print_json(&json!({
            "success": true,
            "summary": summary,
        }));
        return;
    }

    let snapshot = &summary.snapshot;
    println!("{} {}", "Scenario:".bold(), summary.scenario);
    println!("  Ticks:       {}", summary.ticks);
    println!("  Final state: {}", state_label(summary.final_state));
    println!("  Indicators:  {}", snapshot.indicators);
    println!("  Faults:      {}", summary.flags);
    println!(
        "  Output:      {}.{:02} V, {}.{:02} A",
        snapshot.vout_centivolts / 100,
        snapshot.vout_centivolts % 100,
        snapshot.iout_centiamps / 100,
        snapshot.iout_centiamps % 100,
    );
    println!(
        "  Max duty:    buck {} / boost {}",
        snapshot.parameters.buck_max_duty, snapshot.parameters.boost_max_duty
    );
    if summary.hardware_errors > 0 {
        println!(
            "  {} {}",
            "Timer failures:".red(),
            summary.hardware_errors
        );
    }

    println!("{}", "Phases:".bold());
    for (index, phase) in summary.phases.iter().enumerate() {
        let label = phase
            .label
            .clone()
            .unwrap_or_else(|| format!("phase {}", index.saturating_add(1)));
        println!(
            "  {:<20} ticks {:>6}..{:<6} {} [{}]",
            label,
            phase.first_tick,
            phase.last_tick,
            state_label(phase.end_state),
            phase.flags
        );
    }

    if !summary.transitions.is_empty() {
        println!("{}", "Transitions:".bold());
        for t in &summary.transitions {
            println!(
                "  tick {:>6}  {} -> {}",
                t.tick,
                state_label(t.from),
                state_label(t.to)
            );
        }
    }

    if !summary.fault_events.is_empty() {
        println!("{}", "Fault events:".bold());
        for event in &summary.fault_events {
            println!("  tick {:>6}  {}: {:?}", event.tick, event.fault, event.kind);
        }
    }
}

/// Print a controller configuration
pub fn print_config(config: &ConverterConfig, json: bool) -> Result<(), serde_yaml::Error> {
    if json {
        print_json(config);
    } else {
        print!("{}", serde_yaml::to_string(config)?);
    }
    Ok(())
}

/// Print the outcome of a configuration check
pub fn print_config_valid(path: &str, json: bool) {
    if json {
        print_json(&json!({
            "success": true,
            "valid": true,
            "path": path,
        }));
    } else {
        println!("{} {}", "✓".green(), format!("{path} is valid").bold());
    }
}

/// Print PWM timing after a set of edits
pub fn print_pwm(config: &PwmConfiguration, json: bool) {
    let duty_a = config.duty_tenths(ChannelPair::A);
    let duty_b = config.duty_tenths(ChannelPair::B);
    if json {
        print_json(&json!({
            "success": true,
            "configuration": config,
            "duty_tenths": { "a": duty_a, "b": duty_b },
        }));
        return;
    }

    println!("{}", "PWM timing:".bold());
    println!("  Frequency:  {} Hz", config.frequency_hz);
    println!("  Period:     {} ticks ({:?})", config.period, config.prescaler);
    println!(
        "  Dead-time:  {}.{}% ({} ticks)",
        config.dead_time_tenths / 10,
        config.dead_time_tenths % 10,
        config.dead_time_ticks
    );
    println!(
        "  Pair A:     {}.{}% (compare {})",
        duty_a / 10,
        duty_a % 10,
        config.pair_a_compare
    );
    println!(
        "  Pair B:     {}.{}% (compare {}, TB2 {})",
        duty_b / 10,
        duty_b % 10,
        config.pair_b_compare,
        config.tb2_compare
    );
}
