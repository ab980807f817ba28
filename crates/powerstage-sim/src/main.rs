//! stagectl - power stage simulator and tuning CLI
//!
//! Runs the converter controller against a simulated timer, driven by
//! scenario files, and exposes the PWM timing calculator.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;
mod runner;
mod scenario;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{ConfigArgs, PwmArgs, RunArgs};
use crate::error::SimError;

#[derive(Parser)]
#[command(name = "stagectl")]
#[command(about = "Power stage controller simulator - run scenarios and tune PWM timing")]
#[command(version)]
#[command(long_about = "
stagectl runs the buck/boost controller core on a simulated high-resolution
timer. Scenarios feed raw converter codes and key presses tick by tick and
report every state transition and protection event.

Use --json for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file against the controller
    Run(RunArgs),

    /// Print the default configuration or validate a file
    Config(ConfigArgs),

    /// Compute PWM timing for a set of requests
    Pwm(PwmArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "stagectl={log_level},powerstage_control={log_level},powerstage_protection={log_level},powerstage_pwm={log_level}"
                )
                .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }

            let code = e.downcast_ref::<SimError>().map_or(1, SimError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run(args) => commands::run::execute(args, cli.json),
        Commands::Config(args) => commands::config::execute(args, cli.json),
        Commands::Pwm(args) => commands::pwm::execute(args, cli.json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_run_with_globals() -> TestResult {
        let cli = Cli::try_parse_from([
            "stagectl",
            "run",
            "--scenario",
            "s.yaml",
            "--json",
            "-vv",
        ])?;
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.scenario, std::path::PathBuf::from("s.yaml"));
                assert!(args.config.is_none() || std::env::var_os("STAGECTL_CONFIG").is_some());
                assert!(!args.no_check);
            }
            _ => return Err("expected run".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_pwm_requests() -> TestResult {
        let cli = Cli::try_parse_from([
            "stagectl",
            "pwm",
            "--frequency",
            "120000",
            "--dead-time",
            "30",
            "--duty-b",
            "40",
        ])?;
        match cli.command {
            Commands::Pwm(args) => {
                assert_eq!(args.frequency, Some(120_000));
                assert_eq!(args.dead_time, Some(30));
                assert_eq!(args.duty_a, None);
                assert_eq!(args.duty_b, Some(40));
            }
            _ => return Err("expected pwm".into()),
        }
        Ok(())
    }

    #[test]
    fn run_requires_scenario() {
        assert!(Cli::try_parse_from(["stagectl", "run"]).is_err());
    }

    #[test]
    fn duty_must_fit_a_byte() {
        assert!(Cli::try_parse_from(["stagectl", "pwm", "--duty-a", "300"]).is_err());
    }
}
