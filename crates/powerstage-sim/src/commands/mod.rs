//! Command implementations for stagectl

pub mod config;
pub mod pwm;
pub mod run;

use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scenario file (YAML)
    #[arg(short, long)]
    pub scenario: PathBuf,

    /// Controller configuration (YAML or JSON); defaults are used if omitted
    #[arg(short, long, env = "STAGECTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Do not fail when the scenario's expectation is not met
    #[arg(long)]
    pub no_check: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Validate a configuration file instead of printing the defaults
    #[arg(long, value_name = "FILE")]
    pub check: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct PwmArgs {
    /// Switching frequency in Hz
    #[arg(short, long)]
    pub frequency: Option<u32>,

    /// Dead-time in tenths of a percent of the period
    #[arg(short, long)]
    pub dead_time: Option<u16>,

    /// Pair A duty in percent
    #[arg(long)]
    pub duty_a: Option<u8>,

    /// Pair B duty in percent
    #[arg(long)]
    pub duty_b: Option<u8>,
}
