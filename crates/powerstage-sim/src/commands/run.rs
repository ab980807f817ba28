//! Scenario execution

use anyhow::{Context, Result};
use powerstage_control::ConverterConfig;
use tracing::info;

use crate::commands::{RunArgs, config};
use crate::output;
use crate::runner::{Runner, check_expectation};
use crate::scenario::Scenario;

pub fn execute(args: &RunArgs, json: bool) -> Result<()> {
    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("loading scenario {}", args.scenario.display()))?;
    let config = match &args.config {
        Some(path) => config::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => ConverterConfig::default(),
    };
    info!(
        scenario = %scenario.name,
        ticks = scenario.total_ticks(),
        "running scenario"
    );

    let summary = Runner::new(config)?.run(&scenario);
    output::print_summary(&summary, json);

    if let Some(expect) = &scenario.expect
        && !args.no_check
    {
        check_expectation(&summary, expect)?;
    }
    Ok(())
}
