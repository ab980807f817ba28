//! Configuration commands

use std::path::Path;

use anyhow::{Context, Result};
use powerstage_control::ConverterConfig;
use tracing::debug;

use crate::commands::ConfigArgs;
use crate::error::SimError;
use crate::output;

pub fn execute(args: &ConfigArgs, json: bool) -> Result<()> {
    match &args.check {
        Some(path) => {
            let config =
                load(path).with_context(|| format!("loading configuration {}", path.display()))?;
            config.validate().map_err(SimError::from)?;
            output::print_config_valid(&path.display().to_string(), json);
        }
        None => output::print_config(&ConverterConfig::default(), json)?,
    }
    Ok(())
}

/// Reads a configuration file. `.json` files are parsed as JSON, anything
/// else as YAML. Missing sections take their defaults.
pub fn load(path: &Path) -> Result<ConverterConfig, SimError> {
    debug!(path = %path.display(), "loading configuration");
    let text = std::fs::read_to_string(path)?;
    let config = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&text)?
    } else {
        serde_yaml::from_str(&text)?
    };
    Ok(config)
}
