//! Scenario files: a sequence of phases fed to the controller tick by tick.

use std::path::Path;

use powerstage_control::OperatingState;
use powerstage_measurement::RawSamples;
use powerstage_protection::ErrorFlags;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Largest code a 12-bit converter produces.
const MAX_CODE: u16 = 4095;

fn default_adjust() -> u16 {
    300
}

/// One sampling cycle's raw converter codes, held for a whole phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SampleSet {
    pub vin: u16,
    pub iin: u16,
    pub vout: u16,
    pub iout: u16,
}

impl SampleSet {
    pub fn raw(&self) -> RawSamples {
        [self.vin, self.iin, self.vout, self.iout]
    }
}

/// A stretch of ticks with constant inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Phase {
    #[serde(default)]
    pub label: Option<String>,
    pub ticks: u32,
    pub samples: SampleSet,
    /// Key held down for the whole phase.
    #[serde(default)]
    pub key: bool,
    /// Drives the start input directly instead of the key latch.
    #[serde(default)]
    pub start: Option<bool>,
    /// Overrides the scenario's adjust input for this phase.
    #[serde(default)]
    pub adjust: Option<u16>,
}

/// Final conditions checked after the last phase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    #[serde(default)]
    pub state: Option<OperatingState>,
    #[serde(default)]
    pub flags: Option<ErrorFlags>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_adjust")]
    pub adjust: u16,
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub expect: Option<Expectation>,
}

impl Scenario {
    /// Reads and validates a YAML scenario.
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, SimError> {
        let scenario: Scenario = serde_yaml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.phases.is_empty() {
            return Err(SimError::InvalidScenario(format!(
                "'{}' has no phases",
                self.name
            )));
        }
        if self.adjust > MAX_CODE {
            return Err(SimError::InvalidScenario(format!(
                "adjust {} exceeds {MAX_CODE}",
                self.adjust
            )));
        }
        for (index, phase) in self.phases.iter().enumerate() {
            let name = phase
                .label
                .clone()
                .unwrap_or_else(|| format!("phase {}", index.saturating_add(1)));
            if phase.ticks == 0 {
                return Err(SimError::InvalidScenario(format!("{name} has zero ticks")));
            }
            if phase.samples.raw().iter().any(|&code| code > MAX_CODE)
                || phase.adjust.is_some_and(|code| code > MAX_CODE)
            {
                return Err(SimError::InvalidScenario(format!(
                    "{name} has a code above {MAX_CODE}"
                )));
            }
        }
        Ok(())
    }

    pub fn total_ticks(&self) -> u64 {
        self.phases.iter().map(|p| u64::from(p.ticks)).sum()
    }
}
