//! Cycle settings file parser
//!
//! Parses `cycle.toml` into the stage list, default interval and initial
//! state of an engine. Transforms and observers are code, so they are
//! attached to the returned builder by the caller.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cycle::config::{validate_stages, EngineConfig, EngineConfigBuilder};

/// JSON record used as engine state when the engine is configured from a file
pub type RecordState = Map<String, Value>;

/// The `[cycle]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleSection {
    /// Ordered stage names
    pub stages: Vec<String>,
    /// Driver period in milliseconds; 0 means manual stepping
    #[serde(default)]
    pub interval_ms: u64,
}

/// Top-level settings parsed from cycle.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleSettings {
    /// Cycle definition
    pub cycle: CycleSection,
    /// Initial state record (empty when omitted)
    #[serde(default)]
    pub initial_state: RecordState,
}

impl CycleSettings {
    /// Parse a cycle.toml file from a path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse cycle.toml content from a string
    pub fn parse(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content).context("Failed to parse cycle.toml")?;
        validate_stages(&settings.cycle.stages).context("Invalid [cycle] stages")?;
        Ok(settings)
    }

    /// Start an engine configuration preloaded with these settings
    #[must_use]
    pub fn builder(&self) -> EngineConfigBuilder<RecordState> {
        EngineConfig::builder(self.cycle.stages.iter().cloned())
            .initial_state(self.initial_state.clone())
            .interval_ms(self.cycle.interval_ms)
    }
}
