//! Configuration loading for the agent.
//!
//! Loads an optional YAML file and validates the coordinate before anything
//! touches the network; command-line flags override file values.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;

use griddata_core::{Coordinate, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};

fn default_refresh_interval_secs() -> u64 {
    300
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Agent configuration, from YAML and/or flags.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// Seconds between refresh cycles.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl AgentConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: AgentConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        info!(path = %path.display(), "Loaded agent config");
        Ok(config)
    }

    /// Check geographic ranges and the refresh interval.
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            bail!("latitude {} out of range -90..=90", self.latitude);
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            bail!("longitude {} out of range -180..=180", self.longitude);
        }
        if self.refresh_interval_secs == 0 {
            bail!("refresh_interval_secs must be positive");
        }
        Ok(())
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}
