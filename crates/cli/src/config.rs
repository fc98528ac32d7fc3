//! CLI configuration utilities

use anyhow::{Context, Result};
use std::path::Path;
use trek_core::TrekConfig;

/// Command-line values that take precedence over file and environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub log_level: Option<String>,
}

/// Load configuration: file (if any), then `TREK_*` environment, then flags
pub fn load_config(path: Option<&Path>, overrides: Overrides) -> Result<TrekConfig> {
    let mut config = TrekConfig::load(path).context("Failed to load configuration")?;

    if let Some(url) = overrides.api_url {
        config.api.base_url = url;
    }
    if let Some(level) = overrides.log_level {
        config.logging.level = level;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}
