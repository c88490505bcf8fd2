//! Configuration loading and parsing

use crate::cleanup::CleanupStep;
use anyhow::{Context, Result};
use fatal_report::ReporterConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub reporter: ReporterConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CleanupConfig {
    /// Steps registered at startup, before any given on the command line
    #[serde(default)]
    pub steps: Vec<CleanupStep>,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
