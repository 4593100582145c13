//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "subledger.toml",
    "config.toml",
    "./config/subledger.toml",
    "/etc/subledger/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, |key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Ok(path) = env::var("SUBLEDGER_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        for path in CONFIG_PATHS {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        None
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply overrides from a variable lookup (the process environment in `load`)
fn apply_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // Ledger
    if let Some(val) = lookup("SUBLEDGER_EXPIRY_POLICY") {
        config.ledger.expiry = val;
    }
    if let Some(val) = lookup("SUBLEDGER_GRACE_PERIOD_SECS") {
        config.ledger.grace_period_secs = val.parse().map_err(|_| {
            ConfigError::EnvError(format!("SUBLEDGER_GRACE_PERIOD_SECS is not an integer: {}", val))
        })?;
    }
    if let Some(val) = lookup("SUBLEDGER_EVENT_CAPACITY") {
        config.ledger.event_channel_capacity = val.parse().map_err(|_| {
            ConfigError::EnvError(format!("SUBLEDGER_EVENT_CAPACITY is not an integer: {}", val))
        })?;
    }

    // Logging
    if let Some(val) = lookup("SUBLEDGER_LOG_FORMAT") {
        config.logging.format = val;
    }

    Ok(())
}
