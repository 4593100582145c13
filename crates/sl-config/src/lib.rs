//! SubLedger Configuration System
//!
//! TOML-based configuration with environment variable override support.
//! Covers the expiry policy, the tier catalog and logging output.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use sl_common::{ExpiryPolicy, SubscriptionTier, TierId, GRACE_PERIOD_SECS, LOCK_DURATION_SECS};

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ledger: LedgerConfig,
    pub tiers: Vec<TierConfig>,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            tiers: default_tiers(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Ledger behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// "strict" or "grace"
    pub expiry: String,
    /// Only used when `expiry = "grace"`
    pub grace_period_secs: i64,
    /// Buffered ledger events per receiver before the oldest are dropped
    pub event_channel_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            expiry: "strict".to_string(),
            grace_period_secs: GRACE_PERIOD_SECS,
            event_channel_capacity: 1024,
        }
    }
}

impl LedgerConfig {
    /// Resolve the configured expiry policy
    pub fn policy(&self) -> Result<ExpiryPolicy, ConfigError> {
        match self.expiry.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ExpiryPolicy::Strict),
            "grace" => {
                if self.grace_period_secs < 0 {
                    return Err(ConfigError::ValidationError(format!(
                        "grace_period_secs must not be negative, got {}",
                        self.grace_period_secs
                    )));
                }
                Ok(ExpiryPolicy::Grace { grace_secs: self.grace_period_secs })
            }
            other => Err(ConfigError::ValidationError(format!(
                "unknown expiry policy '{}', expected 'strict' or 'grace'",
                other
            ))),
        }
    }
}

/// A tier catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    pub id: TierId,
    pub price: u64,
    pub duration_secs: i64,
    #[serde(default)]
    pub benefits: String,
}

impl TierConfig {
    pub fn to_tier(&self) -> SubscriptionTier {
        SubscriptionTier {
            price: self.price,
            duration: self.duration_secs,
            benefits: self.benefits.clone(),
        }
    }
}

fn default_tiers() -> Vec<TierConfig> {
    vec![
        TierConfig {
            id: 1,
            price: 100,
            duration_secs: LOCK_DURATION_SECS,
            benefits: "Basic Plan".to_string(),
        },
        TierConfig {
            id: 2,
            price: 200,
            duration_secs: 2 * LOCK_DURATION_SECS,
            benefits: "Premium Plan".to_string(),
        },
    ]
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// "json" or "text"; empty defers to LOG_FORMAT
    pub format: String,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        let loader = ConfigLoader::new();
        loader.load()
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// Tier entries are validated when the ledger builds its catalog.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ledger.policy()?;

        if self.ledger.event_channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "event_channel_capacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# SubLedger Configuration
# Environment variables override these settings

[ledger]
expiry = "strict"  # strict, grace
grace_period_secs = 259200
event_channel_capacity = 1024

[[tiers]]
id = 1
price = 100
duration_secs = 2592000
benefits = "Basic Plan"

[[tiers]]
id = 2
price = 200
duration_secs = 5184000
benefits = "Premium Plan"

[logging]
format = ""  # json, text; empty uses LOG_FORMAT
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.ledger.policy().unwrap(), ExpiryPolicy::Strict);
        assert_eq!(config.tiers.len(), 2);
        assert_eq!(config.tiers[0].price, 100);
        assert_eq!(config.tiers[1].duration_secs, 5_184_000);
        config.validate().unwrap();
    }

    #[test]
    fn test_example_toml_parses_to_defaults() {
        let config = AppConfig::from_toml(&AppConfig::example_toml()).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(config.tiers, defaults.tiers);
        assert_eq!(config.ledger.grace_period_secs, defaults.ledger.grace_period_secs);
        config.validate().unwrap();
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[ledger]
expiry = "grace"
grace_period_secs = 3600

[[tiers]]
id = 7
price = 50
duration_secs = 86400
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config.ledger.policy().unwrap(),
            ExpiryPolicy::Grace { grace_secs: 3600 }
        );
        assert_eq!(config.tiers.len(), 1);
        assert_eq!(config.tiers[0].id, 7);
        assert_eq!(config.tiers[0].benefits, "");
        // Unspecified sections keep their defaults
        assert_eq!(config.ledger.event_channel_capacity, 1024);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let mut config = AppConfig::default();
        config.ledger.expiry = "lenient".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_zero_event_capacity_rejected() {
        let mut config = AppConfig::default();
        config.ledger.event_channel_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = AppConfig::from_toml("[ledger\nexpiry = ");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
