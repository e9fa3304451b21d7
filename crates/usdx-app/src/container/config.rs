//! # Application Configuration
//!
//! Runtime parameters of a USDX replica. Defaults suit a local test chain;
//! every field can be overridden from the environment.
//!
//! | Variable           | Field          |
//! |--------------------|----------------|
//! | `USDX_CHAIN_ID`    | `chain_id`     |
//! | `USDX_MIN_FEES`    | `min_fees`     |
//! | `USDX_KEEP_RECENT` | `keep_recent`  |
//! | `USDX_LOG_LEVEL`   | `log_level`    |
//! | `USDX_GENESIS`     | `genesis_path` |

use std::path::PathBuf;

use shared_types::Coins;
use thiserror::Error;
use tracing::Level;
use usdx_store::DEFAULT_KEEP_RECENT;

const MAX_CHAIN_ID_LEN: usize = 50;

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Chain identifier recorded at genesis.
    pub chain_id: String,
    /// Lowest fee the ante stage accepts, per denom.
    pub min_fees: Coins,
    /// Committed versions retained for historical queries.
    pub keep_recent: u64,
    pub log_level: String,
    pub genesis_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chain_id: "usdx-local".to_string(),
            min_fees: Coins::empty(),
            keep_recent: DEFAULT_KEEP_RECENT,
            log_level: "info".to_string(),
            genesis_path: PathBuf::from("genesis.json"),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (variable name to value).
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(chain_id) = lookup("USDX_CHAIN_ID") {
            self.chain_id = chain_id;
        }
        if let Some(fees) = lookup("USDX_MIN_FEES") {
            self.min_fees = fees
                .parse()
                .map_err(|e| ConfigError::InvalidMinFees(format!("{fees}: {e}")))?;
        }
        if let Some(keep) = lookup("USDX_KEEP_RECENT") {
            self.keep_recent = keep
                .parse()
                .map_err(|_| ConfigError::InvalidKeepRecent(keep.clone()))?;
        }
        if let Some(level) = lookup("USDX_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(path) = lookup("USDX_GENESIS") {
            self.genesis_path = PathBuf::from(path);
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id.trim().is_empty() {
            return Err(ConfigError::EmptyChainId);
        }
        if self.chain_id.len() > MAX_CHAIN_ID_LEN {
            return Err(ConfigError::ChainIdTooLong(self.chain_id.len()));
        }
        if self.keep_recent == 0 {
            return Err(ConfigError::InvalidKeepRecent("0".to_string()));
        }
        self.level().map(|_| ())
    }

    pub fn level(&self) -> Result<Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Chain id must not be empty")]
    EmptyChainId,

    #[error("Chain id is {0} characters, at most {MAX_CHAIN_ID_LEN} allowed")]
    ChainIdTooLong(usize),

    #[error("keep_recent must be a positive integer, got {0}")]
    InvalidKeepRecent(String),

    #[error("Unknown log level: {0}")]
    InvalidLogLevel(String),

    #[error("Invalid minimum fees: {0}")]
    InvalidMinFees(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.keep_recent, DEFAULT_KEEP_RECENT);
        assert_eq!(config.level().unwrap(), Level::INFO);
    }

    #[test]
    fn test_env_overrides() {
        // Arrange
        let mut config = AppConfig::default();

        // Act
        config
            .apply_env(env(&[
                ("USDX_CHAIN_ID", "usdx-test-1"),
                ("USDX_MIN_FEES", "2usdx"),
                ("USDX_KEEP_RECENT", "5"),
                ("USDX_LOG_LEVEL", "debug"),
                ("USDX_GENESIS", "/tmp/g.json"),
            ]))
            .unwrap();

        // Assert
        assert_eq!(config.chain_id, "usdx-test-1");
        assert_eq!(config.min_fees.amount_of("usdx"), 2);
        assert_eq!(config.keep_recent, 5);
        assert_eq!(config.level().unwrap(), Level::DEBUG);
        assert_eq!(config.genesis_path, PathBuf::from("/tmp/g.json"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = AppConfig::default();
        assert_eq!(
            config.apply_env(env(&[("USDX_KEEP_RECENT", "0")])),
            Err(ConfigError::InvalidKeepRecent("0".to_string()))
        );

        let mut config = AppConfig::default();
        assert!(matches!(
            config.apply_env(env(&[("USDX_MIN_FEES", "lots")])),
            Err(ConfigError::InvalidMinFees(_))
        ));

        let mut config = AppConfig::default();
        assert_eq!(
            config.apply_env(env(&[("USDX_CHAIN_ID", " ")])),
            Err(ConfigError::EmptyChainId)
        );

        let mut config = AppConfig::default();
        assert_eq!(
            config.apply_env(env(&[("USDX_LOG_LEVEL", "loud")])),
            Err(ConfigError::InvalidLogLevel("loud".to_string()))
        );
    }
}
