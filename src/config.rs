//! Configuration management for Tradepost.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for the Tradepost core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradepostConfig {
    /// Login rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitSettings,

    /// Offer engine configuration
    #[serde(default)]
    pub engine: EngineSettings,
}

impl Default for TradepostConfig {
    fn default() -> Self {
        Self {
            rate_limiting: RateLimitSettings::default(),
            engine: EngineSettings::default(),
        }
    }
}

/// Login rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Failed attempts allowed before a key is blocked
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Length of the fixed failure window in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            window_secs: default_window_secs(),
        }
    }
}

impl RateLimitSettings {
    /// The failure window as a [`Duration`].
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    // 15 minutes
    900
}

/// Offer engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Times a version-conflicted commit is retried before the conflict
    /// is surfaced to the caller
    #[serde(default = "default_commit_retries")]
    pub commit_retries: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            commit_retries: default_commit_retries(),
        }
    }
}

fn default_commit_retries() -> u32 {
    1
}

impl TradepostConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: TradepostConfig = serde_yaml::from_str(&contents)
            .map_err(|e| crate::error::TradepostError::Config(e.to_string()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TradepostConfig::default();
        assert_eq!(config.rate_limiting.max_attempts, 5);
        assert_eq!(config.rate_limiting.window(), Duration::from_secs(900));
        assert_eq!(config.engine.commit_retries, 1);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: TradepostConfig =
            serde_yaml::from_str("rate_limiting:\n  max_attempts: 3\n").unwrap();
        assert_eq!(config.rate_limiting.max_attempts, 3);
        assert_eq!(config.rate_limiting.window_secs, 900);
        assert_eq!(config.engine.commit_retries, 1);
    }
}
