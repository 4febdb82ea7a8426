//! Client-side configuration.

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Push connection retry policy: bounded attempt count, fixed delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub max_attempts: usize,
    pub retry_delay_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay_ms: 3000,
        }
    }
}

impl ChannelConfig {
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub toast_ttl_ms: u64,
    pub channel: ChannelConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3001".to_string(),
            toast_ttl_ms: 5000,
            channel: ChannelConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load `path`, falling back to defaults when the file is missing or
    /// invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                Self::default()
            }
        }
    }

    pub const fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ClientConfig::default();
        assert_eq!(config.toast_ttl(), Duration::from_millis(5000));
        assert_eq!(config.channel.max_attempts, 5);
        assert_eq!(config.channel.retry_delay(), Duration::from_millis(3000));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"toast_ttl_ms": 1000}"#).unwrap();
        assert_eq!(config.toast_ttl_ms, 1000);
        assert_eq!(config.api_base_url, ClientConfig::default().api_base_url);
        assert_eq!(config.channel, ChannelConfig::default());
    }

    #[test]
    fn load_or_default_survives_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert_eq!(ClientConfig::load_or_default(&missing), ClientConfig::default());

        let invalid = dir.path().join("config.json");
        fs::write(&invalid, "{not json").unwrap();
        assert_eq!(ClientConfig::load_or_default(&invalid), ClientConfig::default());

        let valid = dir.path().join("ok.json");
        fs::write(&valid, r#"{"api_base_url":"http://box:9000"}"#).unwrap();
        assert_eq!(
            ClientConfig::load_or_default(&valid).api_base_url,
            "http://box:9000"
        );
    }
}
