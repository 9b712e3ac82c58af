//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables for the interaction and history engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Minimum spacing between applied live updates, in milliseconds.
    pub live_update_interval_ms: f64,
    /// Maximum number of history actions kept (`None` = unbounded).
    pub history_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            live_update_interval_ms: 1000.0 / 144.0,
            history_limit: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.live_update_interval_ms.is_finite() || self.live_update_interval_ms < 0.0 {
            return Err(ConfigError::Invalid {
                field: "liveUpdateIntervalMs",
                reason: format!("expected a non-negative number, got {}", self.live_update_interval_ms),
            });
        }
        if self.history_limit == Some(0) {
            return Err(ConfigError::Invalid {
                field: "historyLimit",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn live_update_interval(&self) -> Duration {
        Duration::from_secs_f64(self.live_update_interval_ms.max(0.0) / 1000.0)
    }
}
