//! Session lifecycle configuration: idle eviction and persistence

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;

/// Session lifecycle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Sessions inactive for longer than this are evicted (default: 24h)
    #[serde(default = "default_inactive_timeout_secs")]
    pub inactive_timeout_secs: u64,

    /// How often the idle sweep runs (default: 1h)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    #[serde(default)]
    pub persistence: PersistenceConfig,
}

/// Snapshot persistence to a JSON file
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Directory holding `sessions.json`
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
}

fn default_inactive_timeout_secs() -> u64 {
    24 * 3600
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactive_timeout_secs: default_inactive_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            storage_path: default_storage_path(),
        }
    }
}

impl SessionConfig {
    pub fn inactive_timeout(&self) -> Duration {
        Duration::from_secs(self.inactive_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.inactive_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("session.inactive_timeout_secs"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidTimeout("session.sweep_interval_secs"));
        }
        if self.persistence.enabled && self.persistence.storage_path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("session.persistence.storage_path"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.inactive_timeout(), Duration::from_secs(86_400));
        assert_eq!(config.sweep_interval(), Duration::from_secs(3600));
        assert!(!config.persistence.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let config = SessionConfig {
            sweep_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidTimeout("session.sweep_interval_secs"))
        );
    }

    #[test]
    fn test_enabled_persistence_needs_path() {
        let config = SessionConfig {
            persistence: PersistenceConfig {
                enabled: true,
                storage_path: PathBuf::new(),
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
