//! Engine configuration: bundle location, selections and default delays

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;

/// Conversation engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// YAML bundle with scenarios, personalities, geo table and media
    #[serde(default = "default_bundle_path")]
    pub bundle_path: PathBuf,

    /// Scenario to run (first scenario in the bundle when unset or unknown)
    #[serde(default)]
    pub scenario: Option<String>,

    /// Personality profile (`default` when unset or unknown)
    #[serde(default)]
    pub personality: Option<String>,

    /// Text sent when a step cannot be executed
    #[serde(default = "default_apology_text")]
    pub apology_text: String,

    #[serde(default = "default_message_delay_ms")]
    pub message_delay_ms: u64,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_media_delay_ms")]
    pub media_delay_ms: u64,

    /// Root against which relative media paths are resolved
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,

    /// Per-chat worker exits after this much silence
    #[serde(default = "default_worker_idle_timeout_secs")]
    pub worker_idle_timeout_secs: u64,

    /// Fixed seed for reproducible runs
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_bundle_path() -> PathBuf {
    PathBuf::from("bundle.yaml")
}

fn default_apology_text() -> String {
    "Sorry, something went wrong on my side. Give me a moment.".to_string()
}

fn default_message_delay_ms() -> u64 {
    3000
}

fn default_retry_delay_ms() -> u64 {
    5000
}

fn default_media_delay_ms() -> u64 {
    5000
}

fn default_media_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_worker_idle_timeout_secs() -> u64 {
    300
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bundle_path: default_bundle_path(),
            scenario: None,
            personality: None,
            apology_text: default_apology_text(),
            message_delay_ms: default_message_delay_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            media_delay_ms: default_media_delay_ms(),
            media_root: default_media_root(),
            worker_idle_timeout_secs: default_worker_idle_timeout_secs(),
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    pub fn worker_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_idle_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bundle_path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("engine.bundle_path"));
        }
        if self.worker_idle_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("engine.worker_idle_timeout_secs"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.bundle_path, PathBuf::from("bundle.yaml"));
        assert_eq!(config.message_delay_ms, 3000);
        assert_eq!(config.retry_delay_ms, 5000);
        assert!(config.scenario.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_bundle_path_rejected() {
        let config = EngineConfig {
            bundle_path: PathBuf::new(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("engine.bundle_path"))
        );
    }

    #[test]
    fn test_zero_worker_timeout_rejected() {
        let config = EngineConfig {
            worker_idle_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
