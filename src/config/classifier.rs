//! Classifier service configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Remote intent/entity classifier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer key sent with every request
    #[serde(default)]
    pub api_key: Option<Secret<String>>,

    /// Request timeout in milliseconds (default: 10000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("classifier.base_url"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidUrl(self.base_url.clone()));
        }
        if self.timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("classifier.timeout_ms"));
        }
        Ok(())
    }
}
