//! Transport configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Outbound transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Upper bound on a single send call (default: 30000ms)
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    /// Chat that unaddressed console lines belong to
    #[serde(default = "default_chat")]
    pub default_chat: String,

    /// Print typing indicator changes on the console
    #[serde(default)]
    pub show_typing: bool,
}

fn default_send_timeout_ms() -> u64 {
    30_000
}

fn default_chat() -> String {
    "console".to_string()
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: default_send_timeout_ms(),
            default_chat: default_chat(),
            show_typing: false,
        }
    }
}

impl TransportConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.send_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("transport.send_timeout_ms"));
        }
        if self.default_chat.trim().is_empty() {
            return Err(ValidationError::MissingRequired("transport.default_chat"));
        }
        Ok(())
    }
}
