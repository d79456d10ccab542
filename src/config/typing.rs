//! Typing indicator simulation settings

use serde::Deserialize;

use super::error::ValidationError;

/// Typing simulation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TypingConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_chars_per_minute")]
    pub chars_per_minute: u32,

    #[serde(default = "default_min_ms")]
    pub min_ms: u64,

    #[serde(default = "default_max_ms")]
    pub max_ms: u64,

    /// Relative random spread applied to the computed duration
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

fn default_enabled() -> bool {
    true
}

fn default_chars_per_minute() -> u32 {
    400
}

fn default_min_ms() -> u64 {
    1000
}

fn default_max_ms() -> u64 {
    8000
}

fn default_jitter() -> f64 {
    0.15
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            chars_per_minute: default_chars_per_minute(),
            min_ms: default_min_ms(),
            max_ms: default_max_ms(),
            jitter: default_jitter(),
        }
    }
}

impl TypingConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.chars_per_minute == 0 {
            return Err(ValidationError::InvalidTypingSpeed);
        }
        if self.min_ms > self.max_ms {
            return Err(ValidationError::InvalidTypingBounds {
                min_ms: self.min_ms,
                max_ms: self.max_ms,
            });
        }
        if !(0.0..1.0).contains(&self.jitter) {
            return Err(ValidationError::InvalidJitter(self.jitter));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TypingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.chars_per_minute, 400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config = TypingConfig {
            min_ms: 9000,
            max_ms: 1000,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidTypingBounds {
                min_ms: 9000,
                max_ms: 1000
            })
        );
    }

    #[test]
    fn test_jitter_out_of_range_rejected() {
        let config = TypingConfig {
            jitter: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidJitter(_))));
    }

    #[test]
    fn test_zero_speed_rejected() {
        let config = TypingConfig {
            chars_per_minute: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTypingSpeed));
    }
}
