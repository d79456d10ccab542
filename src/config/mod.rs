//! Application configuration module
//!
//! Configuration is layered with the `config` and `dotenvy` crates:
//!
//! 1. `.env` file, if present (development)
//! 2. Optional YAML file named by `PERSONA_FLOW_CONFIG` (default `persona-flow.yaml`)
//! 3. Environment variables with the `PERSONA_FLOW` prefix, `__` between levels
//!
//! Every section has defaults, so an empty environment yields a usable
//! configuration. The bot's scripted content lives separately in the
//! [`BotBundle`] referenced by `engine.bundle_path`.
//!
//! # Example
//!
//! ```no_run
//! use persona_flow::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Bundle at {}", config.engine.bundle_path.display());
//! ```

mod bundle;
mod classifier;
mod engine;
mod error;
mod logging;
mod session;
mod transport;
mod typing;

pub use bundle::{BotBundle, BundleError};
pub use classifier::ClassifierConfig;
pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use session::{PersistenceConfig, SessionConfig};
pub use transport::TransportConfig;
pub use typing::TypingConfig;

use serde::Deserialize;
use std::path::Path;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "PERSONA_FLOW_CONFIG";

/// Configuration file used when `PERSONA_FLOW_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "persona-flow.yaml";

const ENV_PREFIX: &str = "PERSONA_FLOW";

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Bundle location, scenario/personality selection, default delays
    #[serde(default)]
    pub engine: EngineConfig,

    /// Typing indicator simulation
    #[serde(default)]
    pub typing: TypingConfig,

    /// Idle eviction and persistence
    #[serde(default)]
    pub session: SessionConfig,

    /// Remote classifier service
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Outbound transport
    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the config file and environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `PERSONA_FLOW__ENGINE__SCENARIO=onboarding` -> `engine.scenario = "onboarding"`
    /// - `PERSONA_FLOW__CLASSIFIER__BASE_URL=...` -> `classifier.base_url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is malformed or values cannot be
    /// parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(path)
    }

    /// Load configuration from an explicit file path, still layered under
    /// the environment. A missing file is not an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = config::File::from(path.as_ref())
            .format(config::FileFormat::Yaml)
            .required(false);

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found, section by section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.engine.validate()?;
        self.typing.validate()?;
        self.session.validate()?;
        self.classifier.validate()?;
        self.transport.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "PERSONA_FLOW__ENGINE__SCENARIO",
        "PERSONA_FLOW__ENGINE__RNG_SEED",
        "PERSONA_FLOW__TYPING__ENABLED",
        "PERSONA_FLOW__CLASSIFIER__BASE_URL",
        "PERSONA_FLOW__CLASSIFIER__API_KEY",
        "PERSONA_FLOW__SESSION__PERSISTENCE__ENABLED",
    ];

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let config = AppConfig::load_from("/no/such/persona-flow.yaml").unwrap();

        assert_eq!(config.engine.message_delay_ms, 3000);
        assert_eq!(config.session.inactive_timeout_secs, 86_400);
        assert!(config.typing.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PERSONA_FLOW__ENGINE__SCENARIO", "onboarding");
        env::set_var("PERSONA_FLOW__ENGINE__RNG_SEED", "7");
        env::set_var("PERSONA_FLOW__TYPING__ENABLED", "false");
        env::set_var("PERSONA_FLOW__CLASSIFIER__BASE_URL", "https://nlp.example.com");
        env::set_var("PERSONA_FLOW__SESSION__PERSISTENCE__ENABLED", "true");
        let result = AppConfig::load_from("/no/such/persona-flow.yaml");
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.engine.scenario.as_deref(), Some("onboarding"));
        assert_eq!(config.engine.rng_seed, Some(7));
        assert!(!config.typing.enabled);
        assert_eq!(config.classifier.base_url, "https://nlp.example.com");
        assert!(config.session.persistence.enabled);
    }

    #[test]
    fn test_file_values_are_loaded() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let file = yaml_file(
            r#"
engine:
  bundle_path: bots/demo.yaml
  personality: shy
typing:
  chars_per_minute: 600
logging:
  json: true
"#,
        );

        let config = AppConfig::load_from(file.path()).unwrap();

        assert_eq!(config.engine.bundle_path, Path::new("bots/demo.yaml"));
        assert_eq!(config.engine.personality.as_deref(), Some("shy"));
        assert_eq!(config.typing.chars_per_minute, 600);
        assert!(config.logging.json);
    }

    #[test]
    fn test_environment_overrides_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let file = yaml_file("engine:\n  scenario: from_file\n");
        env::set_var("PERSONA_FLOW__ENGINE__SCENARIO", "from_env");
        let result = AppConfig::load_from(file.path());
        clear_env();

        assert_eq!(result.unwrap().engine.scenario.as_deref(), Some("from_env"));
    }

    #[test]
    fn test_validate_reports_bad_section() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PERSONA_FLOW__CLASSIFIER__BASE_URL", "localhost:5000");
        let result = AppConfig::load_from("/no/such/persona-flow.yaml");
        clear_env();

        let config = result.unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_config_error_wraps_validation() {
        let err: ConfigError = ValidationError::InvalidTypingSpeed.into();
        assert!(err.to_string().contains("Typing speed"));
    }
}
