//! Bot bundle - the YAML document holding scenarios, personalities, the
//! geo table and the media catalog. Loaded once at startup and never
//! mutated afterwards.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::media::MediaConfig;
use crate::domain::personality::{select_profile, PersonalityProfile};
use crate::domain::scenario::{Scenario, ScenarioCatalog, ScenarioError};

/// Errors raised while loading the bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("failed to read bundle {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse bundle: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

/// Everything a bot needs besides runtime configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BotBundle {
    #[serde(default)]
    pub scenarios: BTreeMap<String, Scenario>,

    #[serde(default)]
    pub personalities: HashMap<String, PersonalityProfile>,

    /// Region name to nearby places.
    #[serde(default)]
    pub geo: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub media: MediaConfig,
}

impl BotBundle {
    /// Reads and parses a bundle file.
    ///
    /// # Errors
    ///
    /// Returns `BundleError::Io` if the file cannot be read and
    /// `BundleError::Parse` if it is not a valid bundle.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BundleError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, BundleError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Builds the scenario catalog, checking every scenario's step graph.
    pub fn catalog(&self) -> Result<ScenarioCatalog, BundleError> {
        Ok(ScenarioCatalog::new(self.scenarios.clone())?)
    }

    /// Personality by name, with the usual `default` fallback.
    pub fn personality(&self, name: Option<&str>) -> PersonalityProfile {
        select_profile(&self.personalities, name)
    }
}
