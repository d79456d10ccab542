//! Media configuration: asset catalogs, selection sets, and dispatch policy.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::media_type::MediaType;
use super::sequence::MediaSequence;

/// Media section of the bot bundle.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaConfig {
    #[serde(default)]
    pub images: AssetCatalog,
    #[serde(default)]
    pub locations: AssetCatalog,
    #[serde(default)]
    pub contacts: AssetCatalog,
    #[serde(default)]
    pub documents: AssetCatalog,
    #[serde(default)]
    pub stickers: AssetSets,
    #[serde(default)]
    pub voice_notes: AssetSets,
    #[serde(default)]
    pub settings: MediaSettings,
    #[serde(default)]
    pub sequences: HashMap<String, MediaSequence>,
}

/// Assets addressed directly by category.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetCatalog {
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub categories: HashMap<String, MediaAsset>,
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self {
            enabled: true,
            categories: HashMap::new(),
        }
    }
}

/// One asset with its candidate captions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaAsset {
    pub path: String,
    #[serde(default)]
    pub captions: Vec<String>,
}

/// Named sets of interchangeable assets; one is picked at random per send.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetSets {
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// Directory the set entries are relative to.
    #[serde(default)]
    pub base_path: Option<String>,
    #[serde(default)]
    pub sets: HashMap<String, Vec<String>>,
}

impl Default for AssetSets {
    fn default() -> Self {
        Self {
            enabled: true,
            base_path: None,
            sets: HashMap::new(),
        }
    }
}

/// What to do when a configured asset is missing on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingMediaAction {
    /// Do nothing.
    #[default]
    Skip,
    /// Run the caller-supplied fallback.
    Fallback,
    /// Send a canned text instead.
    Message,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MissingMediaPolicy {
    #[serde(default)]
    pub action: MissingMediaAction,
    #[serde(default = "default_missing_message")]
    pub fallback_message: String,
}

impl Default for MissingMediaPolicy {
    fn default() -> Self {
        Self {
            action: MissingMediaAction::Skip,
            fallback_message: default_missing_message(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FailedSendPolicy {
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub failure_message: Option<String>,
}

impl Default for FailedSendPolicy {
    fn default() -> Self {
        Self {
            retry_count: 0,
            retry_delay_ms: default_retry_delay_ms(),
            failure_message: None,
        }
    }
}

/// Global media dispatch settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    /// Pick a random caption instead of the first one.
    #[serde(default)]
    pub randomize_captions: bool,
    /// Entries kept per chat in the dispatch history.
    #[serde(default = "default_history_length")]
    pub history_length: usize,
    #[serde(default)]
    pub missing_media: MissingMediaPolicy,
    #[serde(default)]
    pub failed_send: FailedSendPolicy,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            randomize_captions: false,
            history_length: default_history_length(),
            missing_media: MissingMediaPolicy::default(),
            failed_send: FailedSendPolicy::default(),
        }
    }
}

/// Asset chosen for one send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub path: String,
    pub captions: Vec<String>,
}

impl MediaConfig {
    /// Whether sends of this type are allowed at all.
    pub fn is_enabled(&self, media_type: MediaType) -> bool {
        match media_type {
            MediaType::Image => self.images.enabled,
            MediaType::Location => self.locations.enabled,
            MediaType::Contact => self.contacts.enabled,
            MediaType::Document => self.documents.enabled,
            MediaType::Sticker => self.stickers.enabled,
            MediaType::Voice => self.voice_notes.enabled,
        }
    }

    /// Resolves a (type, category) pair to an asset.
    ///
    /// Direct lookup for catalog types; random pick from the named set for
    /// stickers and voice notes.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        media_type: MediaType,
        category: &str,
        rng: &mut R,
    ) -> Option<ResolvedAsset> {
        let catalog = match media_type {
            MediaType::Image => &self.images,
            MediaType::Location => &self.locations,
            MediaType::Contact => &self.contacts,
            MediaType::Document => &self.documents,
            MediaType::Sticker => return pick_from_set(&self.stickers, category, rng),
            MediaType::Voice => return pick_from_set(&self.voice_notes, category, rng),
        };

        catalog.categories.get(category).map(|asset| ResolvedAsset {
            path: asset.path.clone(),
            captions: asset.captions.clone(),
        })
    }

    /// Named media sequence, if configured.
    pub fn sequence(&self, name: &str) -> Option<&MediaSequence> {
        self.sequences.get(name)
    }
}

fn pick_from_set<R: Rng + ?Sized>(
    sets: &AssetSets,
    name: &str,
    rng: &mut R,
) -> Option<ResolvedAsset> {
    let entry = sets.sets.get(name)?.choose(rng)?;
    let path = match &sets.base_path {
        Some(base) => Path::new(base).join(entry).to_string_lossy().into_owned(),
        None => entry.clone(),
    };
    Some(ResolvedAsset {
        path,
        captions: Vec::new(),
    })
}

fn enabled() -> bool {
    true
}

fn default_missing_message() -> String {
    "Sorry, I can't send that right now".to_string()
}

fn default_retry_delay_ms() -> u64 {
    5000
}

fn default_history_length() -> usize {
    10
}
