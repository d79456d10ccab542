//! Personality profiles: the parameters of the text-mutation pipeline.

use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

/// Name of the profile used when the requested one does not exist.
pub const DEFAULT_PROFILE: &str = "default";

/// Named bundle of text-mutation parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PersonalityProfile {
    /// Chance of using a random alternate instead of the base text.
    #[serde(default = "default_variation_probability")]
    pub variation_probability: f64,
    #[serde(default)]
    pub typos: TypoRules,
    #[serde(default)]
    pub punctuation: PunctuationRules,
    #[serde(default)]
    pub capitalization: CapitalizationRules,
    #[serde(default)]
    pub emoji: Option<EmojiStyle>,
    #[serde(default)]
    pub fragmentation: FragmentationRules,
    /// Replacement for `{{nearby_village}}` when no geographic data exists.
    #[serde(default = "default_nearby_fallback")]
    pub nearby_fallback: String,
}

impl Default for PersonalityProfile {
    fn default() -> Self {
        Self {
            variation_probability: default_variation_probability(),
            typos: TypoRules::default(),
            punctuation: PunctuationRules::default(),
            capitalization: CapitalizationRules::default(),
            emoji: None,
            fragmentation: FragmentationRules::default(),
            nearby_fallback: default_nearby_fallback(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TypoRules {
    #[serde(default)]
    pub enabled: bool,
    /// Per-character probability of a typo.
    #[serde(default = "default_typo_frequency")]
    pub frequency: f64,
}

impl Default for TypoRules {
    fn default() -> Self {
        Self {
            enabled: false,
            frequency: default_typo_frequency(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PunctuationRules {
    #[serde(default)]
    pub omit_periods: bool,
    #[serde(default)]
    pub multiple_question_marks: bool,
    #[serde(default)]
    pub multiple_exclamation_points: bool,
    #[serde(default)]
    pub use_ellipsis: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CapitalizationRules {
    /// When false, sentence-initial letters are lower-cased.
    #[serde(default = "default_true")]
    pub begin_sentence: bool,
    #[serde(default)]
    pub all_caps: AllCapsRule,
}

impl Default for CapitalizationRules {
    fn default() -> Self {
        Self {
            begin_sentence: true,
            all_caps: AllCapsRule::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct AllCapsRule {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub frequency: f64,
}

/// Coarse emoji frequency labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmojiFrequency {
    None,
    Rare,
    Low,
    High,
    /// Also used for labels this build does not know.
    #[serde(other)]
    Moderate,
}

impl EmojiFrequency {
    pub fn probability(&self) -> f64 {
        match self {
            EmojiFrequency::None => 0.0,
            EmojiFrequency::Rare => 0.1,
            EmojiFrequency::Low => 0.2,
            EmojiFrequency::Moderate => 0.3,
            EmojiFrequency::High => 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmojiStyle {
    pub frequency: EmojiFrequency,
    #[serde(default, alias = "favorite")]
    pub favorites: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FragmentationRules {
    #[serde(default)]
    pub enabled: bool,
    /// Chance that an eligible message is fragmented.
    #[serde(default)]
    pub frequency: f64,
    /// Messages must be longer than this to be considered.
    #[serde(default = "default_min_message_length")]
    pub min_message_length: usize,
    #[serde(default = "default_max_fragments")]
    pub max_fragments: usize,
    #[serde(default = "default_min_chars_per_fragment")]
    pub min_chars_per_fragment: usize,
}

impl Default for FragmentationRules {
    fn default() -> Self {
        Self {
            enabled: false,
            frequency: 0.0,
            min_message_length: default_min_message_length(),
            max_fragments: default_max_fragments(),
            min_chars_per_fragment: default_min_chars_per_fragment(),
        }
    }
}

/// Picks a profile by name, falling back to `default`, then to the
/// built-in defaults.
pub fn select_profile(
    profiles: &HashMap<String, PersonalityProfile>,
    name: Option<&str>,
) -> PersonalityProfile {
    if let Some(profile) = name.and_then(|n| profiles.get(n)) {
        return profile.clone();
    }
    if let Some(requested) = name {
        warn!(requested = requested, "Personality profile not found, using default");
    }
    profiles.get(DEFAULT_PROFILE).cloned().unwrap_or_default()
}

fn default_variation_probability() -> f64 {
    0.8
}

fn default_typo_frequency() -> f64 {
    0.08
}

fn default_true() -> bool {
    true
}

fn default_min_message_length() -> usize {
    40
}

fn default_max_fragments() -> usize {
    3
}

fn default_min_chars_per_fragment() -> usize {
    5
}

fn default_nearby_fallback() -> String {
    "near here".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let profile: PersonalityProfile = serde_yaml::from_str("{}").unwrap();
        assert_eq!(profile, PersonalityProfile::default());
        assert_eq!(profile.variation_probability, 0.8);
        assert!(profile.capitalization.begin_sentence);
        assert_eq!(profile.fragmentation.min_message_length, 40);
        assert!(profile.emoji.is_none());
    }

    #[test]
    fn test_emoji_labels() {
        let style: EmojiStyle =
            serde_yaml::from_str("{frequency: rare, favorite: ['🙂']}").unwrap();
        assert_eq!(style.frequency.probability(), 0.1);
        assert_eq!(style.favorites, vec!["🙂".to_string()]);
    }

    #[test]
    fn test_unknown_emoji_label_reads_as_moderate() {
        let unknown: EmojiStyle = serde_yaml::from_str("{frequency: sometimes}").unwrap();
        assert_eq!(unknown.frequency, EmojiFrequency::Moderate);
        assert_eq!(unknown.frequency.probability(), 0.3);

        let high: EmojiStyle = serde_yaml::from_str("{frequency: high}").unwrap();
        assert_eq!(high.frequency, EmojiFrequency::High);
    }

    #[test]
    fn test_select_profile_fallbacks() {
        let mut profiles = HashMap::new();
        let mut flirty = PersonalityProfile::default();
        flirty.variation_probability = 1.0;
        let mut default = PersonalityProfile::default();
        default.variation_probability = 0.5;
        profiles.insert("flirty".to_string(), flirty);
        profiles.insert(DEFAULT_PROFILE.to_string(), default);

        assert_eq!(select_profile(&profiles, Some("flirty")).variation_probability, 1.0);
        assert_eq!(select_profile(&profiles, Some("shy")).variation_probability, 0.5);
        assert_eq!(select_profile(&HashMap::new(), Some("shy")), PersonalityProfile::default());
    }
}
