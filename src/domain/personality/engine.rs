//! Personality engine: runs a template through the mutation pipeline.

use rand::Rng;
use std::sync::Arc;

use super::emoji::append_emoji;
use super::fragment::maybe_fragment;
use super::placeholders::substitute;
use super::profile::PersonalityProfile;
use super::styling::{apply_capitalization, apply_punctuation};
use super::typos::inject_typos;
use super::variation::select_variation;
use crate::domain::session::UserData;
use crate::ports::GeoLookup;

/// Renders outbound text for one personality.
///
/// Stages run in a fixed order: variation, placeholders, typos,
/// punctuation, capitalization, emoji, fragmentation. Given the same RNG
/// state the output is fully reproducible.
#[derive(Clone)]
pub struct PersonalityEngine {
    profile: PersonalityProfile,
    geo: Arc<dyn GeoLookup>,
}

impl PersonalityEngine {
    pub fn new(profile: PersonalityProfile, geo: Arc<dyn GeoLookup>) -> Self {
        Self { profile, geo }
    }

    pub fn profile(&self) -> &PersonalityProfile {
        &self.profile
    }

    /// Full pipeline for a step message.
    pub fn render<R: Rng>(
        &self,
        base: &str,
        variations: &[String],
        user_data: &UserData,
        rng: &mut R,
    ) -> String {
        let chosen = select_variation(base, variations, self.profile.variation_probability, rng);
        let text = substitute(
            chosen,
            user_data,
            self.geo.as_ref(),
            &self.profile.nearby_fallback,
            rng,
        );
        self.stylize(&text, rng)
    }

    /// Variation selection only; used for media captions.
    pub fn choose_variation<'a, R: Rng>(
        &self,
        base: &'a str,
        variations: &'a [String],
        rng: &mut R,
    ) -> &'a str {
        select_variation(base, variations, self.profile.variation_probability, rng)
    }

    fn stylize<R: Rng>(&self, text: &str, rng: &mut R) -> String {
        if text.is_empty() {
            return String::new();
        }
        let profile = &self.profile;

        let mut text = if profile.typos.enabled {
            inject_typos(text, profile.typos.frequency, rng)
        } else {
            text.to_string()
        };
        text = apply_punctuation(&text, &profile.punctuation, rng);
        text = apply_capitalization(&text, &profile.capitalization, rng);
        if let Some(style) = &profile.emoji {
            text = append_emoji(&text, style, rng);
        }
        maybe_fragment(&text, &profile.fragmentation, rng)
    }
}

impl std::fmt::Debug for PersonalityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonalityEngine")
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::personality::profile::{
        EmojiFrequency, EmojiStyle, FragmentationRules, PunctuationRules, TypoRules,
    };
    use crate::ports::NoGeoData;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn plain_engine() -> PersonalityEngine {
        PersonalityEngine::new(PersonalityProfile::default(), Arc::new(NoGeoData))
    }

    fn noisy_profile() -> PersonalityProfile {
        PersonalityProfile {
            typos: TypoRules {
                enabled: true,
                frequency: 0.1,
            },
            punctuation: PunctuationRules {
                omit_periods: true,
                multiple_question_marks: true,
                multiple_exclamation_points: true,
                use_ellipsis: true,
            },
            emoji: Some(EmojiStyle {
                frequency: EmojiFrequency::High,
                favorites: vec!["🙂".to_string()],
            }),
            fragmentation: FragmentationRules {
                enabled: true,
                frequency: 0.5,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_default_profile_only_substitutes() {
        let data = UserData {
            location: Some("Lyon".to_string()),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let out = plain_engine().render("You live in {{location}}?", &[], &data, &mut rng);
        assert_eq!(out, "You live in Lyon?");
    }

    #[test]
    fn test_empty_template_renders_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let engine = PersonalityEngine::new(noisy_profile(), Arc::new(NoGeoData));
        assert_eq!(engine.render("", &[], &UserData::default(), &mut rng), "");
    }

    #[test]
    fn test_choose_variation_does_not_stylize() {
        let mut rng = StdRng::seed_from_u64(1);
        let engine = PersonalityEngine::new(noisy_profile(), Arc::new(NoGeoData));
        assert_eq!(engine.choose_variation("Me, at the beach.", &[], &mut rng), "Me, at the beach.");
    }

    proptest! {
        #[test]
        fn prop_render_is_deterministic_under_seed(
            template in "[A-Za-z ,.!?]{0,80}",
            seed in any::<u64>(),
        ) {
            let engine = PersonalityEngine::new(noisy_profile(), Arc::new(NoGeoData));
            let variations = vec!["Alt one.".to_string(), "Alt two!".to_string()];
            let data = UserData::default();

            let a = engine.render(&template, &variations, &data, &mut StdRng::seed_from_u64(seed));
            let b = engine.render(&template, &variations, &data, &mut StdRng::seed_from_u64(seed));
            prop_assert_eq!(a, b);
        }
    }
}
