//! Personality domain module.
//!
//! Pure text transformations that make scripted messages read as if a
//! person typed them. Every stage takes the random source as an argument.

mod emoji;
mod engine;
mod fragment;
mod placeholders;
mod profile;
mod styling;
mod typos;
mod variation;

pub use emoji::append_emoji;
pub use engine::PersonalityEngine;
pub use fragment::{fragment, maybe_fragment, FRAGMENT_SEPARATOR};
pub use placeholders::substitute;
pub use profile::{
    select_profile, AllCapsRule, CapitalizationRules, EmojiFrequency, EmojiStyle,
    FragmentationRules, PersonalityProfile, PunctuationRules, TypoRules, DEFAULT_PROFILE,
};
pub use styling::{apply_capitalization, apply_punctuation};
pub use typos::inject_typos;
pub use variation::select_variation;
