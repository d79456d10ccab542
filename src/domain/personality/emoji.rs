//! Trailing emoji.

use rand::seq::SliceRandom;
use rand::Rng;

use super::profile::EmojiStyle;

const DEFAULT_FAVORITES: [&str; 4] = ["😉", "💋", "👍", "👌"];

/// Appends a space and a favorite emoji with the style's probability.
pub fn append_emoji<R: Rng + ?Sized>(text: &str, style: &EmojiStyle, rng: &mut R) -> String {
    let probability = style.frequency.probability();
    if probability <= 0.0 || !rng.gen_bool(probability) {
        return text.to_string();
    }

    let emoji = if style.favorites.is_empty() {
        DEFAULT_FAVORITES.choose(rng).copied()
    } else {
        style.favorites.choose(rng).map(String::as_str)
    };

    match emoji {
        Some(e) => format!("{} {}", text, e),
        None => text.to_string(),
    }
}
