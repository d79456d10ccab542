//! Variation selection.

use rand::seq::SliceRandom;
use rand::Rng;

/// Returns a random alternate with probability `probability`, otherwise the
/// base text. Without alternates the base text is always returned.
pub fn select_variation<'a, R: Rng + ?Sized>(
    base: &'a str,
    variations: &'a [String],
    probability: f64,
    rng: &mut R,
) -> &'a str {
    if variations.is_empty() || !rng.gen_bool(probability.clamp(0.0, 1.0)) {
        return base;
    }
    variations.choose(rng).map(String::as_str).unwrap_or(base)
}
