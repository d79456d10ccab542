//! Message fragmentation.
//!
//! A long message can be split into a few shorter ones, as people tend to
//! do in chat. Fragments are joined with a paragraph break; the transport
//! decides whether that becomes separate bubbles.

use rand::Rng;

use super::profile::FragmentationRules;

/// Separator placed between fragments.
pub const FRAGMENT_SEPARATOR: &str = "\n\n";

/// Fragments `text` if the rules allow it and the frequency roll succeeds.
pub fn maybe_fragment<R: Rng + ?Sized>(
    text: &str,
    rules: &FragmentationRules,
    rng: &mut R,
) -> String {
    if !rules.enabled
        || text.chars().count() <= rules.min_message_length
        || !rng.gen_bool(rules.frequency.clamp(0.0, 1.0))
    {
        return text.to_string();
    }
    fragment(text, rules.max_fragments, rules.min_chars_per_fragment, rng)
}

/// Splits `text` at random space, comma or period boundaries into at most
/// `max_fragments` pieces of at least `min_chars` characters each.
///
/// Returns the text unchanged when it is shorter than `2 * min_chars` or
/// when no valid split exists.
pub fn fragment<R: Rng + ?Sized>(
    text: &str,
    max_fragments: usize,
    min_chars: usize,
    rng: &mut R,
) -> String {
    let min_chars = min_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    if len < min_chars * 2 || max_fragments < 2 {
        return text.to_string();
    }

    let max_extra = (max_fragments - 1).min(len / min_chars - 1);
    if max_extra == 0 {
        return text.to_string();
    }
    let fragment_count = 1 + rng.gen_range(0..max_extra + 1);
    let wanted_breaks = fragment_count - 1;
    if wanted_breaks == 0 {
        return text.to_string();
    }

    let candidates: Vec<usize> = (min_chars..len - min_chars)
        .filter(|&i| matches!(chars[i], ' ' | ',' | '.'))
        .collect();
    if candidates.len() < wanted_breaks {
        return text.to_string();
    }

    let mut selected: Vec<usize> = Vec::with_capacity(wanted_breaks);
    for _ in 0..wanted_breaks {
        let available: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|p| selected.iter().all(|s| s.abs_diff(*p) > min_chars))
            .collect();
        if available.is_empty() {
            break;
        }
        selected.push(available[rng.gen_range(0..available.len())]);
    }
    if selected.is_empty() {
        return text.to_string();
    }
    selected.sort_unstable();

    let mut fragments = Vec::with_capacity(selected.len() + 1);
    let mut start = 0;
    for &bp in &selected {
        fragments.push(chars[start..=bp].iter().collect::<String>().trim().to_string());
        start = bp + 1;
    }
    fragments.push(chars[start..].iter().collect::<String>().trim().to_string());

    if fragments.iter().any(|f| f.chars().count() < min_chars) {
        return text.to_string();
    }
    fragments.join(FRAGMENT_SEPARATOR)
}
