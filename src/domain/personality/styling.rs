//! Punctuation and capitalization styling.

use rand::seq::SliceRandom;
use rand::Rng;

use super::profile::{CapitalizationRules, PunctuationRules};

/// Chance that a message is considered for comma-to-ellipsis replacement.
const ELLIPSIS_MESSAGE_PROBABILITY: f64 = 0.3;
/// Chance that each eligible comma is replaced.
const ELLIPSIS_COMMA_PROBABILITY: f64 = 0.4;

const WORD_PUNCTUATION: [char; 7] = [',', '.', '!', '?', ';', ':', '…'];

pub fn apply_punctuation<R: Rng + ?Sized>(
    text: &str,
    rules: &PunctuationRules,
    rng: &mut R,
) -> String {
    let mut result = text.to_string();

    if rules.omit_periods && result.ends_with('.') {
        result.pop();
    }
    if rules.multiple_question_marks {
        result = multiply_runs(&result, '?', rng);
    }
    if rules.multiple_exclamation_points {
        result = multiply_runs(&result, '!', rng);
    }
    if rules.use_ellipsis && rng.gen_bool(ELLIPSIS_MESSAGE_PROBABILITY) {
        result = commas_to_ellipsis(&result, rng);
    }
    result
}

pub fn apply_capitalization<R: Rng + ?Sized>(
    text: &str,
    rules: &CapitalizationRules,
    rng: &mut R,
) -> String {
    let mut result = if rules.begin_sentence {
        text.to_string()
    } else {
        lowercase_sentence_starts(text)
    };

    if rules.all_caps.enabled {
        result = shout_one_word(&result, rules.all_caps.frequency, rng);
    }
    result
}

/// Multiplies the length of every run of `mark` by 1 or 2.
fn multiply_runs<R: Rng + ?Sized>(text: &str, mark: char, rng: &mut R) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != mark {
            out.push(c);
            continue;
        }
        let mut run = 1;
        while chars.peek() == Some(&mark) {
            chars.next();
            run += 1;
        }
        let factor = rng.gen_range(1..=2);
        out.extend(std::iter::repeat(mark).take(run * factor));
    }
    out
}

/// Replaces some commas followed by whitespace with `...`.
fn commas_to_ellipsis<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let before_space = chars.peek().map_or(false, |n| n.is_whitespace());
        if c == ',' && before_space && rng.gen_bool(ELLIPSIS_COMMA_PROBABILITY) {
            out.push_str("...");
        } else {
            out.push(c);
        }
    }
    out
}

/// Lower-cases the first letter of the text and of every sentence that
/// follows a `.`, `!` or `?` and whitespace.
fn lowercase_sentence_starts(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_start = true;
    let mut after_terminator = false;

    for c in text.chars() {
        if at_start && c.is_alphabetic() {
            out.extend(c.to_lowercase());
            at_start = false;
            after_terminator = false;
            continue;
        }
        out.push(c);

        if matches!(c, '.' | '!' | '?') {
            after_terminator = true;
            at_start = false;
        } else if c.is_whitespace() {
            if after_terminator {
                at_start = true;
            }
        } else {
            at_start = false;
            after_terminator = false;
        }
    }
    out
}

/// With probability `frequency`, upper-cases one word longer than three
/// characters with no punctuation. Only messages of more than three words
/// are considered.
fn shout_one_word<R: Rng + ?Sized>(text: &str, frequency: f64, rng: &mut R) -> String {
    let words: Vec<&str> = text.split(' ').collect();
    if words.len() <= 3 || !rng.gen_bool(frequency.clamp(0.0, 1.0)) {
        return text.to_string();
    }

    let eligible: Vec<usize> = words
        .iter()
        .enumerate()
        .filter(|(_, w)| w.chars().count() > 3 && !w.contains(&WORD_PUNCTUATION[..]))
        .map(|(i, _)| i)
        .collect();

    let Some(&chosen) = eligible.choose(rng) else {
        return text.to_string();
    };

    words
        .iter()
        .enumerate()
        .map(|(i, w)| if i == chosen { w.to_uppercase() } else { w.to_string() })
        .collect::<Vec<_>>()
        .join(" ")
}
