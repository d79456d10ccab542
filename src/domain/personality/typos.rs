//! Typo injection.

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Keyboard neighbours of each lowercase letter.
static NEIGHBOURS: Lazy<HashMap<char, Vec<char>>> = Lazy::new(|| {
    [
        ('a', "qzs"),
        ('b', "vghn"),
        ('c', "xdfv"),
        ('d', "serfcx"),
        ('e', "zdr"),
        ('f', "drtgvc"),
        ('g', "ftyhbv"),
        ('h', "gyujnb"),
        ('i', "ujko"),
        ('j', "huikm"),
        ('k', "jilo"),
        ('l', "kopm"),
        ('m', "njk"),
        ('n', "bhjm"),
        ('o', "iklp"),
        ('p', "olm"),
        ('q', "asw"),
        ('r', "edfgt"),
        ('s', "qazxcdew"),
        ('t', "rfghy"),
        ('u', "yhji"),
        ('v', "cfgb"),
        ('w', "qase"),
        ('x', "zsdc"),
        ('y', "tghu"),
        ('z', "asx"),
    ]
    .into_iter()
    .map(|(key, near)| (key, near.chars().collect()))
    .collect()
});

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Applies a typo to each character with probability `frequency`.
///
/// A typo is one of, uniformly: dropping the character, doubling it,
/// replacing it with a keyboard neighbour (case preserved), or following it
/// with a random lowercase letter.
pub fn inject_typos<R: Rng + ?Sized>(text: &str, frequency: f64, rng: &mut R) -> String {
    let frequency = frequency.clamp(0.0, 1.0);
    let mut out = String::with_capacity(text.len() + 8);

    for c in text.chars() {
        if !rng.gen_bool(frequency) {
            out.push(c);
            continue;
        }
        match rng.gen_range(0..4) {
            0 => {}
            1 => {
                out.push(c);
                out.push(c);
            }
            2 => out.push(neighbour(c, rng).unwrap_or(c)),
            _ => {
                out.push(c);
                let extra = ALPHABET[rng.gen_range(0..ALPHABET.len())];
                out.push(extra as char);
            }
        }
    }
    out
}

fn neighbour<R: Rng + ?Sized>(c: char, rng: &mut R) -> Option<char> {
    let lower = c.to_ascii_lowercase();
    let picked = *NEIGHBOURS.get(&lower)?.choose(rng)?;
    Some(if c.is_ascii_uppercase() {
        picked.to_ascii_uppercase()
    } else {
        picked
    })
}
