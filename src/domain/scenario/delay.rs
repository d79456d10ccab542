//! Outbound delays: fixed or sampled from an inclusive range.

use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

/// Default wait before a step message.
pub const DEFAULT_MESSAGE_DELAY_MS: u64 = 3000;

/// Default wait before a retry message or a media send.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 5000;

/// Either `1500` or `{ min: 1000, max: 3000 }` in scenario files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DelaySpec {
    Fixed(u64),
    Range { min: u64, max: u64 },
}

impl DelaySpec {
    /// Picks a concrete delay. Ranges are sampled uniformly, bounds included;
    /// reversed bounds are swapped.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let ms = match *self {
            DelaySpec::Fixed(ms) => ms,
            DelaySpec::Range { min, max } => {
                let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
                rng.gen_range(lo..=hi)
            }
        };
        Duration::from_millis(ms)
    }
}

/// Samples `spec`, or uses `default_ms` when the template has no delay.
pub fn sample_or<R: Rng + ?Sized>(spec: Option<&DelaySpec>, default_ms: u64, rng: &mut R) -> Duration {
    spec.map(|s| s.sample(rng))
        .unwrap_or_else(|| Duration::from_millis(default_ms))
}
