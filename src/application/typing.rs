//! Typing-indicator timing.

use rand::Rng;
use std::time::Duration;

/// How long the "typing…" indicator stays on before a message goes out.
#[derive(Debug, Clone, PartialEq)]
pub struct TypingSimulation {
    pub enabled: bool,
    pub chars_per_minute: u32,
    pub min: Duration,
    pub max: Duration,
    /// Relative jitter; 0.15 means ±15%.
    pub jitter: f64,
}

impl Default for TypingSimulation {
    fn default() -> Self {
        Self {
            enabled: true,
            chars_per_minute: 400,
            min: Duration::from_millis(1000),
            max: Duration::from_millis(8000),
            jitter: 0.15,
        }
    }
}

impl TypingSimulation {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Typing time for `chars` characters, jittered then clamped to
    /// `[min, max]`.
    pub fn duration_for<R: Rng + ?Sized>(&self, chars: usize, rng: &mut R) -> Duration {
        let cpm = f64::from(self.chars_per_minute.max(1));
        let base_ms = chars as f64 * 60_000.0 / cpm;

        let factor = if self.jitter > 0.0 {
            rng.gen_range((1.0 - self.jitter)..=(1.0 + self.jitter))
        } else {
            1.0
        };

        let min_ms = self.min.as_millis() as f64;
        let max_ms = (self.max.as_millis() as f64).max(min_ms);
        Duration::from_millis((base_ms * factor).clamp(min_ms, max_ms).round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn proportional_to_length_without_jitter() {
        let typing = TypingSimulation {
            jitter: 0.0,
            ..TypingSimulation::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        // 20 chars at 400 cpm = 3 s
        assert_eq!(typing.duration_for(20, &mut rng), Duration::from_millis(3000));
    }

    #[test]
    fn short_and_long_messages_are_clamped() {
        let typing = TypingSimulation::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(typing.duration_for(1, &mut rng), Duration::from_millis(1000));
        assert_eq!(typing.duration_for(5000, &mut rng), Duration::from_millis(8000));
    }

    proptest! {
        #[test]
        fn always_within_bounds(chars in 0usize..10_000, seed: u64) {
            let typing = TypingSimulation::default();
            let mut rng = StdRng::seed_from_u64(seed);
            let d = typing.duration_for(chars, &mut rng);
            prop_assert!(d >= typing.min && d <= typing.max);
        }

        #[test]
        fn jitter_stays_within_fifteen_percent(seed: u64) {
            let typing = TypingSimulation::default();
            let mut rng = StdRng::seed_from_u64(seed);
            // 30 chars = 4500 ms nominal, well inside the clamp range
            let ms = typing.duration_for(30, &mut rng).as_millis() as f64;
            prop_assert!((3825.0..=5175.0).contains(&ms));
        }
    }
}
