//! Shared random number generator.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, PoisonError};

/// A `StdRng` shared between the engine, the drain tasks and the media
/// dispatcher.
///
/// The lock is never held across an await point.
#[derive(Debug, Clone)]
pub struct SharedRng(Arc<Mutex<StdRng>>);

impl SharedRng {
    /// Seeded when `seed` is given, from OS entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self(Arc::new(Mutex::new(rng)))
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    /// Runs `f` with exclusive access to the generator.
    pub fn with<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

impl Default for SharedRng {
    fn default() -> Self {
        Self::new(None)
    }
}
