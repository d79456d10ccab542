//! Geo Lookup Port - Interface for finding a settlement near a place.
//!
//! Used by the personality engine to fill `{{nearby_village}}`.

use rand::RngCore;

/// Port for nearby-settlement lookups.
///
/// Lookups are synchronous: implementations are expected to answer from
/// data loaded in memory.
pub trait GeoLookup: Send + Sync {
    /// Returns a settlement near `place`.
    ///
    /// When `place` is unknown, implementations may return any known
    /// settlement; `None` means no geographic data is available at all.
    fn nearby_settlement(&self, place: &str, rng: &mut dyn RngCore) -> Option<String>;
}

/// Lookup with no data; always answers `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeoData;

impl GeoLookup for NoGeoData {
    fn nearby_settlement(&self, _place: &str, _rng: &mut dyn RngCore) -> Option<String> {
        None
    }
}
