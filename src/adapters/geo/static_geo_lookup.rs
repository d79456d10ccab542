//! Static Geo Lookup - answers from a region → places table.

use rand::seq::SliceRandom;
use rand::RngCore;
use std::collections::{BTreeMap, HashMap};

use crate::ports::GeoLookup;

/// Geo lookup over an in-memory table of regions and their settlements.
///
/// Names are matched case-insensitively. Lookup order:
/// 1. `place` names a region → random settlement of that region
/// 2. `place` is a settlement → another settlement of the same region
/// 3. otherwise → any known settlement
#[derive(Debug, Clone, Default)]
pub struct StaticGeoLookup {
    regions: BTreeMap<String, Vec<String>>,
    all: Vec<String>,
}

impl StaticGeoLookup {
    pub fn new(table: HashMap<String, Vec<String>>) -> Self {
        let regions: BTreeMap<String, Vec<String>> = table
            .into_iter()
            .filter(|(_, places)| !places.is_empty())
            .map(|(region, places)| (region.to_lowercase(), places))
            .collect();
        let all = regions.values().flatten().cloned().collect();

        Self { regions, all }
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    fn region_of(&self, place: &str) -> Option<&[String]> {
        self.regions
            .values()
            .find(|places| places.iter().any(|p| p.eq_ignore_ascii_case(place)))
            .map(Vec::as_slice)
    }
}

impl GeoLookup for StaticGeoLookup {
    fn nearby_settlement(&self, place: &str, rng: &mut dyn RngCore) -> Option<String> {
        let key = place.trim().to_lowercase();

        if let Some(places) = self.regions.get(&key) {
            return places.choose(rng).cloned();
        }

        if let Some(places) = self.region_of(place.trim()) {
            let others: Vec<&String> = places
                .iter()
                .filter(|p| !p.eq_ignore_ascii_case(place.trim()))
                .collect();
            if let Some(other) = others.choose(rng) {
                return Some((*other).clone());
            }
        }

        self.all.choose(rng).cloned()
    }
}
