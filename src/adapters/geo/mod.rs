//! Geo lookup adapters.

mod static_geo_lookup;

pub use static_geo_lookup::StaticGeoLookup;
