//! Placeholder substitution from collected user data.

use rand::RngCore;

use crate::domain::session::UserData;
use crate::ports::GeoLookup;

const LOCATION: &str = "{{location}}";
const AGE: &str = "{{age}}";
const NEARBY: [&str; 2] = ["{{nearby_village}}", "{{nearby_settlement}}"];

/// Fills `{{location}}`, `{{age}}` and `{{nearby_village}}`.
///
/// Placeholders whose data has not been collected are left as they are.
pub fn substitute(
    text: &str,
    user_data: &UserData,
    geo: &dyn GeoLookup,
    nearby_fallback: &str,
    rng: &mut dyn RngCore,
) -> String {
    let mut result = text.to_string();

    if let Some(location) = user_data.location.as_deref() {
        if NEARBY.iter().any(|p| result.contains(p)) {
            let nearby = geo
                .nearby_settlement(location, rng)
                .unwrap_or_else(|| nearby_fallback.to_string());
            for placeholder in NEARBY {
                result = result.replace(placeholder, &nearby);
            }
        }
        result = result.replace(LOCATION, location);
    }

    if let Some(age) = user_data.age {
        result = result.replace(AGE, &age.to_string());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::NoGeoData;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct FixedGeo;

    impl GeoLookup for FixedGeo {
        fn nearby_settlement(&self, _place: &str, _rng: &mut dyn RngCore) -> Option<String> {
            Some("Oullins".to_string())
        }
    }

    fn data() -> UserData {
        UserData {
            location: Some("Lyon".to_string()),
            age: Some(27),
            ..Default::default()
        }
    }

    #[test]
    fn test_fills_known_values() {
        let mut rng = StdRng::seed_from_u64(1);
        let out = substitute(
            "{{age}} and in {{location}}, near {{nearby_village}}",
            &data(),
            &FixedGeo,
            "around",
            &mut rng,
        );
        assert_eq!(out, "27 and in Lyon, near Oullins");
    }

    #[test]
    fn test_alias_and_fallback_phrase() {
        let mut rng = StdRng::seed_from_u64(1);
        let out = substitute("by {{nearby_settlement}}", &data(), &NoGeoData, "around", &mut rng);
        assert_eq!(out, "by around");
    }

    #[test]
    fn test_missing_data_leaves_placeholder() {
        let mut rng = StdRng::seed_from_u64(1);
        let out = substitute(
            "{{location}} {{age}} {{nearby_village}}",
            &UserData::default(),
            &FixedGeo,
            "around",
            &mut rng,
        );
        assert_eq!(out, "{{location}} {{age}} {{nearby_village}}");
    }
}
