//! Classifier vocabulary.
//!
//! The classifier itself is an external service; these are the values the
//! engine exchanges with it. `Classification::neutral()` is the result the
//! engine substitutes whenever the service fails.

use serde::{Deserialize, Deserializer, Serialize};

/// Intent labels reported by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Location,
    Age,
    ServiceSelection,
    Scheduling,
    Confirmation,
    #[default]
    Unclear,
    /// Any label this build does not know about.
    #[serde(other)]
    Other,
}

/// Entities the classifier can report as present in a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Location,
    Age,
}

/// Result of classifying one inbound reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(default)]
    pub intent: Intent,
    #[serde(default)]
    pub contains_location: bool,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub contains_age: bool,
    #[serde(default, deserialize_with = "lenient_age")]
    pub age_value: Option<u32>,
    #[serde(default = "no_service")]
    pub service_type: String,
    #[serde(default)]
    pub scheduling_info: Option<String>,
}

impl Classification {
    /// Neutral result: unclear intent, nothing detected.
    pub fn neutral() -> Self {
        Self {
            intent: Intent::Unclear,
            contains_location: false,
            location_name: None,
            contains_age: false,
            age_value: None,
            service_type: no_service(),
            scheduling_info: None,
        }
    }

    /// Returns true if the given entity was reported present.
    pub fn detected(&self, entity: EntityKind) -> bool {
        match entity {
            EntityKind::Location => self.contains_location,
            EntityKind::Age => self.contains_age,
        }
    }

    /// Detected location, if the classifier reported one with a name.
    pub fn location(&self) -> Option<&str> {
        if self.contains_location {
            self.location_name.as_deref().filter(|l| !l.trim().is_empty())
        } else {
            None
        }
    }

    /// Detected age, if the classifier reported one with a value.
    pub fn age(&self) -> Option<u32> {
        if self.contains_age {
            self.age_value.filter(|age| *age > 0)
        } else {
            None
        }
    }

    /// Chosen service, `None` when the classifier reported `none`.
    pub fn selected_service(&self) -> Option<&str> {
        let service = self.service_type.trim();
        if service.is_empty() || service.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(service)
        }
    }

    /// Scheduling details, if any.
    pub fn scheduling(&self) -> Option<&str> {
        self.scheduling_info.as_deref().filter(|s| !s.trim().is_empty())
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::neutral()
    }
}

fn no_service() -> String {
    "none".to_string()
}

/// Accepts `25`, `25.0`, `"25"` or `null`; anything else is treated as absent.
fn lenient_age<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    })
}
