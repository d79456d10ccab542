//! Facts collected about the counterpart during a conversation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::classification::Classification;

/// Accumulated user facts.
///
/// Later detections overwrite earlier ones; a reply in which nothing is
/// detected never clears a known value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub service_choice: Option<String>,
    #[serde(default)]
    pub scheduling_info: Option<String>,
    #[serde(default)]
    pub payment_confirmed: bool,
    /// Scenario-specific ephemeral flags (e.g. "awaitingClarification").
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, bool>,
}

impl UserData {
    /// Merges the entities of a classification into the collected data.
    ///
    /// Returns true if anything changed.
    pub fn merge(&mut self, classification: &Classification) -> bool {
        let mut changed = false;

        if let Some(location) = classification.location() {
            changed |= replace(&mut self.location, location.to_string());
        }
        if let Some(age) = classification.age() {
            if self.age != Some(age) {
                self.age = Some(age);
                changed = true;
            }
        }
        if let Some(service) = classification.selected_service() {
            changed |= replace(&mut self.service_choice, service.to_string());
        }
        if let Some(scheduling) = classification.scheduling() {
            changed |= replace(&mut self.scheduling_info, scheduling.to_string());
        }

        changed
    }

    /// Reads a scenario flag; unset flags are false.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Sets a scenario flag.
    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.flags.insert(name.into(), value);
    }
}

fn replace(slot: &mut Option<String>, value: String) -> bool {
    if slot.as_deref() == Some(value.as_str()) {
        false
    } else {
        *slot = Some(value);
        true
    }
}
