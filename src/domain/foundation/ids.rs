//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque, stable identifier of a conversation counterpart on the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    /// Creates a ChatId from a transport identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChatId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of a step inside a scenario graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    /// Creates a StepId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StepId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Borrow<str> for StepId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_id_displays_raw_value() {
        let id = ChatId::new("33612345678@c.us");
        assert_eq!(id.to_string(), "33612345678@c.us");
        assert_eq!(id.as_str(), "33612345678@c.us");
    }

    #[test]
    fn step_id_serializes_transparently() {
        let id = StepId::new("step_1_source");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"step_1_source\"");

        let back: StepId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn step_id_lookup_by_str() {
        let mut steps = std::collections::HashMap::new();
        steps.insert(StepId::new("intro"), 1);
        assert_eq!(steps.get("intro"), Some(&1));
    }
}
