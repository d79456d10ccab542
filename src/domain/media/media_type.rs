//! Media kinds and references handed to the transport.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of media the bot can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Sticker,
    #[serde(alias = "voice_note", alias = "voiceNote")]
    Voice,
    Location,
    Contact,
    Document,
}

impl MediaType {
    /// Whether assets of this type are picked at random from a named set
    /// (stickers, voice notes) rather than looked up directly by category.
    pub fn uses_sets(&self) -> bool {
        matches!(self, MediaType::Sticker | MediaType::Voice)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaType::Image => "image",
            MediaType::Sticker => "sticker",
            MediaType::Voice => "voice",
            MediaType::Location => "location",
            MediaType::Contact => "contact",
            MediaType::Document => "document",
        };
        write!(f, "{}", s)
    }
}

/// A concrete asset ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub media_type: MediaType,
    pub path: String,
}

impl MediaRef {
    pub fn new(media_type: MediaType, path: impl Into<String>) -> Self {
        Self {
            media_type,
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_accepts_aliases() {
        let t: MediaType = serde_json::from_str("\"voice_note\"").unwrap();
        assert_eq!(t, MediaType::Voice);
        let t: MediaType = serde_json::from_str("\"voice\"").unwrap();
        assert_eq!(t, MediaType::Voice);
    }

    #[test]
    fn test_set_based_types() {
        assert!(MediaType::Sticker.uses_sets());
        assert!(MediaType::Voice.uses_sets());
        assert!(!MediaType::Image.uses_sets());
        assert!(!MediaType::Document.uses_sets());
    }
}
