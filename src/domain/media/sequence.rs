//! Named media sequences.
//!
//! A sequence is an ordered list of text messages and media sends, each with
//! an optional delay and optional conditions on the conversation context.

use serde::Deserialize;

use super::media_type::MediaType;
use crate::domain::session::UserData;

/// User data flag marking a highly engaged counterpart.
pub const HIGH_ENGAGEMENT_FLAG: &str = "highEngagement";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaSequence {
    #[serde(default, alias = "sequence")]
    pub items: Vec<SequenceItem>,
}

/// What one sequence entry sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceItemKind {
    Message,
    Image,
    Sticker,
    #[serde(alias = "voice_note")]
    Voice,
    Location,
    Contact,
    Document,
}

impl SequenceItemKind {
    /// Media type for media entries, `None` for text messages.
    pub fn media_type(&self) -> Option<MediaType> {
        match self {
            SequenceItemKind::Message => None,
            SequenceItemKind::Image => Some(MediaType::Image),
            SequenceItemKind::Sticker => Some(MediaType::Sticker),
            SequenceItemKind::Voice => Some(MediaType::Voice),
            SequenceItemKind::Location => Some(MediaType::Location),
            SequenceItemKind::Contact => Some(MediaType::Contact),
            SequenceItemKind::Document => Some(MediaType::Document),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SequenceItem {
    #[serde(rename = "type")]
    pub kind: SequenceItemKind,
    /// Text of a `message` entry.
    #[serde(default)]
    pub content: Option<String>,
    /// Catalog category or set name of a media entry.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    /// Wait before this entry, in milliseconds.
    #[serde(default)]
    pub delay_ms: Option<u64>,
    #[serde(default)]
    pub conditions: Option<SequenceConditions>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engagement {
    Low,
    Medium,
    High,
}

/// Conditions gating a sequence entry. Unset conditions always hold.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SequenceConditions {
    #[serde(default)]
    pub user_engagement: Option<Engagement>,
    #[serde(default)]
    pub service_selected: Option<bool>,
    #[serde(default)]
    pub no_payment: Option<bool>,
}

impl SequenceConditions {
    pub fn hold_for(&self, user_data: &UserData) -> bool {
        if self.user_engagement == Some(Engagement::High)
            && !user_data.flag(HIGH_ENGAGEMENT_FLAG)
        {
            return false;
        }
        if self.service_selected == Some(true) && user_data.service_choice.is_none() {
            return false;
        }
        if self.no_payment == Some(true) && user_data.payment_confirmed {
            return false;
        }
        true
    }
}

impl SequenceItem {
    /// Whether this entry should be played for the given user.
    pub fn applies_to(&self, user_data: &UserData) -> bool {
        self.conditions
            .as_ref()
            .map(|c| c.hold_for(user_data))
            .unwrap_or(true)
    }
}
