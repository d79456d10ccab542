//! Scheduled units of outbound delivery.

use std::time::Duration;

use crate::domain::media::MediaType;

/// Where a media payload comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Explicit asset path from the step definition.
    Path(String),
    /// Category resolved through the media catalog at send time.
    Category(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub media_type: MediaType,
    pub source: MediaSource,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundPayload {
    Text(String),
    Media(MediaPayload),
    /// Name of a media sequence to play.
    Sequence(String),
}

impl OutboundPayload {
    /// Number of characters a human would have to type for this payload.
    pub fn typed_chars(&self) -> usize {
        match self {
            OutboundPayload::Text(text) => text.chars().count(),
            OutboundPayload::Media(media) => media
                .caption
                .as_deref()
                .map(|c| c.chars().count())
                .unwrap_or(0),
            OutboundPayload::Sequence(_) => 0,
        }
    }
}

/// One queued delivery. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundAction {
    pub payload: OutboundPayload,
    /// Wait before this action is delivered.
    pub delay: Duration,
    /// Sum of the delays of the actions planned before this one.
    pub cumulative_offset: Duration,
}

impl OutboundAction {
    pub fn text(content: impl Into<String>, delay: Duration) -> Self {
        Self {
            payload: OutboundPayload::Text(content.into()),
            delay,
            cumulative_offset: Duration::ZERO,
        }
    }

    pub fn media(payload: MediaPayload, delay: Duration) -> Self {
        Self {
            payload: OutboundPayload::Media(payload),
            delay,
            cumulative_offset: Duration::ZERO,
        }
    }

    pub fn sequence(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            payload: OutboundPayload::Sequence(name.into()),
            delay,
            cumulative_offset: Duration::ZERO,
        }
    }
}

/// Ordered batch of actions produced by one step execution.
///
/// Keeps `cumulative_offset` consistent: the first action has offset zero and
/// every later one the sum of the delays before it.
#[derive(Debug, Default)]
pub struct OutboundPlan {
    actions: Vec<OutboundAction>,
    offset: Duration,
}

impl OutboundPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mut action: OutboundAction) {
        action.cumulative_offset = self.offset;
        self.offset += action.delay;
        self.actions.push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn into_actions(self) -> Vec<OutboundAction> {
        self.actions
    }
}
