//! Transport Port - Interface for the chat network.
//!
//! Outbound: text, media and typing indicators. Inbound: a stream of
//! `InboundMessage` values consumed by `ConversationEngine::run`.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::foundation::ChatId;
use crate::domain::media::MediaRef;

/// Port for delivering messages to a chat.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a text message.
    async fn send_text(&self, chat_id: &ChatId, text: &str) -> Result<(), TransportError>;

    /// Sends a media asset with an optional caption.
    async fn send_media(
        &self,
        chat_id: &ChatId,
        media: &MediaRef,
        caption: Option<&str>,
    ) -> Result<(), TransportError>;

    /// Shows (or hides) the typing indicator.
    async fn set_typing(&self, chat_id: &ChatId, typing: bool) -> Result<(), TransportError>;
}

/// One message received from a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    /// Message body; empty for media-only messages.
    pub text: String,
    pub has_media: bool,
}

impl InboundMessage {
    pub fn text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: ChatId::new(chat_id),
            text: text.into(),
            has_media: false,
        }
    }
}

/// Stream of inbound messages.
pub type InboundStream = BoxStream<'static, InboundMessage>;

/// Transport errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("chat not reachable: {0}")]
    Unreachable(ChatId),

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("media file rejected: {0}")]
    MediaRejected(String),

    #[error("send timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("transport closed")]
    Closed,
}

impl TransportError {
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed(message.into())
    }
}
