//! Console Transport - stdin/stdout chat for local runs.
//!
//! Inbound lines are read from stdin. A line of the form `chat-id> text`
//! is addressed to `chat-id`; any other line goes to the default chat.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::Mutex;

use crate::domain::foundation::ChatId;
use crate::domain::media::MediaRef;
use crate::ports::{InboundMessage, InboundStream, Transport, TransportError};

const ADDRESS_SEPARATOR: &str = "> ";

/// Transport printing outbound messages to stdout.
#[derive(Debug)]
pub struct ConsoleTransport {
    out: Mutex<Stdout>,
    show_typing: bool,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(io::stdout()),
            show_typing: false,
        }
    }

    /// Prints typing indicator changes.
    pub fn with_typing(mut self, show: bool) -> Self {
        self.show_typing = show;
        self
    }

    /// Stream of inbound messages read from stdin.
    ///
    /// The stream ends at end of input.
    pub fn inbound(default_chat: ChatId) -> InboundStream {
        let lines = BufReader::new(io::stdin()).lines();

        stream::unfold((lines, default_chat), |(mut lines, default_chat)| async move {
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let message = parse_line(&line, &default_chat);
                        return Some((message, (lines, default_chat)));
                    }
                    Ok(None) => return None,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read console input");
                        return None;
                    }
                }
            }
        })
        .boxed()
    }

    async fn print(&self, line: String) -> Result<(), TransportError> {
        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes())
            .await
            .map_err(|e| TransportError::send_failed(e.to_string()))?;
        out.flush()
            .await
            .map_err(|e| TransportError::send_failed(e.to_string()))
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_line(line: &str, default_chat: &ChatId) -> InboundMessage {
    match line.split_once(ADDRESS_SEPARATOR) {
        Some((chat, text)) if !chat.trim().is_empty() && !chat.contains(' ') => {
            InboundMessage::text(chat.trim(), text.trim())
        }
        _ => InboundMessage::text(default_chat.as_str(), line.trim()),
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send_text(&self, chat_id: &ChatId, text: &str) -> Result<(), TransportError> {
        self.print(format!("[{}] {}\n", chat_id, text)).await
    }

    async fn send_media(
        &self,
        chat_id: &ChatId,
        media: &MediaRef,
        caption: Option<&str>,
    ) -> Result<(), TransportError> {
        let line = match caption {
            Some(caption) => format!(
                "[{}] <{} {}> {}\n",
                chat_id, media.media_type, media.path, caption
            ),
            None => format!("[{}] <{} {}>\n", chat_id, media.media_type, media.path),
        };
        self.print(line).await
    }

    async fn set_typing(&self, chat_id: &ChatId, typing: bool) -> Result<(), TransportError> {
        if self.show_typing && typing {
            self.print(format!("[{}] ...\n", chat_id)).await?;
        }
        Ok(())
    }
}
