//! Recording Transport for tests and embedding.
//!
//! Every outbound call is captured in memory instead of reaching a chat
//! network.
//!
//! # Features
//!
//! - Ordered record of texts, media and typing toggles
//! - Failure injection (next N sends fail)
//! - Simulated send latency
//! - In-flight tracking to observe concurrent sends
//!
//! # Example
//!
//! ```ignore
//! let transport = RecordingTransport::new().with_latency(Duration::from_millis(5));
//! transport.fail_next_sends(2, TransportError::send_failed("offline"));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::foundation::ChatId;
use crate::domain::media::MediaRef;
use crate::ports::{Transport, TransportError};

/// One captured outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentItem {
    Text(String),
    Media {
        media: MediaRef,
        caption: Option<String>,
    },
    Typing(bool),
}

/// A captured call and its target chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub chat_id: ChatId,
    pub item: SentItem,
}

/// In-memory transport that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    records: Arc<Mutex<Vec<SentRecord>>>,
    failures: Arc<Mutex<VecDeque<TransportError>>>,
    latency: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets simulated latency for text and media sends.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes the next `count` text or media sends fail with `error`.
    pub fn fail_next_sends(&self, count: usize, error: TransportError) {
        let mut failures = self.failures.lock().unwrap();
        failures.extend(std::iter::repeat(error).take(count));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────

    /// Returns every captured call, in order.
    pub fn records(&self) -> Vec<SentRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Returns captured texts for one chat.
    pub fn texts_for(&self, chat_id: &ChatId) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.chat_id == chat_id)
            .filter_map(|r| match &r.item {
                SentItem::Text(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns captured media sends for one chat.
    pub fn media_for(&self, chat_id: &ChatId) -> Vec<(MediaRef, Option<String>)> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.chat_id == chat_id)
            .filter_map(|r| match &r.item {
                SentItem::Media { media, caption } => Some((media.clone(), caption.clone())),
                _ => None,
            })
            .collect()
    }

    /// Number of captured text and media sends.
    pub fn send_count(&self) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| !matches!(r.item, SentItem::Typing(_)))
            .count()
    }

    /// Highest number of sends observed in flight at once.
    pub fn max_concurrent_sends(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    async fn deliver(&self, chat_id: &ChatId, item: SentItem) -> Result<(), TransportError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }

        let failure = self.failures.lock().unwrap().pop_front();
        let result = match failure {
            Some(err) => Err(err),
            None => {
                self.records.lock().unwrap().push(SentRecord {
                    chat_id: chat_id.clone(),
                    item,
                });
                Ok(())
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, chat_id: &ChatId, text: &str) -> Result<(), TransportError> {
        self.deliver(chat_id, SentItem::Text(text.to_string())).await
    }

    async fn send_media(
        &self,
        chat_id: &ChatId,
        media: &MediaRef,
        caption: Option<&str>,
    ) -> Result<(), TransportError> {
        self.deliver(
            chat_id,
            SentItem::Media {
                media: media.clone(),
                caption: caption.map(str::to_string),
            },
        )
        .await
    }

    async fn set_typing(&self, chat_id: &ChatId, typing: bool) -> Result<(), TransportError> {
        self.records.lock().unwrap().push(SentRecord {
            chat_id: chat_id.clone(),
            item: SentItem::Typing(typing),
        });
        Ok(())
    }
}
