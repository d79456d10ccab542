//! Media Dispatcher - resolves and delivers media with configured policies.
//!
//! ## Policies
//!
//! | Situation | Behaviour |
//! |-----------|-----------|
//! | Media type disabled | Rejected (`false`) |
//! | Asset missing | `skip` → `false`; `fallback` → caller's producer; `message` → canned text |
//! | Send fails | Up to `retry_count` retries, then optional failure message |
//!
//! Every outcome is recorded in a bounded per-chat history.

use futures::future::BoxFuture;
use rand::seq::SliceRandom;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::rng::SharedRng;
use crate::domain::foundation::{ChatId, Timestamp};
use crate::domain::media::{
    DispatchRecord, MediaConfig, MediaHistory, MediaRef, MediaType, MissingMediaAction,
    SequenceItemKind,
};
use crate::domain::session::{MediaPayload, MediaSource, UserData};
use crate::ports::{AssetStore, Transport};

/// Producer awaited when an asset is missing and the policy is `fallback`.
pub type Fallback = Box<dyn FnOnce() -> BoxFuture<'static, bool> + Send>;

/// Per-call options for [`MediaDispatcher::send`].
#[derive(Default)]
pub struct SendOptions {
    /// Overrides the configured captions.
    pub caption: Option<String>,
    pub fallback: Option<Fallback>,
    /// Stops retry waits when the session is torn down.
    pub cancel: Option<CancellationToken>,
}

impl SendOptions {
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl fmt::Debug for SendOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendOptions")
            .field("caption", &self.caption)
            .field("fallback", &self.fallback.is_some())
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

/// Sends media assets on behalf of the engine.
pub struct MediaDispatcher {
    config: Arc<MediaConfig>,
    assets: Arc<dyn AssetStore>,
    history: Mutex<MediaHistory>,
    rng: SharedRng,
    send_timeout: Duration,
}

impl MediaDispatcher {
    pub fn new(config: Arc<MediaConfig>, assets: Arc<dyn AssetStore>) -> Self {
        let history = MediaHistory::new(config.settings.history_length);
        Self {
            config,
            assets,
            history: Mutex::new(history),
            rng: SharedRng::default(),
            send_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_rng(mut self, rng: SharedRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────
    // Sending
    // ─────────────────────────────────────────────────────────────────────

    /// Resolves `(media_type, category)` and sends it.
    ///
    /// # Returns
    /// `true` when the media (or the policy's replacement) was delivered
    pub async fn send(
        &self,
        transport: &dyn Transport,
        chat_id: &ChatId,
        media_type: MediaType,
        category: &str,
        options: SendOptions,
    ) -> bool {
        if !self.config.is_enabled(media_type) {
            debug!(chat_id = %chat_id, %media_type, "Media type disabled");
            return false;
        }

        let resolved = self
            .rng
            .with(|rng| self.config.resolve(media_type, category, rng));
        let Some(asset) = resolved else {
            warn!(chat_id = %chat_id, %media_type, category, "No asset configured");
            self.record(chat_id, media_type, category, false);
            return self.handle_missing(transport, chat_id, options.fallback).await;
        };

        let caption = options
            .caption
            .or_else(|| self.pick_caption(&asset.captions));
        self.deliver(
            transport,
            chat_id,
            media_type,
            category,
            &asset.path,
            caption.as_deref(),
            options.fallback,
            options.cancel.as_ref(),
        )
        .await
    }

    /// Sends an asset given by explicit path.
    ///
    /// Goes through the same existence check, policies and history as
    /// [`send`](Self::send); the path doubles as the history category.
    pub async fn send_path(
        &self,
        transport: &dyn Transport,
        chat_id: &ChatId,
        media_type: MediaType,
        path: &str,
        options: SendOptions,
    ) -> bool {
        if !self.config.is_enabled(media_type) {
            debug!(chat_id = %chat_id, %media_type, "Media type disabled");
            return false;
        }
        self.deliver(
            transport,
            chat_id,
            media_type,
            path,
            path,
            options.caption.as_deref(),
            options.fallback,
            options.cancel.as_ref(),
        )
        .await
    }

    /// Sends a queued media payload.
    pub async fn send_payload(
        &self,
        transport: &dyn Transport,
        chat_id: &ChatId,
        payload: &MediaPayload,
        cancel: &CancellationToken,
    ) -> bool {
        let options = SendOptions {
            caption: payload.caption.clone(),
            fallback: None,
            cancel: Some(cancel.clone()),
        };
        match &payload.source {
            MediaSource::Path(path) => {
                self.send_path(transport, chat_id, payload.media_type, path, options)
                    .await
            }
            MediaSource::Category(category) => {
                self.send(transport, chat_id, payload.media_type, category, options)
                    .await
            }
        }
    }

    /// Plays a named media sequence.
    ///
    /// Items whose conditions do not hold are skipped. A failed item marks
    /// the sequence unsuccessful without stopping it. Cancellation stops
    /// the sequence between items.
    pub async fn play_sequence(
        &self,
        transport: &dyn Transport,
        chat_id: &ChatId,
        name: &str,
        user_data: &UserData,
        cancel: &CancellationToken,
    ) -> bool {
        let Some(sequence) = self.config.sequence(name) else {
            warn!(chat_id = %chat_id, sequence = name, "Unknown media sequence");
            return false;
        };

        let mut success = true;
        for (index, item) in sequence.items.iter().enumerate() {
            if !item.applies_to(user_data) {
                debug!(chat_id = %chat_id, sequence = name, index, "Sequence item skipped");
                continue;
            }

            if let Some(ms) = item.delay_ms.filter(|ms| *ms > 0) {
                tokio::select! {
                    _ = cancel.cancelled() => return false,
                    _ = sleep(Duration::from_millis(ms)) => {}
                }
            } else if cancel.is_cancelled() {
                return false;
            }

            let delivered = match item.kind.media_type() {
                None => self.send_sequence_text(transport, chat_id, item.kind, item.content.as_deref()).await,
                Some(media_type) => {
                    let options = SendOptions {
                        caption: item.caption.clone(),
                        fallback: None,
                        cancel: Some(cancel.clone()),
                    };
                    let category = item.category.as_deref().unwrap_or_default();
                    self.send(transport, chat_id, media_type, category, options)
                        .await
                }
            };

            if !delivered {
                warn!(chat_id = %chat_id, sequence = name, index, "Sequence item failed");
                success = false;
            }
        }
        success
    }

    // ─────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────

    /// Whether this media was successfully sent to the chat, optionally
    /// only within the last `within`.
    pub fn has_been_sent(
        &self,
        chat_id: &ChatId,
        media_type: MediaType,
        category: &str,
        within: Option<Duration>,
    ) -> bool {
        self.history().has_been_sent(
            chat_id,
            media_type,
            category,
            within,
            &Timestamp::now(),
        )
    }

    pub fn history_for(&self, chat_id: &ChatId) -> Vec<DispatchRecord> {
        self.history().entries(chat_id)
    }

    /// Drops the history of a chat.
    pub fn forget(&self, chat_id: &ChatId) {
        self.history().forget(chat_id);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn history(&self) -> std::sync::MutexGuard<'_, MediaHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, chat_id: &ChatId, media_type: MediaType, category: &str, success: bool) {
        self.history().record(
            chat_id,
            DispatchRecord {
                media_type,
                category: category.to_string(),
                success,
                at: Timestamp::now(),
            },
        );
    }

    fn pick_caption(&self, captions: &[String]) -> Option<String> {
        if self.config.settings.randomize_captions {
            self.rng.with(|rng| captions.choose(rng).cloned())
        } else {
            captions.first().cloned()
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn deliver(
        &self,
        transport: &dyn Transport,
        chat_id: &ChatId,
        media_type: MediaType,
        category: &str,
        path: &str,
        caption: Option<&str>,
        fallback: Option<Fallback>,
        cancel: Option<&CancellationToken>,
    ) -> bool {
        if !self.assets.exists(path).await {
            warn!(chat_id = %chat_id, %media_type, path, "Media asset missing");
            self.record(chat_id, media_type, category, false);
            return self.handle_missing(transport, chat_id, fallback).await;
        }

        let media = MediaRef::new(media_type, path);
        let policy = &self.config.settings.failed_send;
        let attempts = policy.retry_count + 1;

        for attempt in 1..=attempts {
            match timeout(self.send_timeout, transport.send_media(chat_id, &media, caption)).await
            {
                Ok(Ok(())) => {
                    debug!(chat_id = %chat_id, %media_type, path, attempt, "Media sent");
                    self.record(chat_id, media_type, category, true);
                    return true;
                }
                Ok(Err(e)) => {
                    warn!(chat_id = %chat_id, %media_type, attempt, error = %e, "Media send failed");
                }
                Err(_) => {
                    warn!(chat_id = %chat_id, %media_type, attempt, "Media send timed out");
                }
            }
            if attempt < attempts {
                let pause = sleep(Duration::from_millis(policy.retry_delay_ms));
                match cancel {
                    Some(cancel) => tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!(chat_id = %chat_id, %media_type, attempt, "Media retry cancelled");
                            self.record(chat_id, media_type, category, false);
                            return false;
                        }
                        _ = pause => {}
                    },
                    None => pause.await,
                }
            }
        }

        self.record(chat_id, media_type, category, false);
        if let Some(message) = &policy.failure_message {
            self.send_text(transport, chat_id, message).await;
        }
        false
    }

    async fn handle_missing(
        &self,
        transport: &dyn Transport,
        chat_id: &ChatId,
        fallback: Option<Fallback>,
    ) -> bool {
        let policy = &self.config.settings.missing_media;
        match policy.action {
            MissingMediaAction::Skip => false,
            MissingMediaAction::Fallback => match fallback {
                Some(produce) => produce().await,
                None => {
                    debug!(chat_id = %chat_id, "Fallback policy without a fallback producer");
                    false
                }
            },
            MissingMediaAction::Message => {
                self.send_text(transport, chat_id, &policy.fallback_message)
                    .await;
                true
            }
        }
    }

    async fn send_sequence_text(
        &self,
        transport: &dyn Transport,
        chat_id: &ChatId,
        kind: SequenceItemKind,
        content: Option<&str>,
    ) -> bool {
        match content {
            Some(text) if !text.is_empty() => self.send_text(transport, chat_id, text).await,
            _ => {
                warn!(chat_id = %chat_id, ?kind, "Sequence message without content");
                false
            }
        }
    }

    async fn send_text(&self, transport: &dyn Transport, chat_id: &ChatId, text: &str) -> bool {
        match timeout(self.send_timeout, transport.send_text(chat_id, text)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(chat_id = %chat_id, error = %e, "Text send failed");
                false
            }
            Err(_) => {
                warn!(chat_id = %chat_id, "Text send timed out");
                false
            }
        }
    }
}

impl fmt::Debug for MediaDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaDispatcher")
            .field("send_timeout", &self.send_timeout)
            .finish_non_exhaustive()
    }
}
