//! Outbound drain loop.
//!
//! One task per session pops queued actions in order, waits their delay,
//! optionally shows the typing indicator, and hands them to the transport
//! or the media dispatcher. The drain flag is claimed with a
//! compare-and-set, so a session never has two loops; after releasing the
//! flag the loop re-checks the queue so that an action enqueued during the
//! release is not stranded.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::media_dispatcher::MediaDispatcher;
use super::registry::LiveSession;
use super::rng::SharedRng;
use super::stats::EngineStats;
use super::typing::TypingSimulation;
use crate::domain::foundation::ChatId;
use crate::domain::session::{OutboundAction, OutboundPayload};
use crate::ports::Transport;

/// Delivers queued actions for every session.
pub struct OutboundDrainer {
    transport: Arc<dyn Transport>,
    dispatcher: Arc<MediaDispatcher>,
    typing: TypingSimulation,
    send_timeout: Duration,
    stats: Arc<EngineStats>,
    rng: SharedRng,
}

impl OutboundDrainer {
    pub fn new(
        transport: Arc<dyn Transport>,
        dispatcher: Arc<MediaDispatcher>,
        stats: Arc<EngineStats>,
    ) -> Self {
        Self {
            transport,
            dispatcher,
            typing: TypingSimulation::default(),
            send_timeout: Duration::from_secs(30),
            stats,
            rng: SharedRng::default(),
        }
    }

    pub fn with_typing(mut self, typing: TypingSimulation) -> Self {
        self.typing = typing;
        self
    }

    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    pub fn with_rng(mut self, rng: SharedRng) -> Self {
        self.rng = rng;
        self
    }

    /// Starts a drain task for `live` unless one is already running.
    ///
    /// # Returns
    /// `true` if this call started the task
    pub fn ensure_draining(self: &Arc<Self>, live: &Arc<LiveSession>) -> bool {
        if live.is_cancelled() || !live.queue().try_start_drain() {
            return false;
        }

        debug!(chat_id = %live.chat_id(), pending = live.queue().len(), "Drain started");
        let drainer = Arc::clone(self);
        let live = Arc::clone(live);
        tokio::spawn(async move { drainer.drain(live).await });
        true
    }

    async fn drain(&self, live: Arc<LiveSession>) {
        loop {
            while let Some(action) = live.queue().pop() {
                if !self.deliver(&live, action).await {
                    live.queue().clear();
                    live.queue().finish_drain();
                    debug!(chat_id = %live.chat_id(), "Drain cancelled");
                    return;
                }
            }

            live.queue().finish_drain();
            if live.queue().is_empty() || live.is_cancelled() {
                debug!(chat_id = %live.chat_id(), "Drain finished");
                return;
            }
            if !live.queue().try_start_drain() {
                // Another task claimed the flag between the release and the re-check.
                return;
            }
        }
    }

    /// Delivers one action. Returns false when the session was torn down.
    async fn deliver(&self, live: &LiveSession, action: OutboundAction) -> bool {
        let cancel = live.cancellation();
        let chat_id = live.chat_id();

        if !sleep_unless_cancelled(action.delay, cancel).await {
            return false;
        }

        let chars = action.payload.typed_chars();
        let typing = self.typing.enabled && chars > 0;
        if typing {
            self.set_typing(chat_id, true).await;
            let duration = self.rng.with(|rng| self.typing.duration_for(chars, rng));
            if !sleep_unless_cancelled(duration, cancel).await {
                return false;
            }
        }

        let delivered = match &action.payload {
            OutboundPayload::Text(text) => self.send_text(chat_id, text).await,
            OutboundPayload::Media(payload) => {
                self.dispatcher
                    .send_payload(self.transport.as_ref(), chat_id, payload, cancel)
                    .await
            }
            OutboundPayload::Sequence(name) => {
                let user_data = live.snapshot().user_data;
                self.dispatcher
                    .play_sequence(self.transport.as_ref(), chat_id, name, &user_data, cancel)
                    .await
            }
        };

        if typing {
            self.set_typing(chat_id, false).await;
        }

        if delivered {
            self.stats.record_sent();
        } else {
            self.stats.record_failed();
        }
        !cancel.is_cancelled()
    }

    async fn send_text(&self, chat_id: &ChatId, text: &str) -> bool {
        match timeout(self.send_timeout, self.transport.send_text(chat_id, text)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(chat_id = %chat_id, error = %e, "Failed to send message");
                false
            }
            Err(_) => {
                warn!(chat_id = %chat_id, timeout_ms = self.send_timeout.as_millis() as u64, "Message send timed out");
                false
            }
        }
    }

    async fn set_typing(&self, chat_id: &ChatId, typing: bool) {
        match timeout(self.send_timeout, self.transport.set_typing(chat_id, typing)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(chat_id = %chat_id, error = %e, "Typing indicator failed"),
            Err(_) => debug!(chat_id = %chat_id, "Typing indicator timed out"),
        }
    }
}

/// Sleeps for `duration`. Returns false if `cancel` fired first.
async fn sleep_unless_cancelled(duration: Duration, cancel: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = sleep(duration) => true,
    }
}
