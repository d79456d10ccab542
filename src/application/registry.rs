//! Live session registry.
//!
//! Each chat has one `LiveSession`: the persisted `Session` behind an async
//! mutex, its outbound queue, and a cancellation token that tears down its
//! drain task.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{MutexGuard, RwLock};
use tokio_util::sync::CancellationToken;

use crate::domain::foundation::{ChatId, Timestamp};
use crate::domain::session::{OutboundAction, Session, SessionSnapshot};

// ─────────────────────────────────────────────────────────────────────────────
// OutboundQueue
// ─────────────────────────────────────────────────────────────────────────────

/// FIFO of pending deliveries plus the flag guarding its single drain loop.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    actions: Mutex<VecDeque<OutboundAction>>,
    draining: AtomicBool,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn actions(&self) -> std::sync::MutexGuard<'_, VecDeque<OutboundAction>> {
        self.actions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, action: OutboundAction) {
        self.actions().push_back(action);
    }

    pub fn push_all(&self, actions: impl IntoIterator<Item = OutboundAction>) {
        self.actions().extend(actions);
    }

    pub fn pop(&self) -> Option<OutboundAction> {
        self.actions().pop_front()
    }

    pub fn len(&self) -> usize {
        self.actions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions().is_empty()
    }

    /// Discards every pending action and returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut actions = self.actions();
        let dropped = actions.len();
        actions.clear();
        dropped
    }

    /// Claims the drain. Returns false when a drain loop is already running.
    pub fn try_start_drain(&self) -> bool {
        self.draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn finish_drain(&self) {
        self.draining.store(false, Ordering::Release);
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LiveSession
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime handle for one chat.
#[derive(Debug)]
pub struct LiveSession {
    chat_id: ChatId,
    session: tokio::sync::Mutex<Session>,
    /// Last committed state, readable without taking the session lock.
    snapshot: Mutex<SessionSnapshot>,
    queue: OutboundQueue,
    cancel: CancellationToken,
}

impl LiveSession {
    pub fn new(session: Session) -> Self {
        Self {
            chat_id: session.chat_id().clone(),
            snapshot: Mutex::new(session.snapshot()),
            session: tokio::sync::Mutex::new(session),
            queue: OutboundQueue::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    /// Locks the session for processing one inbound message.
    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().await
    }

    pub fn queue(&self) -> &OutboundQueue {
        &self.queue
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Last committed snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publishes the state of `session` as the committed snapshot.
    pub fn commit(&self, session: &Session) {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = session.snapshot();
    }

    /// Cancels the drain task and drops pending actions.
    pub fn tear_down(&self) {
        self.cancel.cancel();
        let dropped = self.queue.clear();
        if dropped > 0 {
            tracing::debug!(chat_id = %self.chat_id, dropped, "Discarded pending actions");
        }
    }

    fn is_idle(&self, threshold: Duration, now: &Timestamp) -> bool {
        // A locked session is processing a message right now.
        match self.session.try_lock() {
            Ok(session) => session.is_idle(threshold, now),
            Err(_) => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SessionRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// Concurrent map of chat id to live session.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<ChatId, Arc<LiveSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, chat_id: &ChatId) -> Option<Arc<LiveSession>> {
        self.sessions.read().await.get(chat_id).cloned()
    }

    /// Returns the session for `chat_id`, creating it with `create` if
    /// absent. The flag is true when the session was created.
    pub async fn get_or_create(
        &self,
        chat_id: &ChatId,
        create: impl FnOnce() -> Session,
    ) -> (Arc<LiveSession>, bool) {
        if let Some(live) = self.get(chat_id).await {
            return (live, false);
        }

        let mut sessions = self.sessions.write().await;
        if let Some(live) = sessions.get(chat_id) {
            return (Arc::clone(live), false);
        }
        let live = Arc::new(LiveSession::new(create()));
        sessions.insert(chat_id.clone(), Arc::clone(&live));
        (live, true)
    }

    /// Inserts `session`, tearing down any session it replaces.
    pub async fn insert(&self, session: Session) -> Arc<LiveSession> {
        let live = Arc::new(LiveSession::new(session));
        let previous = self
            .sessions
            .write()
            .await
            .insert(live.chat_id().clone(), Arc::clone(&live));
        if let Some(previous) = previous {
            previous.tear_down();
        }
        live
    }

    /// Removes and tears down one session.
    pub async fn remove(&self, chat_id: &ChatId) -> Option<Arc<LiveSession>> {
        let removed = self.sessions.write().await.remove(chat_id);
        if let Some(live) = &removed {
            live.tear_down();
        }
        removed
    }

    /// Removes every session idle for longer than `threshold`.
    ///
    /// Sessions busy with an inbound message are never evicted.
    pub async fn evict_idle(&self, now: Timestamp, threshold: Duration) -> Vec<ChatId> {
        let mut sessions = self.sessions.write().await;
        let stale: Vec<ChatId> = sessions
            .iter()
            .filter(|(_, live)| live.is_idle(threshold, &now))
            .map(|(chat_id, _)| chat_id.clone())
            .collect();

        for chat_id in &stale {
            if let Some(live) = sessions.remove(chat_id) {
                live.tear_down();
            }
        }
        stale
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn chat_ids(&self) -> Vec<ChatId> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Committed snapshots of every session, ordered by chat id.
    pub async fn snapshots(&self) -> Vec<SessionSnapshot> {
        let mut snapshots: Vec<SessionSnapshot> = self
            .sessions
            .read()
            .await
            .values()
            .map(|live| live.snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.chat_id.cmp(&b.chat_id));
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::StepId;

    fn session(chat: &str, at: Timestamp) -> Session {
        Session::new(ChatId::new(chat), StepId::new("intro"), at)
    }

    #[test]
    fn drain_flag_is_exclusive() {
        let queue = OutboundQueue::new();
        assert!(queue.try_start_drain());
        assert!(!queue.try_start_drain());
        queue.finish_drain();
        assert!(queue.try_start_drain());
    }

    #[test]
    fn queue_is_fifo() {
        let queue = OutboundQueue::new();
        queue.push(OutboundAction::text("a", Duration::ZERO));
        queue.push_all(vec![
            OutboundAction::text("b", Duration::ZERO),
            OutboundAction::text("c", Duration::ZERO),
        ]);

        let order: Vec<_> = std::iter::from_fn(|| queue.pop())
            .map(|a| a.payload)
            .collect();
        assert_eq!(order.len(), 3);
        assert_eq!(
            order[0],
            crate::domain::session::OutboundPayload::Text("a".into())
        );
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn get_or_create_creates_once() {
        let registry = SessionRegistry::new();
        let chat = ChatId::new("c1");

        let (first, created) = registry
            .get_or_create(&chat, || session("c1", Timestamp::now()))
            .await;
        assert!(created);
        let (second, created) = registry
            .get_or_create(&chat, || session("c1", Timestamp::now()))
            .await;
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn remove_cancels_and_clears() {
        let registry = SessionRegistry::new();
        let live = registry.insert(session("c1", Timestamp::now())).await;
        live.queue().push(OutboundAction::text("pending", Duration::ZERO));

        let removed = registry.remove(&ChatId::new("c1")).await.unwrap();
        assert!(removed.is_cancelled());
        assert!(removed.queue().is_empty());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn insert_replaces_and_tears_down_previous() {
        let registry = SessionRegistry::new();
        let old = registry.insert(session("c1", Timestamp::now())).await;
        let new = registry.insert(session("c1", Timestamp::now())).await;

        assert!(old.is_cancelled());
        assert!(!new.is_cancelled());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn evict_idle_removes_only_stale_sessions() {
        let registry = SessionRegistry::new();
        let now = Timestamp::from_unix_secs(10_000);
        registry.insert(session("stale", now.minus_secs(7200))).await;
        registry.insert(session("fresh", now.minus_secs(60))).await;

        let evicted = registry.evict_idle(now, Duration::from_secs(3600)).await;

        assert_eq!(evicted, vec![ChatId::new("stale")]);
        assert_eq!(registry.chat_ids().await, vec![ChatId::new("fresh")]);
    }

    #[tokio::test]
    async fn busy_session_is_not_evicted() {
        let registry = SessionRegistry::new();
        let now = Timestamp::from_unix_secs(10_000);
        let live = registry.insert(session("busy", now.minus_secs(7200))).await;

        let _guard = live.lock().await;
        let evicted = registry.evict_idle(now, Duration::from_secs(3600)).await;
        assert!(evicted.is_empty());
    }

    #[tokio::test]
    async fn snapshots_follow_commits() {
        let registry = SessionRegistry::new();
        let live = registry.insert(session("c1", Timestamp::now())).await;

        {
            let mut s = live.lock().await;
            s.advance_to(StepId::new("ask_age"));
            live.commit(&s);
        }

        let snapshots = registry.snapshots().await;
        assert_eq!(snapshots[0].current_step.as_str(), "ask_age");
    }
}
