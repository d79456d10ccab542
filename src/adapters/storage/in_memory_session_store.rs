//! In-Memory Session Store Adapter
//!
//! Keeps session snapshots in memory. Useful for testing and for running
//! without persistence.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::ChatId;
use crate::domain::session::SessionSnapshot;
use crate::ports::{SessionStore, SessionStoreError};

/// In-memory storage for session snapshots
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<ChatId, SessionSnapshot>>>,
}

impl InMemorySessionStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Get one stored session
    pub async fn get(&self, chat_id: &ChatId) -> Option<SessionSnapshot> {
        self.sessions.read().await.get(chat_id).cloned()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save_all(&self, sessions: &[SessionSnapshot]) -> Result<(), SessionStoreError> {
        let mut stored = self.sessions.write().await;
        stored.clear();
        stored.extend(sessions.iter().map(|s| (s.chat_id.clone(), s.clone())));
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<SessionSnapshot>, SessionStoreError> {
        Ok(self.sessions.read().await.values().cloned().collect())
    }

    async fn delete(&self, chat_id: &ChatId) -> Result<(), SessionStoreError> {
        self.sessions.write().await.remove(chat_id);
        Ok(())
    }
}
