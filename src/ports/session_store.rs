//! Session Store Port - Interface for persisting session snapshots.
//!
//! The whole set of live sessions is written at once; the last writer wins.
//! Live-only state (outbound queues, drain flags, phases) is never
//! persisted.

use async_trait::async_trait;

use crate::domain::foundation::ChatId;
use crate::domain::session::SessionSnapshot;

/// Errors that can occur during session store operations
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Failed to serialize sessions: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize sessions: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Port for persisting and loading sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Replace the stored set with `sessions`
    ///
    /// # Errors
    /// Returns `SessionStoreError` if the write fails
    async fn save_all(&self, sessions: &[SessionSnapshot]) -> Result<(), SessionStoreError>;

    /// Load every stored session
    ///
    /// # Returns
    /// An empty list when nothing has been stored yet
    ///
    /// # Errors
    /// Returns `SessionStoreError` if the stored data cannot be read
    async fn load_all(&self) -> Result<Vec<SessionSnapshot>, SessionStoreError>;

    /// Remove one session from the stored set
    ///
    /// # Errors
    /// Returns `SessionStoreError` if the write fails
    async fn delete(&self, chat_id: &ChatId) -> Result<(), SessionStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionStoreError::IoError("disk full".to_string());
        assert_eq!(err.to_string(), "IO error: disk full");

        let err = SessionStoreError::DeserializationFailed("eof".to_string());
        assert!(err.to_string().contains("deserialize"));
    }
}
