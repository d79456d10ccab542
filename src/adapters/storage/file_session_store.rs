//! File-based Session Store Adapter
//!
//! Stores all session snapshots in a single `sessions.json` file, keyed by
//! chat id. Writes go to a temporary file first and are renamed into place.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::foundation::ChatId;
use crate::domain::session::SessionSnapshot;
use crate::ports::{SessionStore, SessionStoreError};

const FILE_NAME: &str = "sessions.json";

/// File-based storage for session snapshots
#[derive(Debug)]
pub struct FileSessionStore {
    base_path: PathBuf,
    /// Serializes writers within this process.
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Create a new file store rooted at a directory
    ///
    /// # Arguments
    /// * `base_path` - Directory holding `sessions.json`
    ///
    /// # Example
    /// ```ignore
    /// let store = FileSessionStore::new("./data");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the sessions file
    pub fn file_path(&self) -> PathBuf {
        self.base_path.join(FILE_NAME)
    }

    /// Ensure directory exists
    async fn ensure_dir(&self) -> Result<(), SessionStoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))
    }

    async fn read_map(&self) -> Result<BTreeMap<ChatId, SessionSnapshot>, SessionStoreError> {
        let path = self.file_path();
        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(SessionStoreError::IoError(e.to_string())),
        };
        if json.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&json).map_err(|e| SessionStoreError::DeserializationFailed(e.to_string()))
    }

    async fn write_map(
        &self,
        sessions: &BTreeMap<ChatId, SessionSnapshot>,
    ) -> Result<(), SessionStoreError> {
        self.ensure_dir().await?;

        let json = serde_json::to_string_pretty(sessions)
            .map_err(|e| SessionStoreError::SerializationFailed(e.to_string()))?;

        let tmp = self.base_path.join(format!("{}.tmp", FILE_NAME));
        fs::write(&tmp, json)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))?;
        fs::rename(&tmp, self.file_path())
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save_all(&self, sessions: &[SessionSnapshot]) -> Result<(), SessionStoreError> {
        let _guard = self.write_lock.lock().await;
        let map = sessions
            .iter()
            .map(|s| (s.chat_id.clone(), s.clone()))
            .collect();
        self.write_map(&map).await
    }

    async fn load_all(&self) -> Result<Vec<SessionSnapshot>, SessionStoreError> {
        Ok(self.read_map().await?.into_values().collect())
    }

    async fn delete(&self, chat_id: &ChatId) -> Result<(), SessionStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        if map.remove(chat_id).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}
