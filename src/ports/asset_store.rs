//! Asset Store Port - Interface for checking that media files exist.

use async_trait::async_trait;

/// Port for media asset lookups.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Returns true if an asset exists at `path`.
    ///
    /// Lookup failures count as "does not exist".
    async fn exists(&self, path: &str) -> bool;
}
