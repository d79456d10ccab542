//! Filesystem-backed asset store.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::ports::AssetStore;

/// Checks media paths on the local filesystem.
///
/// Relative paths are resolved against `root`.
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn exists(&self, path: &str) -> bool {
        let full = self.resolve(path);
        match fs::try_exists(&full).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!(path = %full.display(), error = %e, "Asset lookup failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn finds_relative_and_absolute_paths() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.jpg"), b"x").unwrap();
        let store = FsAssetStore::new(temp_dir.path());

        assert!(store.exists("a.jpg").await);
        assert!(store.exists(temp_dir.path().join("a.jpg").to_str().unwrap()).await);
        assert!(!store.exists("missing.jpg").await);
    }
}
