//! Media asset adapters.

mod fs_asset_store;

pub use fs_asset_store::FsAssetStore;

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::ports::AssetStore;

/// Asset store over a fixed set of known paths (testing).
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssetStore {
    paths: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(self, path: impl Into<String>) -> Self {
        self.paths.write().unwrap().insert(path.into());
        self
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn exists(&self, path: &str) -> bool {
        self.paths
            .read()
            .map(|paths| paths.contains(path))
            .unwrap_or(false)
    }
}
