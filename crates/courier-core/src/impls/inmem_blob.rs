//! InMemoryBlobStore - 開発・テスト用の Blob ストア
//!
//! オブジェクトはバージョン付きで保持します。
//! version 指定なしの get は最新版を返します。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{BlobReference, TransportError};
use crate::ports::BlobStore;

#[derive(Debug, Default)]
struct BlobState {
    /// (locator, key) -> [(version, bytes)]（古い順）
    objects: HashMap<(String, String), Vec<(String, Vec<u8>)>>,
    denied: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    state: Mutex<BlobState>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// オブジェクトを保存し、新しい version marker を返す
    pub async fn put(
        &self,
        locator: impl Into<String>,
        key: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> String {
        let mut state = self.state.lock().await;
        let versions = state
            .objects
            .entry((locator.into(), key.into()))
            .or_default();
        let version = format!("v{}", versions.len() + 1);
        versions.push((version.clone(), bytes.into()));
        version
    }

    /// locator 全体をアクセス拒否にする
    pub async fn deny(&self, locator: impl Into<String>) {
        self.state.lock().await.denied.insert(locator.into());
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, reference: &BlobReference) -> Result<Vec<u8>, TransportError> {
        let state = self.state.lock().await;
        if state.denied.contains(reference.store_locator()) {
            return Err(TransportError::AccessDenied {
                locator: reference.store_locator().to_string(),
                key: reference.object_key().to_string(),
            });
        }

        let not_found = || TransportError::NotFound {
            locator: reference.store_locator().to_string(),
            key: reference.object_key().to_string(),
        };

        let versions = state
            .objects
            .get(&(
                reference.store_locator().to_string(),
                reference.object_key().to_string(),
            ))
            .ok_or_else(not_found)?;

        let found = match reference.version_marker() {
            Some(v) => versions.iter().find(|(version, _)| version == v),
            None => versions.last(),
        };
        found.map(|(_, bytes)| bytes.clone()).ok_or_else(not_found)
    }
}
