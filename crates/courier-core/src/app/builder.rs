//! ConsumerBuilder - コンシューマの構築とワイヤリング
//!
//! # Fail-fast
//! - queue / blob_store が未設定なら build() で BuildError
//! - 設定値の検証（ConsumerConfig::validate）も build() で行う
//! - scratch ディレクトリが存在しなければ BuildError（最初の fetch まで待たない）

use std::path::PathBuf;
use std::sync::Arc;

use super::config::{ConfigError, ConsumerConfig};
use super::coordinator::BatchCoordinator;
use super::processor::MessageProcessor;
use crate::ports::{BlobStore, DeliveryQueue, IdGenerator, SystemClock, UlidGenerator};
use crate::typed::Model;

/// ConsumerBuilder は BatchCoordinator を構築
///
/// # 使用例
/// ```ignore
/// let coordinator = ConsumerBuilder::new()
///     .config(config)
///     .queue(Arc::new(queue))
///     .blob_store(Arc::new(store))
///     .build::<Product>()?;
/// ```
pub struct ConsumerBuilder {
    config: ConsumerConfig,
    queue: Option<Arc<dyn DeliveryQueue>>,
    blob_store: Option<Arc<dyn BlobStore>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no delivery queue configured")]
    MissingQueue,

    #[error("no blob store configured")]
    MissingBlobStore,

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error("scratch directory does not exist: {}", .0.display())]
    ScratchDir(PathBuf),
}

impl ConsumerBuilder {
    pub fn new() -> Self {
        Self {
            config: ConsumerConfig::default(),
            queue: None,
            blob_store: None,
            ids: None,
        }
    }

    pub fn config(mut self, config: ConsumerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn queue(mut self, queue: Arc<dyn DeliveryQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn blob_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = Some(store);
        self
    }

    /// 省略時は `UlidGenerator<SystemClock>`
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn build<T: Model>(self) -> Result<BatchCoordinator<T>, BuildError> {
        self.config.validate()?;
        let queue = self.queue.ok_or(BuildError::MissingQueue)?;
        let store = self.blob_store.ok_or(BuildError::MissingBlobStore)?;

        let scratch_dir = &self.config.processor.scratch_dir;
        if !scratch_dir.is_dir() {
            return Err(BuildError::ScratchDir(scratch_dir.clone()));
        }

        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)));
        let ConsumerConfig {
            drain,
            processor,
            resolver,
        } = self.config;

        tracing::debug!(
            max_messages = drain.max_messages,
            max_in_flight = drain.max_in_flight,
            scratch_dir = %processor.scratch_dir.display(),
            "consumer built"
        );
        let processor = MessageProcessor::new(resolver, &processor, store, ids);
        Ok(BatchCoordinator::new(queue, processor, drain))
    }
}

impl Default for ConsumerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::{DrainConfig, ProcessorConfig};
    use crate::impls::{InMemoryBlobStore, InMemoryDeliveryQueue};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Product {
        id: String,
    }

    fn config_in(dir: &std::path::Path) -> ConsumerConfig {
        ConsumerConfig {
            processor: ProcessorConfig {
                scratch_dir: dir.to_path_buf(),
                ..ProcessorConfig::default()
            },
            ..ConsumerConfig::default()
        }
    }

    #[test]
    fn test_build_success() {
        let dir = tempfile::tempdir().unwrap();
        let built = ConsumerBuilder::new()
            .config(config_in(dir.path()))
            .queue(Arc::new(InMemoryDeliveryQueue::new()))
            .blob_store(Arc::new(InMemoryBlobStore::new()))
            .build::<Product>();
        assert!(built.is_ok());
    }

    #[test]
    fn test_build_missing_queue() {
        let dir = tempfile::tempdir().unwrap();
        let built = ConsumerBuilder::new()
            .config(config_in(dir.path()))
            .blob_store(Arc::new(InMemoryBlobStore::new()))
            .build::<Product>();
        assert!(matches!(built, Err(BuildError::MissingQueue)));
    }

    #[test]
    fn test_build_missing_blob_store() {
        let dir = tempfile::tempdir().unwrap();
        let built = ConsumerBuilder::new()
            .config(config_in(dir.path()))
            .queue(Arc::new(InMemoryDeliveryQueue::new()))
            .build::<Product>();
        assert!(matches!(built, Err(BuildError::MissingBlobStore)));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.drain = DrainConfig {
            max_messages: 11,
            ..DrainConfig::default()
        };
        let built = ConsumerBuilder::new()
            .config(config)
            .queue(Arc::new(InMemoryDeliveryQueue::new()))
            .blob_store(Arc::new(InMemoryBlobStore::new()))
            .build::<Product>();
        assert!(matches!(
            built,
            Err(BuildError::InvalidConfig(ConfigError::Invalid { field: "drain.max_messages", .. }))
        ));
    }

    #[test]
    fn test_build_rejects_missing_scratch_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let built = ConsumerBuilder::new()
            .config(config_in(&missing))
            .queue(Arc::new(InMemoryDeliveryQueue::new()))
            .blob_store(Arc::new(InMemoryBlobStore::new()))
            .build::<Product>();
        assert!(matches!(built, Err(BuildError::ScratchDir(p)) if p == missing));
    }
}
