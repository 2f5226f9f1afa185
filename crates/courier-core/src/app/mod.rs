//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてコンシューマのロジックを実装します。
//!
//! # 主要コンポーネント
//! - **ConsumerBuilder**: 設定の検証とワイヤリング
//! - **ReferenceResolver**: メッセージから Blob 参照を取り出す
//! - **BlobFetcher**: 参照先を scratch ディレクトリにダウンロード
//! - **MessageProcessor**: 1 メッセージ分の resolve → fetch → decode → cleanup
//! - **BatchCoordinator**: receive → process → handler → delete（1 drain）
//! - **PollingLoop**: drain を繰り返すバックグラウンドタスク

pub mod builder;
pub mod config;
pub mod coordinator;
pub mod fetcher;
pub mod poller;
pub mod processor;
pub mod resolver;
pub mod retry;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, ConsumerBuilder};
pub use self::config::{
    ConfigError, ConsumerConfig, DrainConfig, MAX_BATCH_SIZE, MAX_VISIBILITY_TIMEOUT_SECONDS,
    MAX_WAIT_SECONDS, ProcessorConfig, ResolverConfig,
};
pub use self::coordinator::BatchCoordinator;
pub use self::fetcher::{BlobFetcher, release_all};
pub use self::poller::{PollingHandle, PollingLoop};
pub use self::processor::MessageProcessor;
pub use self::resolver::ReferenceResolver;
pub use self::retry::RetryPolicy;
pub use self::status::DrainStats;
