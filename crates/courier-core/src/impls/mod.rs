//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の in-memory 実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryDeliveryQueue**: at-least-once キュー（visibility timeout 付き）
//! - **InMemoryBlobStore**: バージョン付き Blob ストア
//!
//! # 本番用実装
//! SQS / S3 などのアダプタは別クレートで ports を実装します。

pub mod inmem_blob;
pub mod inmem_delivery;

pub use self::inmem_blob::InMemoryBlobStore;
pub use self::inmem_delivery::InMemoryDeliveryQueue;
