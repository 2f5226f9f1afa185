//! BlobStore port - Blob ストレージ（S3 など）
//!
//! メッセージに埋め込まれた参照（locator + key + version）から中身を取得します。

use async_trait::async_trait;

use crate::domain::{BlobReference, TransportError};

/// BlobStore は参照先のオブジェクトを bytes で返す
///
/// # エラー
/// - 存在しない: `TransportError::NotFound`
/// - 権限なし: `TransportError::AccessDenied`
/// - ネットワーク障害: `TransportError::Unavailable`
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, reference: &BlobReference) -> Result<Vec<u8>, TransportError>;
}
