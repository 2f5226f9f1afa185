//! Domain identifiers (strongly-typed IDs).
//!
//! # ULID ベースの ID + Phantom type
//! 処理 attempt とダウンロードしたファイルは ULID で識別します。
//! キュー側の `message_id` は受信サイクルごとの値でしかないため、
//! ローカル資源の所有者としては使いません。
//!
//! ## ULID の特性
//! - **時刻でソート可能**: ログ上で attempt の順序が追える
//! - **衝突しにくい**: 並行処理中のメッセージ間でファイル名が重ならない
//!
//! ## Phantom Type パターン
//! `Id<T>` に共通実装を置き、`T` はマーカー型としてのみ使います。
//! `AttemptId` と `ResourceId` はコンパイル時に区別されます。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"attempt-", "res-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// 処理 attempt のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attempt {}

impl IdMarker for Attempt {
    fn prefix() -> &'static str {
        "attempt-"
    }
}

/// ダウンロード済みファイルのマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {}

impl IdMarker for Resource {
    fn prefix() -> &'static str {
        "res-"
    }
}

/// Identifier of one `MessageProcessor::process` invocation.
pub type AttemptId = Id<Attempt>;

/// Identifier of one fetched blob on local disk.
pub type ResourceId = Id<Resource>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types_with_prefixes() {
        let attempt = AttemptId::from_ulid(Ulid::new());
        let resource = ResourceId::from_ulid(Ulid::new());

        assert!(attempt.to_string().starts_with("attempt-"));
        assert!(resource.to_string().starts_with("res-"));

        // let _: AttemptId = resource; // <- does not compile
    }

    #[test]
    fn ulid_ids_are_sortable() {
        let id1 = AttemptId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = AttemptId::from_ulid(Ulid::new());

        assert!(id1 < id2);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;

        assert_eq!(size_of::<AttemptId>(), size_of::<Ulid>());
        assert_eq!(size_of::<ResourceId>(), 16);
    }
}
