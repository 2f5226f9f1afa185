//! Errors - エラー型と分類
//!
//! 3 つの失敗面（キュー転送 / Blob 転送 / データ形状）をそれぞれ型で分けます。
//! - `TransportError`: キュー・Blob ストアの障害（外側のポーリングループで再試行可能）
//! - `DecodeError`: どの戦略でも T にならなかった（poison message）
//! - `CleanupWarning`: 一時ファイル削除の失敗（ログのみ、結果には影響しない）

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// ErrorKind は実行エラーの分類
///
/// - Transient: 一時的なエラー（リトライ推奨）
/// - Permanent: 恒久的なエラー（リトライ無意味）
/// - Infrastructure: ローカル環境の障害（scratch ディレクトリなど）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

/// Queue or blob-store transport failure.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("object not found: {locator}/{key}")]
    NotFound { locator: String, key: String },

    #[error("access denied: {locator}/{key}")]
    AccessDenied { locator: String, key: String },

    #[error("transport unavailable during {operation}: {message}")]
    Unavailable { operation: String, message: String },

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    #[error("failed to write scratch file {}: {source}", .path.display())]
    Scratch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransportError {
    pub fn unavailable(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Scratch { .. } => ErrorKind::Infrastructure,
            _ => ErrorKind::Transient,
        }
    }
}

/// One step of the decode fallback sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeStrategy {
    Body,
    NestedData,
    FirstResource,
    NestedPayload,
}

impl fmt::Display for DecodeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Body => "body",
            Self::NestedData => "data",
            Self::FirstResource => "first_resource",
            Self::NestedPayload => "payload",
        };
        f.write_str(s)
    }
}

/// The message could not be turned into the target type.
///
/// `detail` is the failure from decoding the body directly, which is the
/// most useful one when diagnosing a poison message.
#[derive(Debug, Error)]
#[error("decode failed: {detail} (tried: {})", fmt_strategies(.attempted))]
pub struct DecodeError {
    pub detail: String,
    pub attempted: Vec<DecodeStrategy>,
}

impl DecodeError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            attempted: Vec::new(),
        }
    }
}

fn fmt_strategies(attempted: &[DecodeStrategy]) -> String {
    attempted
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A scoped resource could not be removed. Never returned to callers.
#[derive(Debug, Error)]
#[error("failed to remove {}: {source}", .path.display())]
pub struct CleanupWarning {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Per-message failure detail carried by a failed outcome.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(e) => e.kind(),
            Self::Decode(_) => ErrorKind::Permanent,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() != ErrorKind::Permanent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_are_permanent() {
        let err = PipelineError::from(DecodeError::new("missing field `id`"));
        assert_eq!(err.kind(), ErrorKind::Permanent);
        assert!(!err.is_retryable());
    }

    #[test]
    fn transport_errors_are_retryable() {
        let err = PipelineError::from(TransportError::NotFound {
            locator: "b".into(),
            key: "k".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "object not found: b/k");
    }

    #[test]
    fn decode_error_lists_attempted_strategies() {
        let err = DecodeError {
            detail: "missing field `price`".into(),
            attempted: vec![DecodeStrategy::Body, DecodeStrategy::NestedData],
        };
        assert_eq!(
            err.to_string(),
            "decode failed: missing field `price` (tried: body, data)"
        );
    }
}
