//! PayloadDecoder - body / blob を T にデシリアライズ
//!
//! # デコード順序（固定）
//! 1. body そのもの
//! 2. body["data"]（オブジェクトの場合）
//! 3. 最初にダウンロードしたファイル（JSON）
//! 4. body["payload"]（オブジェクトの場合）
//!
//! 最初に成功したものを返します。全滅した場合は 1 の失敗内容を
//! `DecodeError` として返します。

use serde_json::Value;
use tracing::debug;

use super::model::Model;
use crate::domain::{DecodeError, DecodeStrategy, FetchedResource, MessageBody};

/// Result of one decode step.
enum Attempt<T> {
    Decoded(T),
    Inapplicable,
    Rejected(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadDecoder;

impl PayloadDecoder {
    pub const ORDER: [DecodeStrategy; 4] = [
        DecodeStrategy::Body,
        DecodeStrategy::NestedData,
        DecodeStrategy::FirstResource,
        DecodeStrategy::NestedPayload,
    ];

    pub fn new() -> Self {
        Self
    }

    pub async fn decode<T: Model>(
        &self,
        body: &MessageBody,
        fetched: &[FetchedResource],
    ) -> Result<T, DecodeError> {
        let mut attempted = Vec::new();
        let mut primary = None;

        for strategy in Self::ORDER {
            match self.attempt::<T>(strategy, body, fetched).await {
                Attempt::Decoded(value) => {
                    debug!(%strategy, "payload decoded");
                    return Ok(value);
                }
                Attempt::Inapplicable => {}
                Attempt::Rejected(detail) => {
                    debug!(%strategy, %detail, "decode strategy rejected");
                    attempted.push(strategy);
                    if strategy == DecodeStrategy::Body {
                        primary = Some(detail);
                    }
                }
            }
        }

        Err(DecodeError {
            detail: primary.unwrap_or_else(|| "no decode strategy applied".to_string()),
            attempted,
        })
    }

    async fn attempt<T: Model>(
        &self,
        strategy: DecodeStrategy,
        body: &MessageBody,
        fetched: &[FetchedResource],
    ) -> Attempt<T> {
        match strategy {
            DecodeStrategy::Body => from_value(Value::Object(body.clone())),
            DecodeStrategy::NestedData => nested(body, "data"),
            DecodeStrategy::FirstResource => match fetched.first() {
                Some(resource) => from_resource(resource).await,
                None => Attempt::Inapplicable,
            },
            DecodeStrategy::NestedPayload => nested(body, "payload"),
        }
    }
}

fn from_value<T: Model>(value: Value) -> Attempt<T> {
    match serde_json::from_value(value) {
        Ok(v) => Attempt::Decoded(v),
        Err(e) => Attempt::Rejected(e.to_string()),
    }
}

fn nested<T: Model>(body: &MessageBody, key: &str) -> Attempt<T> {
    match body.get(key) {
        Some(inner @ Value::Object(_)) => from_value(inner.clone()),
        _ => Attempt::Inapplicable,
    }
}

async fn from_resource<T: Model>(resource: &FetchedResource) -> Attempt<T> {
    let path = resource.local_path();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => return Attempt::Rejected(format!("read {}: {e}", path.display())),
    };
    match serde_json::from_slice(&bytes) {
        Ok(v) => Attempt::Decoded(v),
        Err(e) => Attempt::Rejected(format!("{} ({})", e, resource.reference())),
    }
}
