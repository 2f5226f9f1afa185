//! ReferenceResolver - メッセージから Blob 参照を取り出す
//!
//! # 判定順序（最初に一致したものだけを使う、結果はマージしない）
//! 1. 明示的な参照（`explicit_blob_references` が空でない）
//! 2. 単数キー（既定 `"s3"`）の下のオブジェクト
//! 3. 複数キー（既定 `"files"`）の下の配列（不正な要素は黙って捨てる）
//! 4. どれでもなければ空（self-contained なメッセージ）
//!
//! I/O も状態変更もしない純粋関数です。

use serde_json::{Map, Value};

use super::config::ResolverConfig;
use crate::domain::{BlobReference, RawMessage};

/// One recognized message shape: a predicate and the extractor that runs when it holds.
struct ShapeStrategy {
    name: &'static str,
    matches: fn(&ResolverConfig, &RawMessage) -> bool,
    extract: fn(&ResolverConfig, &RawMessage) -> Vec<BlobReference>,
}

const STRATEGIES: [ShapeStrategy; 3] = [
    ShapeStrategy {
        name: "explicit",
        matches: has_explicit,
        extract: explicit_references,
    },
    ShapeStrategy {
        name: "singular",
        matches: has_singular,
        extract: singular_references,
    },
    ShapeStrategy {
        name: "plural",
        matches: has_plural,
        extract: plural_references,
    },
];

#[derive(Debug, Clone, Default)]
pub struct ReferenceResolver {
    config: ResolverConfig,
}

impl ReferenceResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn resolve(&self, message: &RawMessage) -> Vec<BlobReference> {
        STRATEGIES
            .iter()
            .find(|s| (s.matches)(&self.config, message))
            .map(|s| {
                let refs = (s.extract)(&self.config, message);
                tracing::debug!(
                    message_id = %message.message_id(),
                    shape = s.name,
                    count = refs.len(),
                    "resolved blob references"
                );
                refs
            })
            .unwrap_or_default()
    }
}

fn has_explicit(_: &ResolverConfig, message: &RawMessage) -> bool {
    message
        .explicit_blob_references()
        .is_some_and(|refs| !refs.is_empty())
}

fn explicit_references(_: &ResolverConfig, message: &RawMessage) -> Vec<BlobReference> {
    message
        .explicit_blob_references()
        .map(<[BlobReference]>::to_vec)
        .unwrap_or_default()
}

fn has_singular(config: &ResolverConfig, message: &RawMessage) -> bool {
    singular_reference(config, message).is_some()
}

fn singular_references(config: &ResolverConfig, message: &RawMessage) -> Vec<BlobReference> {
    singular_reference(config, message).into_iter().collect()
}

fn singular_reference(config: &ResolverConfig, message: &RawMessage) -> Option<BlobReference> {
    message
        .body()
        .get(&config.singular_key)
        .and_then(Value::as_object)
        .and_then(|obj| parse_reference(config, obj))
}

fn has_plural(config: &ResolverConfig, message: &RawMessage) -> bool {
    message
        .body()
        .get(&config.plural_key)
        .is_some_and(Value::is_array)
}

fn plural_references(config: &ResolverConfig, message: &RawMessage) -> Vec<BlobReference> {
    message
        .body()
        .get(&config.plural_key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|obj| parse_reference(config, obj))
                .collect()
        })
        .unwrap_or_default()
}

/// `versionId` と `version_id` はどちらも受け付ける（camelCase 優先）
fn parse_reference(config: &ResolverConfig, obj: &Map<String, Value>) -> Option<BlobReference> {
    let locator = obj.get(&config.locator_field)?.as_str()?;
    let key = obj.get(&config.key_field)?.as_str()?;
    let version = ["versionId", "version_id"]
        .iter()
        .find_map(|field| obj.get(*field).and_then(Value::as_str));

    let reference = BlobReference::new(locator, key);
    Some(match version {
        Some(v) => reference.with_version(v),
        None => reference,
    })
}
