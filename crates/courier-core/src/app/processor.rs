//! MessageProcessor - 1 メッセージ分の resolve → fetch → decode
//!
//! # フロー
//! 1. ReferenceResolver で参照を取り出す
//! 2. BlobFetcher で順番にダウンロード（1 件でも失敗したら decode せずに失敗）
//! 3. PayloadDecoder で T にする
//! 4. 成否にかかわらず、この attempt で作ったファイルを消してから結果を返す
//!
//! `process` はエラーを返しません。失敗はすべて `ProcessingOutcome` に入ります。

use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{Instrument, error, info_span, warn};

use super::config::{ProcessorConfig, ResolverConfig};
use super::fetcher::{BlobFetcher, release_all};
use super::resolver::ReferenceResolver;
use crate::domain::{AttemptId, FetchedResource, PipelineError, ProcessingOutcome, RawMessage};
use crate::ports::{BlobStore, IdGenerator};
use crate::typed::{Model, PayloadDecoder};

pub struct MessageProcessor<T> {
    resolver: ReferenceResolver,
    fetcher: BlobFetcher,
    decoder: PayloadDecoder,
    ids: Arc<dyn IdGenerator>,
    auto_cleanup: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Model> MessageProcessor<T> {
    pub fn new(
        resolver: ResolverConfig,
        config: &ProcessorConfig,
        store: Arc<dyn BlobStore>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            resolver: ReferenceResolver::new(resolver),
            fetcher: BlobFetcher::new(
                store,
                Arc::clone(&ids),
                config.scratch_dir.clone(),
                config.fetch_timeout(),
            ),
            decoder: PayloadDecoder::new(),
            ids,
            auto_cleanup: config.auto_cleanup,
            _marker: PhantomData,
        }
    }

    pub async fn process(&self, message: &RawMessage) -> ProcessingOutcome<T> {
        let attempt = self.ids.generate_attempt_id();
        let span = info_span!("process", message_id = %message.message_id(), %attempt);

        async {
            let mut fetched = Vec::new();
            let result = self.run(message, attempt, &mut fetched).await;

            let paths: Vec<PathBuf> = fetched
                .iter()
                .map(|r| r.local_path().to_path_buf())
                .collect();
            if self.auto_cleanup {
                for warning in release_all(&fetched).await {
                    warn!(%warning, "scratch cleanup failed");
                }
            }

            let outcome = match result {
                Ok(value) => ProcessingOutcome::success(
                    message.message_id().clone(),
                    message.delivery_token().clone(),
                    value,
                ),
                Err(err) => {
                    error!(
                        error = %err,
                        kind = ?err.kind(),
                        retryable = err.is_retryable(),
                        "message processing failed"
                    );
                    ProcessingOutcome::failure(
                        message.message_id().clone(),
                        message.delivery_token().clone(),
                        err,
                    )
                }
            };
            outcome.with_fetched_paths(paths)
        }
        .instrument(span)
        .await
    }

    /// `fetched` に積んだものは呼び出し側が必ず片付ける
    async fn run(
        &self,
        message: &RawMessage,
        attempt: AttemptId,
        fetched: &mut Vec<FetchedResource>,
    ) -> Result<T, PipelineError> {
        let references = self.resolver.resolve(message);
        for reference in &references {
            fetched.push(self.fetcher.fetch(reference, attempt).await?);
        }
        Ok(self.decoder.decode(message.body(), fetched).await?)
    }
}
