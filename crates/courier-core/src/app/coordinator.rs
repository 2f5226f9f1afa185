//! BatchCoordinator - receive → process → handler → delete
//!
//! # フロー（1 drain）
//! 1. DeliveryQueue::receive() でバッチを取得（失敗はそのまま呼び出し側へ）
//! 2. 受信順に MessageProcessor::process()（`max_in_flight` > 1 なら並行、順序は維持）
//! 3. 受信順に handler を呼ぶ。`false` が返ったら、そのメッセージ以降は自動削除しない
//! 4. 成功した結果だけを削除（失敗した結果は handler に関係なく残す）

use std::sync::Arc;

use futures::{StreamExt, stream};
use tracing::{debug, error, info, warn};

use super::config::DrainConfig;
use super::processor::MessageProcessor;
use super::status::DrainStats;
use crate::domain::{ProcessingOutcome, RawMessage, TransportError};
use crate::ports::DeliveryQueue;
use crate::typed::{Model, OutcomeHandler};

pub struct BatchCoordinator<T> {
    queue: Arc<dyn DeliveryQueue>,
    processor: MessageProcessor<T>,
    config: DrainConfig,
}

impl<T: Model> BatchCoordinator<T> {
    pub fn new(
        queue: Arc<dyn DeliveryQueue>,
        processor: MessageProcessor<T>,
        config: DrainConfig,
    ) -> Self {
        Self {
            queue,
            processor,
            config,
        }
    }

    pub fn processor(&self) -> &MessageProcessor<T> {
        &self.processor
    }

    /// Receive one batch and process it. Outcomes are in receive order.
    ///
    /// Only a failing `receive` is returned as an error; every per-message
    /// failure is reported inside its outcome.
    pub async fn drain_once(
        &self,
        handler: Option<&dyn OutcomeHandler<T>>,
        auto_delete: bool,
    ) -> Result<Vec<ProcessingOutcome<T>>, TransportError> {
        self.drain_once_with_stats(handler, auto_delete)
            .await
            .map(|(outcomes, _)| outcomes)
    }

    pub async fn drain_once_with_stats(
        &self,
        handler: Option<&dyn OutcomeHandler<T>>,
        auto_delete: bool,
    ) -> Result<(Vec<ProcessingOutcome<T>>, DrainStats), TransportError> {
        let messages = self.receive().await?;
        Ok(self.process_batch(messages, handler, auto_delete).await)
    }

    /// Receive one batch, bounded by the long-poll wait plus grace.
    pub async fn receive(&self) -> Result<Vec<RawMessage>, TransportError> {
        let timeout = self.config.receive_timeout();
        let received = tokio::time::timeout(
            timeout,
            self.queue.receive(self.config.receive_request()),
        )
        .await
        .map_err(|_| TransportError::timeout("receive", timeout))
        .and_then(|r| r);

        match received {
            Ok(messages) => {
                debug!(count = messages.len(), "batch received");
                Ok(messages)
            }
            Err(e) => {
                error!(error = %e, "receive failed");
                Err(e)
            }
        }
    }

    /// Process an already received batch and settle each message.
    pub async fn process_batch(
        &self,
        messages: Vec<RawMessage>,
        handler: Option<&dyn OutcomeHandler<T>>,
        mut auto_delete: bool,
    ) -> (Vec<ProcessingOutcome<T>>, DrainStats) {
        let mut stats = DrainStats {
            received: messages.len(),
            ..DrainStats::default()
        };
        if messages.is_empty() {
            debug!("no messages to process");
            return (Vec::new(), stats);
        }

        let mut outcomes = Vec::with_capacity(stats.received);
        // 各 future がメッセージを所有する（spawn 先でも Send になる）
        let mut pending = stream::iter(messages)
            .map(|message| async move { self.processor.process(&message).await })
            .buffered(self.config.max_in_flight.max(1));

        while let Some(outcome) = pending.next().await {
            if outcome.succeeded() {
                stats.succeeded += 1;
            } else {
                stats.failed += 1;
            }

            if let Some(handler) = handler
                && !handler.on_outcome(&outcome).await
            {
                stats.vetoed += 1;
                if auto_delete {
                    info!(
                        message_id = %outcome.message_id(),
                        "handler vetoed deletion; auto-delete off for the rest of this batch"
                    );
                    auto_delete = false;
                }
            }

            if auto_delete && outcome.succeeded() {
                if self.delete(&outcome).await {
                    stats.deleted += 1;
                } else {
                    stats.delete_failures += 1;
                }
            }
            outcomes.push(outcome);
        }

        info!(
            received = stats.received,
            succeeded = stats.succeeded,
            failed = stats.failed,
            deleted = stats.deleted,
            vetoed = stats.vetoed,
            "batch processed"
        );
        (outcomes, stats)
    }

    /// 削除の失敗はログだけ（成功済みの結果は巻き戻さない）
    async fn delete(&self, outcome: &ProcessingOutcome<T>) -> bool {
        let timeout = self.config.delete_timeout();
        let message_id = outcome.message_id();
        match tokio::time::timeout(timeout, self.queue.delete(outcome.delivery_token())).await {
            Ok(Ok(true)) => {
                debug!(%message_id, "message deleted");
                true
            }
            Ok(Ok(false)) => {
                warn!(%message_id, "delete rejected: delivery token no longer valid");
                false
            }
            Ok(Err(e)) => {
                warn!(%message_id, error = %e, "delete failed");
                false
            }
            Err(_) => {
                warn!(%message_id, ?timeout, "delete timed out");
                false
            }
        }
    }
}
