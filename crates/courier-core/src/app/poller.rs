//! PollingLoop - drain を繰り返すバックグラウンドタスク
//!
//! # 方針
//! - shutdown と競合させるのは receive だけ（処理中のバッチは最後まで settle する）
//! - receive が失敗したら RetryPolicy でバックオフ、成功したらリセット
//! - 空のバッチが返ったら `idle_delay` だけ待つ（wait=0 のときの busy loop 防止）
//! - `PollingHandle` を drop すると、ループは次の待ちで止まる

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::coordinator::BatchCoordinator;
use super::retry::RetryPolicy;
use super::status::DrainStats;
use crate::typed::{Model, OutcomeHandler};

pub struct PollingLoop<T> {
    coordinator: Arc<BatchCoordinator<T>>,
    handler: Option<Arc<dyn OutcomeHandler<T>>>,
    auto_delete: bool,
    retry: RetryPolicy,
    idle_delay: Duration,
}

impl<T: Model> PollingLoop<T> {
    pub fn new(coordinator: Arc<BatchCoordinator<T>>) -> Self {
        Self {
            coordinator,
            handler: None,
            auto_delete: true,
            retry: RetryPolicy::default_policy(),
            idle_delay: Duration::from_secs(1),
        }
    }

    pub fn with_handler(mut self, handler: Arc<dyn OutcomeHandler<T>>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn with_auto_delete(mut self, auto_delete: bool) -> Self {
        self.auto_delete = auto_delete;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_idle_delay(mut self, idle_delay: Duration) -> Self {
        self.idle_delay = idle_delay;
        self
    }

    pub fn spawn(self) -> PollingHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(shutdown_rx));
        PollingHandle { shutdown_tx, join }
    }

    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> DrainStats {
        let mut total = DrainStats::default();
        let mut failures: u32 = 0;

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let received = tokio::select! {
                changed = shutdown_rx.changed() => {
                    // sender が消えたら誰も止められないので、ここで抜ける
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                received = self.coordinator.receive() => received,
            };

            match received {
                Ok(messages) => {
                    failures = 0;
                    let idle = messages.is_empty();
                    let (_, stats) = self
                        .coordinator
                        .process_batch(messages, self.handler.as_deref(), self.auto_delete)
                        .await;
                    total.merge(&stats);

                    if idle
                        && !self.idle_delay.is_zero()
                        && pause(&mut shutdown_rx, self.idle_delay).await
                    {
                        break;
                    }
                }
                Err(_) => {
                    // エラー内容は BatchCoordinator::receive がログ済み
                    failures = failures.saturating_add(1);
                    let delay = self.retry.next_delay(failures);
                    debug!(failures, ?delay, "backing off before next receive");
                    if pause(&mut shutdown_rx, delay).await {
                        break;
                    }
                }
            }
        }

        info!(
            received = total.received,
            succeeded = total.succeeded,
            failed = total.failed,
            deleted = total.deleted,
            "polling loop stopped"
        );
        total
    }
}

/// Sleep for `delay`. Returns true when the loop should stop.
async fn pause(shutdown_rx: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        changed = shutdown_rx.changed() => changed.is_err() || *shutdown_rx.borrow(),
    }
}

/// Handle to a spawned polling loop.
pub struct PollingHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<DrainStats>,
}

impl PollingHandle {
    /// Stop receiving new batches. A batch already received is still settled.
    pub fn request_shutdown(&self) {
        // receiver が先に終わっていても問題ない
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait; returns the stats accumulated over the loop's lifetime.
    pub async fn shutdown_and_join(self) -> DrainStats {
        self.request_shutdown();
        match self.join.await {
            Ok(stats) => stats,
            Err(e) => {
                error!(error = %e, "polling loop task failed");
                DrainStats::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::{DrainConfig, ProcessorConfig, ResolverConfig};
    use crate::app::processor::MessageProcessor;
    use crate::domain::{DeliveryToken, MessageBody, RawMessage, TransportError};
    use crate::impls::{InMemoryBlobStore, InMemoryDeliveryQueue};
    use crate::ports::{DeliveryQueue, ReceiveRequest, SystemClock, UlidGenerator};
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Product {
        id: String,
        name: String,
        price: f64,
    }

    /// 最初の `failures` 回だけ receive を失敗させるキュー
    struct FlakyQueue {
        inner: InMemoryDeliveryQueue,
        failures: AtomicU32,
        receives: AtomicU32,
    }

    #[async_trait]
    impl DeliveryQueue for FlakyQueue {
        async fn receive(
            &self,
            request: ReceiveRequest,
        ) -> Result<Vec<RawMessage>, TransportError> {
            self.receives.fetch_add(1, Ordering::SeqCst);
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(TransportError::unavailable("receive", "throttled"));
            }
            self.inner.receive(request).await
        }

        async fn delete(&self, token: &DeliveryToken) -> Result<bool, TransportError> {
            self.inner.delete(token).await
        }
    }

    fn product(id: &str) -> MessageBody {
        json!({"id": id, "name": "Widget", "price": 1.0})
            .as_object()
            .cloned()
            .unwrap()
    }

    fn coordinator(
        queue: Arc<dyn DeliveryQueue>,
        scratch: &std::path::Path,
        wait_seconds: u64,
    ) -> Arc<BatchCoordinator<Product>> {
        let processor = MessageProcessor::new(
            ResolverConfig::default(),
            &ProcessorConfig {
                scratch_dir: scratch.to_path_buf(),
                ..ProcessorConfig::default()
            },
            Arc::new(InMemoryBlobStore::new()),
            Arc::new(UlidGenerator::new(SystemClock)),
        );
        let drain = DrainConfig {
            wait_seconds,
            ..DrainConfig::default()
        };
        Arc::new(BatchCoordinator::new(queue, processor, drain))
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(10),
            multiplier: 2.0,
            max_delay: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn recovers_from_receive_failures() {
        let dir = tempfile::tempdir().unwrap();
        let queue = Arc::new(FlakyQueue {
            inner: InMemoryDeliveryQueue::new(),
            failures: AtomicU32::new(2),
            receives: AtomicU32::new(0),
        });
        queue.inner.send(product("p1")).await;
        queue.inner.send(product("p2")).await;

        let handle = PollingLoop::new(coordinator(queue.clone(), dir.path(), 0))
            .with_retry_policy(fast_retry())
            .with_idle_delay(Duration::from_millis(10))
            .spawn();

        for _ in 0..100 {
            if queue.inner.visible_count().await == 0 && queue.inner.in_flight_count().await == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let stats = handle.shutdown_and_join().await;
        assert_eq!(stats.received, 2);
        assert_eq!(stats.deleted, 2);
        assert!(queue.receives.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn shutdown_interrupts_long_poll() {
        let dir = tempfile::tempdir().unwrap();
        let queue = Arc::new(InMemoryDeliveryQueue::new());
        let handle = PollingLoop::new(coordinator(queue, dir.path(), 20)).spawn();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let stats = tokio::time::timeout(Duration::from_secs(2), handle.shutdown_and_join())
            .await
            .expect("loop should stop well before the 20s long poll ends");

        assert_eq!(stats, DrainStats::default());
    }

    #[tokio::test]
    async fn disabled_auto_delete_leaves_messages_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let queue = Arc::new(InMemoryDeliveryQueue::new());
        queue.send(product("p1")).await;

        let handle = PollingLoop::new(coordinator(queue.clone(), dir.path(), 0))
            .with_auto_delete(false)
            .with_idle_delay(Duration::from_millis(10))
            .spawn();

        for _ in 0..100 {
            if queue.in_flight_count().await == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let stats = handle.shutdown_and_join().await;

        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.deleted, 0);
        assert_eq!(queue.in_flight_count().await, 1);
    }
}
