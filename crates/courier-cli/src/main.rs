use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::time::{Duration, sleep};
use tracing_subscriber::EnvFilter;

use courier_core::app::{ConsumerBuilder, ConsumerConfig, PollingLoop};
use courier_core::domain::{MessageBody, ProcessingOutcome};
use courier_core::impls::{InMemoryBlobStore, InMemoryDeliveryQueue};
use courier_core::typed::{OutcomeHandler, handler_fn};

#[derive(Debug, Deserialize)]
struct Product {
    id: String,
    name: String,
    price: f64,
}

/// 成功・失敗を数えるだけの handler（veto しない）
#[derive(Default)]
struct Tally {
    ok: AtomicUsize,
    failed: AtomicUsize,
}

#[async_trait]
impl OutcomeHandler<Product> for Tally {
    async fn on_outcome(&self, outcome: &ProcessingOutcome<Product>) -> bool {
        let counter = if outcome.succeeded() { &self.ok } else { &self.failed };
        counter.fetch_add(1, Ordering::Relaxed);
        true
    }
}

fn body(value: serde_json::Value) -> anyhow::Result<MessageBody> {
    value
        .as_object()
        .cloned()
        .context("message body must be a JSON object")
}

/// 第 1 引数に JSON の設定ファイルを渡せる（省略時は既定値 + long poll なし）
fn load_config() -> anyhow::Result<ConsumerConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {path}"))?;
            ConsumerConfig::from_json_str(&raw).with_context(|| format!("invalid config in {path}"))
        }
        None => {
            let mut config = ConsumerConfig::default();
            config.drain.wait_seconds = 0;
            Ok(config)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = load_config()?;

    // (A) キューと Blob ストアを用意
    let queue = Arc::new(InMemoryDeliveryQueue::new());
    let store = Arc::new(InMemoryBlobStore::new());
    store
        .put(
            "catalog",
            "incoming/p2.json",
            serde_json::to_vec(&json!({"id": "p2", "name": "Gadget", "price": 19.99}))?,
        )
        .await;

    // (B) inline / 単数参照 / 参照先なし の 3 通りを投入
    queue
        .send(body(json!({"id": "p1", "name": "Widget", "price": 9.99}))?)
        .await;
    queue
        .send(body(json!({"s3": {"bucket": "catalog", "key": "incoming/p2.json"}}))?)
        .await;
    queue
        .send(body(json!({"s3": {"bucket": "catalog", "key": "incoming/missing.json"}}))?)
        .await;

    let coordinator = Arc::new(
        ConsumerBuilder::new()
            .config(config)
            .queue(queue.clone())
            .blob_store(store.clone())
            .build::<Product>()?,
    );

    // (C) 1 回だけ drain（handler は全件 OK を返すので veto なし）
    let log = handler_fn(|outcome: &ProcessingOutcome<Product>| {
        tracing::info!(
            message_id = %outcome.message_id(),
            succeeded = outcome.succeeded(),
            "outcome"
        );
        true
    });
    let (outcomes, stats) = coordinator.drain_once_with_stats(Some(&log), true).await?;
    println!("drained {} messages: {}", outcomes.len(), serde_json::to_string(&stats)?);
    for outcome in outcomes {
        let message_id = outcome.message_id().clone();
        match outcome.into_result() {
            Ok(p) => println!("{message_id} -> {} ({}) ${:.2}", p.name, p.id, p.price),
            Err(e) => println!(
                "{message_id} -> failed: {e} (retryable: {})",
                e.is_retryable()
            ),
        }
    }
    println!("still in flight: {:?}", queue.in_flight_ids().await);

    // (D) バックグラウンドで polling（Ctrl-C か 2 秒で止める）
    queue
        .send(body(json!({"id": "p3", "name": "Doohickey", "price": 4.5}))?)
        .await;
    let tally = Arc::new(Tally::default());
    let handle = PollingLoop::new(coordinator)
        .with_handler(tally.clone())
        .with_idle_delay(Duration::from_millis(200))
        .spawn();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
        _ = sleep(Duration::from_secs(2)) => {}
    }
    let total = handle.shutdown_and_join().await;
    println!(
        "polling: ok={} failed={} totals={}",
        tally.ok.load(Ordering::Relaxed),
        tally.failed.load(Ordering::Relaxed),
        serde_json::to_string(&total)?
    );
    Ok(())
}
