//! InMemoryDeliveryQueue - 開発・テスト用の at-least-once キュー
//!
//! # 挙動
//! - receive は `wait` まで long-poll（`Notify` で send を待つ）
//! - 受信したメッセージは `visibility_timeout` の間 in-flight になり、
//!   期限が切れると新しい token で再配送される
//! - delete は in-flight の token に対してのみ成功する

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::domain::{
    BlobReference, DeliveryToken, MessageBody, MessageId, RawMessage, TransportError,
};
use crate::ports::{DeliveryQueue, ReceiveRequest};

/// `Instant` に足せないほど長い待ち時間は、この先で打ち切る（約 30 年）
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(now: Instant, duration: Duration) -> Instant {
    now.checked_add(duration)
        .unwrap_or_else(|| now + FAR_FUTURE)
}

/// キューに保持されるメッセージ本体
#[derive(Debug, Clone)]
struct StoredMessage {
    id: MessageId,
    body: MessageBody,
    attributes: Option<HashMap<String, String>>,
    blob_references: Option<Vec<BlobReference>>,
    receive_count: u32,
}

impl StoredMessage {
    fn to_raw(&self, token: DeliveryToken) -> RawMessage {
        let mut attributes = self.attributes.clone().unwrap_or_default();
        attributes.insert(
            "ApproximateReceiveCount".to_string(),
            self.receive_count.to_string(),
        );
        let mut raw = RawMessage::new(self.id.clone(), token, self.body.clone())
            .with_attributes(attributes);
        if let Some(refs) = &self.blob_references {
            raw = raw.with_blob_references(refs.clone());
        }
        raw
    }
}

#[derive(Debug)]
struct InFlight {
    message: StoredMessage,
    visible_at: Instant,
}

#[derive(Debug, Default)]
struct QueueState {
    visible: VecDeque<StoredMessage>,
    /// token -> in-flight message
    in_flight: HashMap<DeliveryToken, InFlight>,
    next_message_seq: u64,
    next_token_seq: u64,
}

impl QueueState {
    /// visibility timeout が切れた in-flight を visible に戻す
    fn promote_expired(&mut self, now: Instant) {
        let expired: Vec<DeliveryToken> = self
            .in_flight
            .iter()
            .filter(|(_, f)| f.visible_at <= now)
            .map(|(t, _)| t.clone())
            .collect();
        let mut returned: Vec<StoredMessage> = expired
            .iter()
            .filter_map(|t| self.in_flight.remove(t))
            .map(|f| f.message)
            .collect();
        returned.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        self.visible.extend(returned);
    }

    fn earliest_visibility(&self) -> Option<Instant> {
        self.in_flight.values().map(|f| f.visible_at).min()
    }

    fn take_batch(&mut self, request: &ReceiveRequest, now: Instant) -> Vec<RawMessage> {
        let mut batch = Vec::new();
        while batch.len() < request.max_messages {
            let Some(mut message) = self.visible.pop_front() else {
                break;
            };
            self.next_token_seq += 1;
            let token = DeliveryToken::new(format!("rt-{:08}", self.next_token_seq));
            message.receive_count += 1;
            batch.push(message.to_raw(token.clone()));
            self.in_flight.insert(
                token,
                InFlight {
                    message,
                    visible_at: deadline_after(now, request.visibility_timeout),
                },
            );
        }
        batch
    }
}

/// InMemoryDeliveryQueue は開発用の配送キュー
///
/// # 使用例
/// ```ignore
/// let queue = InMemoryDeliveryQueue::new();
/// queue.send(body).await;
/// let batch = queue.receive(request).await?;
/// ```
#[derive(Default)]
pub struct InMemoryDeliveryQueue {
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
}

impl InMemoryDeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// body だけのメッセージを投入
    pub async fn send(&self, body: MessageBody) -> MessageId {
        self.send_with(body, None, None).await
    }

    /// 属性・明示的な Blob 参照付きでメッセージを投入
    pub async fn send_with(
        &self,
        body: MessageBody,
        attributes: Option<HashMap<String, String>>,
        blob_references: Option<Vec<BlobReference>>,
    ) -> MessageId {
        let id = {
            let mut state = self.state.lock().await;
            state.next_message_seq += 1;
            let id = MessageId::new(format!("msg-{:08}", state.next_message_seq));
            state.visible.push_back(StoredMessage {
                id: id.clone(),
                body,
                attributes,
                blob_references,
                receive_count: 0,
            });
            id
        };
        self.notify.notify_one();
        id
    }

    pub async fn visible_count(&self) -> usize {
        self.state.lock().await.visible.len()
    }

    pub async fn in_flight_count(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    /// in-flight（未削除）メッセージの ID を昇順で返す
    pub async fn in_flight_ids(&self) -> Vec<MessageId> {
        let state = self.state.lock().await;
        let mut ids: Vec<MessageId> = state
            .in_flight
            .values()
            .map(|f| f.message.id.clone())
            .collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }
}

#[async_trait]
impl DeliveryQueue for InMemoryDeliveryQueue {
    async fn receive(&self, request: ReceiveRequest) -> Result<Vec<RawMessage>, TransportError> {
        let deadline = deadline_after(Instant::now(), request.wait);
        loop {
            let next_wake = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                state.promote_expired(now);

                let batch = state.take_batch(&request, now);
                if !batch.is_empty() || request.max_messages == 0 || now >= deadline {
                    return Ok(batch);
                }

                match state.earliest_visibility() {
                    Some(at) if at < deadline => at,
                    _ => deadline,
                }
            };

            // send の通知か、次の再配送時刻 / deadline まで待つ
            tokio::select! {
                _ = self.notify.notified() => {},
                _ = tokio::time::sleep_until(next_wake) => {},
            }
        }
    }

    async fn delete(&self, token: &DeliveryToken) -> Result<bool, TransportError> {
        let mut state = self.state.lock().await;
        state.promote_expired(Instant::now());
        Ok(state.in_flight.remove(token).is_some())
    }
}
