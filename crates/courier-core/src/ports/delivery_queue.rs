//! DeliveryQueue port - at-least-once 配送キュー
//!
//! キュー転送そのものは外部システム（SQS など）の責務です。
//! ここでは consumer 側が必要とする receive / delete だけを定義します。
//!
//! # 実装
//! - **InMemoryDeliveryQueue**: 開発・テスト用（`impls::inmem_delivery`）

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{DeliveryToken, RawMessage, TransportError};

/// receive 1 回分のパラメータ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveRequest {
    /// 1 回で受け取る最大件数
    pub max_messages: usize,
    /// long-poll の最大待ち時間
    pub wait: Duration,
    /// 受信したメッセージが他の consumer から見えなくなる時間
    pub visibility_timeout: Duration,
}

/// DeliveryQueue はメッセージの受信と削除（ack）を提供
///
/// # 設計原則
/// - 配送は at-least-once（削除されなければ visibility timeout 後に再配送）
/// - `delete` の失敗は呼び出し側でログに残すだけ（成功済みの結果は巻き戻さない）
/// - `receive` は `wait` 以内に戻る（空なら空の Vec）
#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    async fn receive(&self, request: ReceiveRequest) -> Result<Vec<RawMessage>, TransportError>;

    /// `Ok(false)` は token が無効（期限切れ・削除済み）だったことを示す
    async fn delete(&self, token: &DeliveryToken) -> Result<bool, TransportError>;
}
