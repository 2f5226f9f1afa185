//! OutcomeHandler - 処理結果ごとに呼ばれる caller 側のフック
//!
//! `false` を返すと、その drain の残りのメッセージは自動削除されません（veto）。

use super::model::Model;
use crate::domain::ProcessingOutcome;
use async_trait::async_trait;

/// Post-processing hook invoked once per outcome, in receive order.
///
/// # 使用例
/// ```ignore
/// struct Audit;
///
/// #[async_trait]
/// impl OutcomeHandler<Product> for Audit {
///     async fn on_outcome(&self, outcome: &ProcessingOutcome<Product>) -> bool {
///         outcome.succeeded()
///     }
/// }
/// ```
#[async_trait]
pub trait OutcomeHandler<T: Model>: Send + Sync {
    /// Return `false` to veto deletion for this and all later messages of the drain.
    async fn on_outcome(&self, outcome: &ProcessingOutcome<T>) -> bool;
}

/// Adapts a synchronous closure into an [`OutcomeHandler`].
pub struct FnHandler<F> {
    f: F,
}

pub fn handler_fn<F>(f: F) -> FnHandler<F> {
    FnHandler { f }
}

#[async_trait]
impl<T, F> OutcomeHandler<T> for FnHandler<F>
where
    T: Model,
    F: Fn(&ProcessingOutcome<T>) -> bool + Send + Sync,
{
    async fn on_outcome(&self, outcome: &ProcessingOutcome<T>) -> bool {
        (self.f)(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeliveryToken, MessageId};

    #[tokio::test]
    async fn closure_handler_sees_outcome() {
        let handler = handler_fn(|o: &ProcessingOutcome<u32>| o.decoded_value() == Some(&1));

        let one = ProcessingOutcome::success(MessageId::new("m1"), DeliveryToken::new("t1"), 1);
        let two = ProcessingOutcome::success(MessageId::new("m2"), DeliveryToken::new("t2"), 2);

        assert!(handler.on_outcome(&one).await);
        assert!(!handler.on_outcome(&two).await);
    }
}
