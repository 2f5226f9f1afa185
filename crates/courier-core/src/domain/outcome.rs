//! Outcome model: the per-message result returned from a drain.
//!
//! Success and failure are carried as a `Result`, so a decoded value and a
//! failure detail can never both be present (or both be absent).

use std::path::PathBuf;

use super::errors::PipelineError;
use super::message::{DeliveryToken, MessageId};

/// Result of processing one received message.
#[derive(Debug)]
pub struct ProcessingOutcome<T> {
    message_id: MessageId,
    delivery_token: DeliveryToken,
    result: Result<T, PipelineError>,
    /// Local paths that were fetched for this message. Already removed
    /// unless cleanup was disabled.
    fetched_resource_paths: Vec<PathBuf>,
}

impl<T> ProcessingOutcome<T> {
    pub fn success(message_id: MessageId, delivery_token: DeliveryToken, value: T) -> Self {
        Self {
            message_id,
            delivery_token,
            result: Ok(value),
            fetched_resource_paths: Vec::new(),
        }
    }

    pub fn failure(
        message_id: MessageId,
        delivery_token: DeliveryToken,
        error: impl Into<PipelineError>,
    ) -> Self {
        Self {
            message_id,
            delivery_token,
            result: Err(error.into()),
            fetched_resource_paths: Vec::new(),
        }
    }

    pub fn with_fetched_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.fetched_resource_paths = paths;
        self
    }

    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    pub fn delivery_token(&self) -> &DeliveryToken {
        &self.delivery_token
    }

    pub fn decoded_value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn failure_detail(&self) -> Option<&PipelineError> {
        self.result.as_ref().err()
    }

    pub fn fetched_resource_paths(&self) -> &[PathBuf] {
        &self.fetched_resource_paths
    }

    pub fn into_result(self) -> Result<T, PipelineError> {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DecodeError;

    #[test]
    fn success_and_failure_are_mutually_exclusive() {
        let ok = ProcessingOutcome::success(MessageId::new("m1"), DeliveryToken::new("t1"), 7);
        assert!(ok.succeeded());
        assert_eq!(ok.decoded_value(), Some(&7));
        assert!(ok.failure_detail().is_none());

        let failed: ProcessingOutcome<i32> = ProcessingOutcome::failure(
            MessageId::new("m2"),
            DeliveryToken::new("t2"),
            DecodeError::new("bad"),
        );
        assert!(!failed.succeeded());
        assert!(failed.decoded_value().is_none());
        assert!(matches!(failed.failure_detail(), Some(PipelineError::Decode(_))));
    }
}
