use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::errors::DecodeError;
use super::reference::BlobReference;

/// Untyped message body: a JSON object.
pub type MessageBody = serde_json::Map<String, serde_json::Value>;

/// Transport-assigned message id. Unique per receive cycle only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque handle needed to delete a received message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryToken(String);

impl DeliveryToken {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeliveryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A message as handed over by the queue transport. Read-only to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    message_id: MessageId,
    delivery_token: DeliveryToken,
    body: MessageBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transport_attributes: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explicit_blob_references: Option<Vec<BlobReference>>,
}

impl RawMessage {
    pub fn new(message_id: MessageId, delivery_token: DeliveryToken, body: MessageBody) -> Self {
        Self {
            message_id,
            delivery_token,
            body,
            transport_attributes: None,
            explicit_blob_references: None,
        }
    }

    /// Build a message from a transport that delivers the body as a JSON string.
    pub fn from_json_body(
        message_id: MessageId,
        delivery_token: DeliveryToken,
        raw: &str,
    ) -> Result<Self, DecodeError> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| DecodeError::new(format!("message body is not JSON: {e}")))?;
        match value {
            serde_json::Value::Object(body) => Ok(Self::new(message_id, delivery_token, body)),
            other => Err(DecodeError::new(format!(
                "message body must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.transport_attributes = Some(attributes);
        self
    }

    pub fn with_blob_references(mut self, refs: Vec<BlobReference>) -> Self {
        self.explicit_blob_references = Some(refs);
        self
    }

    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    pub fn delivery_token(&self) -> &DeliveryToken {
        &self.delivery_token
    }

    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    pub fn transport_attributes(&self) -> Option<&HashMap<String, String>> {
        self.transport_attributes.as_ref()
    }

    pub fn explicit_blob_references(&self) -> Option<&[BlobReference]> {
        self.explicit_blob_references.as_deref()
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_body_accepts_objects() {
        let msg = RawMessage::from_json_body(
            MessageId::new("m1"),
            DeliveryToken::new("t1"),
            r#"{"id":"p1"}"#,
        )
        .unwrap();
        assert_eq!(msg.body()["id"], "p1");
        assert!(msg.explicit_blob_references().is_none());
    }

    #[test]
    fn from_json_body_rejects_non_objects() {
        let err = RawMessage::from_json_body(
            MessageId::new("m1"),
            DeliveryToken::new("t1"),
            "[1,2]",
        )
        .unwrap_err();
        assert!(err.detail.contains("array"));

        let err =
            RawMessage::from_json_body(MessageId::new("m1"), DeliveryToken::new("t1"), "{oops")
                .unwrap_err();
        assert!(err.detail.contains("not JSON"));
    }
}
