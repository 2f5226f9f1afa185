//! Consumer configuration.
//!
//! Every section deserializes with defaults, so a partial JSON document (or
//! none at all) yields a working consumer.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::ReceiveRequest;

/// Largest batch a single receive may ask for.
pub const MAX_BATCH_SIZE: usize = 10;

/// Longest long-poll wait a single receive may ask for.
pub const MAX_WAIT_SECONDS: u64 = 20;

/// Longest visibility timeout (12 hours).
pub const MAX_VISIBILITY_TIMEOUT_SECONDS: u64 = 43_200;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Receive / delete parameters for one drain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrainConfig {
    pub max_messages: usize,
    /// Long-poll wait for `receive`.
    pub wait_seconds: u64,
    pub visibility_timeout_seconds: u64,
    /// Extra time allowed on top of `wait_seconds` before a receive counts as hung.
    pub receive_grace_seconds: u64,
    pub delete_timeout_seconds: u64,
    /// Messages processed concurrently within one drain. Outcomes keep receive order.
    pub max_in_flight: usize,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            max_messages: MAX_BATCH_SIZE,
            wait_seconds: 20,
            visibility_timeout_seconds: 30,
            receive_grace_seconds: 5,
            delete_timeout_seconds: 10,
            max_in_flight: 1,
        }
    }
}

impl DrainConfig {
    pub fn receive_request(&self) -> ReceiveRequest {
        ReceiveRequest {
            max_messages: self.max_messages,
            wait: Duration::from_secs(self.wait_seconds),
            visibility_timeout: Duration::from_secs(self.visibility_timeout_seconds),
        }
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_seconds.saturating_add(self.receive_grace_seconds))
    }

    pub fn delete_timeout(&self) -> Duration {
        Duration::from_secs(self.delete_timeout_seconds)
    }
}

/// Per-message processing parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Where fetched blobs are written.
    pub scratch_dir: PathBuf,
    /// Remove fetched files once a message is processed. Default `true`.
    pub auto_cleanup: bool,
    pub fetch_timeout_seconds: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir(),
            auto_cleanup: true,
            fetch_timeout_seconds: 60,
        }
    }
}

impl ProcessorConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}

/// Keys the resolver looks for in a message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Key holding a single reference object.
    pub singular_key: String,
    /// Key holding an array of reference objects.
    pub plural_key: String,
    pub locator_field: String,
    pub key_field: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            singular_key: "s3".to_string(),
            plural_key: "files".to_string(),
            locator_field: "bucket".to_string(),
            key_field: "key".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    pub drain: DrainConfig,
    pub processor: ProcessorConfig,
    pub resolver: ResolverConfig,
}

impl ConsumerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_BATCH_SIZE).contains(&self.drain.max_messages) {
            return Err(ConfigError::Invalid {
                field: "drain.max_messages",
                reason: format!("must be between 1 and {MAX_BATCH_SIZE}"),
            });
        }
        if self.drain.wait_seconds > MAX_WAIT_SECONDS {
            return Err(ConfigError::Invalid {
                field: "drain.wait_seconds",
                reason: format!("must be at most {MAX_WAIT_SECONDS}"),
            });
        }
        if self.drain.visibility_timeout_seconds > MAX_VISIBILITY_TIMEOUT_SECONDS {
            return Err(ConfigError::Invalid {
                field: "drain.visibility_timeout_seconds",
                reason: format!("must be at most {MAX_VISIBILITY_TIMEOUT_SECONDS}"),
            });
        }
        if self.drain.max_in_flight == 0 {
            return Err(ConfigError::Invalid {
                field: "drain.max_in_flight",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.processor.fetch_timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "processor.fetch_timeout_seconds",
                reason: "must be at least 1".to_string(),
            });
        }
        let resolver = &self.resolver;
        for (field, value) in [
            ("resolver.singular_key", &resolver.singular_key),
            ("resolver.plural_key", &resolver.plural_key),
            ("resolver.locator_field", &resolver.locator_field),
            ("resolver.key_field", &resolver.key_field),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ConsumerConfig::default();
        assert_eq!(config.drain.max_messages, 10);
        assert_eq!(config.drain.wait_seconds, 20);
        assert_eq!(config.drain.visibility_timeout_seconds, 30);
        assert!(config.processor.auto_cleanup);
        assert_eq!(config.resolver.singular_key, "s3");
        assert_eq!(config.resolver.plural_key, "files");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ConsumerConfig::from_json_str(
            r#"{"drain": {"max_messages": 5}, "processor": {"auto_cleanup": false}}"#,
        )
        .unwrap();
        assert_eq!(config.drain.max_messages, 5);
        assert_eq!(config.drain.wait_seconds, 20);
        assert!(!config.processor.auto_cleanup);
        assert_eq!(config.processor.fetch_timeout_seconds, 60);
    }

    #[test]
    fn rejects_out_of_range_batch_size() {
        let err = ConsumerConfig::from_json_str(r#"{"drain": {"max_messages": 11}}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "drain.max_messages", .. }
        ));
    }

    #[test]
    fn rejects_empty_resolver_key() {
        let err =
            ConsumerConfig::from_json_str(r#"{"resolver": {"plural_key": ""}}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "resolver.plural_key", .. }
        ));
    }

    #[test]
    fn rejects_wait_beyond_long_poll_ceiling() {
        let err = ConsumerConfig::from_json_str(
            r#"{"drain": {"wait_seconds": 18446744073709551615}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "drain.wait_seconds", .. }
        ));

        let err = ConsumerConfig::from_json_str(r#"{"drain": {"wait_seconds": 21}}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "drain.wait_seconds", .. }
        ));
        assert!(ConsumerConfig::from_json_str(r#"{"drain": {"wait_seconds": 20}}"#).is_ok());
    }

    #[test]
    fn rejects_oversized_visibility_timeout() {
        let err = ConsumerConfig::from_json_str(
            r#"{"drain": {"visibility_timeout_seconds": 18446744073709551615}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "drain.visibility_timeout_seconds", .. }
        ));
    }

    #[test]
    fn receive_timeout_saturates_on_huge_grace() {
        let drain = DrainConfig {
            wait_seconds: 20,
            receive_grace_seconds: u64::MAX,
            ..DrainConfig::default()
        };
        assert_eq!(drain.receive_timeout(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn receive_timeout_includes_grace() {
        let drain = DrainConfig {
            wait_seconds: 20,
            receive_grace_seconds: 5,
            ..DrainConfig::default()
        };
        assert_eq!(drain.receive_timeout(), Duration::from_secs(25));
    }
}
