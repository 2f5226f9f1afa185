use serde::{Deserialize, Serialize};
use std::fmt;

/// Pointer to an externally stored object (bucket/container + key + version).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobReference {
    store_locator: String,
    object_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version_marker: Option<String>,
}

impl BlobReference {
    pub fn new(store_locator: impl Into<String>, object_key: impl Into<String>) -> Self {
        Self {
            store_locator: store_locator.into(),
            object_key: object_key.into(),
            version_marker: None,
        }
    }

    pub fn with_version(mut self, version_marker: impl Into<String>) -> Self {
        self.version_marker = Some(version_marker.into());
        self
    }

    pub fn store_locator(&self) -> &str {
        &self.store_locator
    }

    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    pub fn version_marker(&self) -> Option<&str> {
        self.version_marker.as_deref()
    }

    /// Last path segment of the object key, used to name local copies.
    pub fn base_name(&self) -> &str {
        self.object_key
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or("blob")
    }
}

impl fmt::Display for BlobReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.store_locator, self.object_key)?;
        if let Some(v) = &self.version_marker {
            write!(f, "@{v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_includes_version() {
        let a = BlobReference::new("b", "k");
        let b = BlobReference::new("b", "k").with_version("v1");
        assert_ne!(a, b);
        assert_eq!(b, BlobReference::new("b", "k").with_version("v1"));
    }

    #[test]
    fn base_name_ignores_prefixes_and_trailing_slash() {
        assert_eq!(BlobReference::new("b", "in/2024/p.json").base_name(), "p.json");
        assert_eq!(BlobReference::new("b", "dir/").base_name(), "dir");
        assert_eq!(BlobReference::new("b", "").base_name(), "blob");
    }

    #[test]
    fn display_shows_version_when_present() {
        let r = BlobReference::new("b", "k").with_version("3");
        assert_eq!(r.to_string(), "b/k@3");
    }
}
