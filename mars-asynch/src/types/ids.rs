use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-issued identifier of a submitted job
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessKey(pub String);

impl ProcessKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProcessKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for ProcessKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl std::borrow::Borrow<str> for ProcessKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}
