use serde::{Deserialize, Serialize};
use std::fmt;

/// The resource a credential request is made for, e.g. `s3://bucket/key`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceTarget {
    locator: String,
}

impl ResourceTarget {
    /// Wrap a locator string
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
        }
    }

    /// The locator as given
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Whether the locator falls under `prefix`
    ///
    /// An absent or empty prefix matches every target.
    pub fn is_within(&self, prefix: Option<&str>) -> bool {
        match prefix {
            Some(prefix) if !prefix.is_empty() => self.locator.starts_with(prefix),
            _ => true,
        }
    }
}

impl fmt::Display for ResourceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.locator)
    }
}

impl From<&str> for ResourceTarget {
    fn from(locator: &str) -> Self {
        Self::new(locator)
    }
}

impl From<String> for ResourceTarget {
    fn from(locator: String) -> Self {
        Self::new(locator)
    }
}
