//! Version-tagged store identifiers.

use std::fmt;

/// Name of the store owned by one worker version: `"<namespace>-<version>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheName {
    namespace: String,
    version: String,
    name: String,
}

impl CacheName {
    pub fn new(namespace: impl Into<String>, version: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let version = version.into();
        let name = format!("{namespace}-{version}");
        Self { namespace, version, name }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether `other` names a store this version no longer owns.
    pub fn is_stale(&self, other: &str) -> bool {
        other != self.name
    }
}

impl fmt::Display for CacheName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for CacheName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}
