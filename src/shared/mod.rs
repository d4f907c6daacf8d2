//! Shared newtypes and utilities used across all modules.
//!
//! Identifier newtypes are serialization-transparent: they serialize and
//! deserialize exactly like the raw strings the server sends.

pub mod case;
pub mod native;

pub use case::{camelize, underscorize};
pub use native::{Native, NativeMap};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

// ─── ProjectId ───────────────────────────────────────────────────────────────

/// Newtype for project identifiers (24-char hex object ids on the server).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Percent-encoded form for use as a URL path segment.
    pub fn path_segment(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl FromStr for ProjectId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ProjectId(s.to_string()))
    }
}

impl Serialize for ProjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(ProjectId(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_id_serde() {
        let id = ProjectId::from("5e1f0000aaaabbbbccccdddd");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"5e1f0000aaaabbbbccccdddd\"");
        let back: ProjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_project_id_path_segment_is_encoded() {
        let id = ProjectId::new("a b/c");
        assert_eq!(id.path_segment(), "a%20b%2Fc");
    }
}
