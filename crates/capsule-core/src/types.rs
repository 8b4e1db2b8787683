use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a capsule, as assigned by the persistence layer.
///
/// Opaque to this workspace: it only keys per-capsule session state
/// (attempt history, lock state).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapsuleId(String);

impl CapsuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapsuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CapsuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CapsuleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
