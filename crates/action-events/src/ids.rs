//! Identifier Types
//!
//! Stable identifiers shared by every peer of a session.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Network identity of an agent, identical on every peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetId(pub u64);

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent_{:04}", self.0)
    }
}

/// Per-agent action identifier.
///
/// Assigned by the authority when the action is added and never reused for
/// the lifetime of the owning registry. Observers mirror the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub u32);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "act_{:03}", self.0)
    }
}

/// Catalog key naming the concrete behavior an action is built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionKind(pub String);

impl ActionKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty kind can never be spawned.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

/// Identity of one participant (one simulation world) in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub Uuid);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = self.0.simple().to_string();
        write!(f, "peer_{}", &simple[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(NetId(7).to_string(), "agent_0007");
        assert_eq!(ActionId(12).to_string(), "act_012");
        assert_eq!(ActionKind::new("sprint").to_string(), "sprint");
    }

    #[test]
    fn test_empty_kind() {
        assert!(ActionKind::new("").is_empty());
        assert!(ActionKind::new("   ").is_empty());
        assert!(!ActionKind::from("dash").is_empty());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&NetId(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&ActionKind::from("dash")).unwrap(), "\"dash\"");
    }

    #[test]
    fn test_peer_ids_unique() {
        let a = PeerId::new();
        let b = PeerId::new();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("peer_"));
    }
}
