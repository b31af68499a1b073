//! Action Lifecycle Events
//!
//! Records of everything that happens to actions on one peer. Written to the
//! JSONL event log by the simulation binary.

use serde::{Deserialize, Serialize};

use crate::ids::{ActionId, NetId};
use crate::wire::RelayCommand;

/// A projectile requested by a ranged action's delayed continuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpawn {
    /// Projectile template name
    pub projectile: String,
    pub owner: NetId,
    pub instigator: NetId,
    /// Emission point (muzzle)
    pub origin: [f32; 3],
    /// Unit direction from the emission point toward the target point
    pub direction: [f32; 3],
    /// Point the projectile is aimed at
    pub target: [f32; 3],
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionEventKind {
    /// Authority appended an action to an agent
    Added,
    /// Action retired from an agent
    Removed,
    /// Action entered the running state
    Started,
    /// Action returned to idle
    Stopped,
    /// A start request found the action but its precondition failed
    StartRejected,
    /// Observer forwarded a request to the authority
    Forwarded { command: RelayCommand },
    /// Observer materialized an action mirrored from the authority
    Mirrored,
    /// Mutating call refused because this peer is not the authority
    AuthorityDenied,
    /// A ranged action spawned its projectile
    ProjectileSpawned { spawn: ProjectileSpawn },
}

/// One lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub event_id: String,
    pub tick: u64,
    pub agent: NetId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub action_id: Option<ActionId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub action_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub instigator: Option<NetId>,
    /// True when the event was caused by replication rather than a local request
    #[serde(default)]
    pub replicated: bool,
    pub kind: ActionEventKind,
}

impl ActionEvent {
    pub fn new(event_id: impl Into<String>, tick: u64, agent: NetId, kind: ActionEventKind) -> Self {
        Self {
            event_id: event_id.into(),
            tick,
            agent,
            action_id: None,
            action_name: None,
            instigator: None,
            replicated: false,
            kind,
        }
    }

    pub fn with_action(mut self, action_id: ActionId, name: impl Into<String>) -> Self {
        self.action_id = Some(action_id);
        self.action_name = Some(name.into());
        self
    }

    pub fn with_instigator(mut self, instigator: NetId) -> Self {
        self.instigator = Some(instigator);
        self
    }

    pub fn replicated(mut self) -> Self {
        self.replicated = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = ActionEvent::new("aev_00000001", 5, NetId(1), ActionEventKind::Started)
            .with_action(ActionId(0), "Sprint")
            .with_instigator(NetId(1));

        assert_eq!(event.action_name.as_deref(), Some("Sprint"));
        assert_eq!(event.instigator, Some(NetId(1)));
        assert!(!event.replicated);
    }

    #[test]
    fn test_event_json_shape() {
        let event = ActionEvent::new(
            "aev_00000002",
            9,
            NetId(2),
            ActionEventKind::Forwarded {
                command: RelayCommand::Start,
            },
        )
        .replicated();

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"]["type"], "forwarded");
        assert_eq!(json["kind"]["command"], "start");
        assert_eq!(json["replicated"], true);
        assert!(json.get("action_id").is_none());

        let parsed: ActionEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
    }
}
