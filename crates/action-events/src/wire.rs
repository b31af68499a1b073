//! Wire Messages
//!
//! Messages exchanged between the authority and observers: replication
//! traffic flows host to observers, relay requests flow observers to host.

use serde::{Deserialize, Serialize};

use crate::ids::{ActionId, ActionKind, NetId};

/// One change to an agent's action collection on the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReplicationOp {
    /// A new action was appended to the collection
    Added { action_id: ActionId, kind: ActionKind },
    /// An action was retired from the collection
    Removed { action_id: ActionId },
    /// An action's running flag changed
    Running {
        action_id: ActionId,
        running: bool,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        instigator: Option<NetId>,
    },
}

impl ReplicationOp {
    /// The action this op refers to.
    pub fn action_id(&self) -> ActionId {
        match self {
            ReplicationOp::Added { action_id, .. }
            | ReplicationOp::Removed { action_id }
            | ReplicationOp::Running { action_id, .. } => *action_id,
        }
    }
}

/// Full replicated state of one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action_id: ActionId,
    pub kind: ActionKind,
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub instigator: Option<NetId>,
}

/// Body of a replication message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ReplicationPayload {
    /// Ordered changes since the previous version
    Delta(Vec<ReplicationOp>),
    /// The complete collection, in insertion order
    Snapshot(Vec<ActionRecord>),
}

/// Versioned replication update for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationMessage {
    pub agent: NetId,
    /// Monotonic per-agent version; observers skip anything not newer
    pub version: u64,
    /// Authority tick that produced this message
    pub tick: u64,
    pub payload: ReplicationPayload,
}

impl ReplicationMessage {
    pub fn is_snapshot(&self) -> bool {
        matches!(self.payload, ReplicationPayload::Snapshot(_))
    }
}

/// What a relayed request asks the authority to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayCommand {
    Start,
    Stop,
}

/// Start/stop request forwarded from an observer to the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRequest {
    /// Agent whose registry should act
    pub agent: NetId,
    pub instigator: NetId,
    pub command: RelayCommand,
    pub action_name: String,
}

impl RelayRequest {
    pub fn start(agent: NetId, instigator: NetId, action_name: impl Into<String>) -> Self {
        Self {
            agent,
            instigator,
            command: RelayCommand::Start,
            action_name: action_name.into(),
        }
    }

    pub fn stop(agent: NetId, instigator: NetId, action_name: impl Into<String>) -> Self {
        Self {
            agent,
            instigator,
            command: RelayCommand::Stop,
            action_name: action_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_action_id() {
        let op = ReplicationOp::Running {
            action_id: ActionId(4),
            running: true,
            instigator: None,
        };
        assert_eq!(op.action_id(), ActionId(4));
    }

    #[test]
    fn test_delta_wire_format() {
        let msg = ReplicationMessage {
            agent: NetId(1),
            version: 2,
            tick: 10,
            payload: ReplicationPayload::Delta(vec![ReplicationOp::Added {
                action_id: ActionId(0),
                kind: ActionKind::new("dash"),
            }]),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["payload"]["type"], "delta");
        assert_eq!(json["payload"]["data"][0]["op"], "added");
        assert_eq!(json["payload"]["data"][0]["kind"], "dash");
        assert!(!msg.is_snapshot());
    }

    #[test]
    fn test_running_op_omits_missing_instigator() {
        let op = ReplicationOp::Running {
            action_id: ActionId(1),
            running: false,
            instigator: None,
        };
        let json = serde_json::to_string(&op).unwrap();
        assert!(!json.contains("instigator"));
        let parsed: ReplicationOp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, op);
    }

    #[test]
    fn test_relay_constructors() {
        let req = RelayRequest::stop(NetId(2), NetId(2), "Sprint");
        assert_eq!(req.command, RelayCommand::Stop);
        assert_eq!(req.action_name, "Sprint");
    }
}
