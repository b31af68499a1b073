//! Error Types
//!
//! Failures of the action core. None of these propagate out of the public
//! registry operations: they are either returned from fallible internals
//! (the catalog) or reported through [`crate::services::Diagnostics`].

use action_events::{ActionId, ActionKind, NetId};

/// Errors from building or looking up actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("action kind is empty")]
    EmptyKind,

    #[error("action kind '{0}' is not registered")]
    UnknownKind(ActionKind),

    #[error("no action {0} on this agent")]
    UnknownAction(ActionId),

    #[error("action {0} is still running")]
    StillRunning(ActionId),
}

/// Programming errors caught at the registry/action boundary.
///
/// Reported loudly, then the offending call degrades to a no-op.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("{agent}: failed to spawn action: {source}")]
    SpawnFailed {
        agent: NetId,
        #[source]
        source: ActionError,
    },

    #[error("{agent}: auto-start action '{name}' failed its precondition")]
    AutoStartRejected { agent: NetId, name: String },

    #[error("{agent}: start called on already running action '{name}'")]
    AlreadyRunning { agent: NetId, name: String },

    #[error("{agent}: cannot remove action: {source}")]
    RemoveRejected {
        agent: NetId,
        #[source]
        source: ActionError,
    },
}
