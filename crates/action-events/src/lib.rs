//! Shared identifiers, wire messages and lifecycle events for networked actions.
//!
//! This crate contains pure data structures with no simulation logic.
//! Every peer (host and observers) depends on it so that the messages it
//! exchanges and the events it logs have one definition.

pub mod event;
pub mod ids;
pub mod wire;

// Re-export identifier types
pub use ids::{ActionId, ActionKind, NetId, PeerId};

// Re-export wire types
pub use wire::{
    ActionRecord, RelayCommand, RelayRequest, ReplicationMessage, ReplicationOp,
    ReplicationPayload,
};

// Re-export event types
pub use event::{ActionEvent, ActionEventKind, ProjectileSpawn};
