//! Networked action system: per-agent action registries with an
//! authority/observer split, relay forwarding and versioned replication.

pub mod actions;
pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod net;
pub mod registry;
pub mod services;
pub mod setup;
pub mod systems;

pub use actions::{
    ActionBehavior, ActionCatalog, ActionContext, ActionInstance, ProjectileAttack, Sprint,
    TimerOutcome,
};
pub use components::*;
pub use config::SimConfig;
pub use error::{ActionError, InvariantViolation};
pub use events::{ActionEvents, EventLogger};
pub use net::{Link, LoopbackLink, Peer, PeerRole, Session};
pub use registry::ActionRegistry;
pub use services::ActionServices;
