//! ECS Systems
//!
//! Per-tick systems for relay processing, replication and timers.

pub mod relay;
pub mod replication;
pub mod timers;

pub use relay::{process_relay_requests, RelayInbox, RelayOutbox};
pub use replication::{
    apply_replication, collect_replication, ReplicationInbox, ReplicationOutbox,
    ReplicationSettings,
};
pub use timers::advance_timers;
