//! Relay System
//!
//! Observer -> authority request path. Observers queue forwarded start/stop
//! requests in their [`RelayOutbox`]; the host receives them in its
//! [`RelayInbox`] and re-runs them against the authoritative registry, which
//! re-validates every precondition.

use action_events::{RelayCommand, RelayRequest};
use bevy_ecs::prelude::*;

use crate::api;
use crate::components::agent::AgentNet;
use crate::components::world::AgentIndex;
use crate::systems::replication::ReplicationSettings;

/// Resource: requests forwarded by this peer, waiting for the link
#[derive(Resource, Debug, Default)]
pub struct RelayOutbox {
    requests: Vec<RelayRequest>,
}

impl RelayOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: RelayRequest) {
        self.requests.push(request);
    }

    pub fn drain(&mut self) -> Vec<RelayRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Resource: requests received from observers, processed next tick
#[derive(Resource, Debug, Default)]
pub struct RelayInbox {
    requests: Vec<RelayRequest>,
}

impl RelayInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: RelayRequest) {
        self.requests.push(request);
    }

    pub fn drain(&mut self) -> Vec<RelayRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Applies relayed requests to the authoritative registries.
///
/// A request the authority rejects leaves the requesting observer ahead of
/// the authority, so a snapshot is forced to bring it back in line.
pub fn process_relay_requests(world: &mut World) {
    let requests = match world.get_resource_mut::<RelayInbox>() {
        Some(mut inbox) => inbox.drain(),
        None => return,
    };

    for request in requests {
        let Some(agent) = api::find_agent(world, request.agent) else {
            tracing::debug!(agent = %request.agent, "relay request for unknown agent dropped");
            continue;
        };
        let is_authority = world
            .get::<AgentNet>(agent)
            .is_some_and(|net| net.is_authority());
        if !is_authority {
            tracing::warn!(agent = %request.agent, "relay request reached a non-authority peer");
            continue;
        }

        let accepted = match request.command {
            RelayCommand::Start => {
                api::start_action_by_name(world, agent, request.instigator, &request.action_name)
            }
            RelayCommand::Stop => {
                api::stop_action_by_name(world, agent, request.instigator, &request.action_name)
            }
        };

        if accepted {
            tracing::debug!(
                agent = %request.agent,
                command = ?request.command,
                action = %request.action_name,
                "relay request applied"
            );
        } else {
            tracing::info!(
                agent = %request.agent,
                command = ?request.command,
                action = %request.action_name,
                "relay request rejected by authority"
            );
            if let Some(mut settings) = world.get_resource_mut::<ReplicationSettings>() {
                settings.force_snapshot = true;
            }
        }
    }
}
