//! Replication Systems
//!
//! Authority -> observer state path. The authority turns each registry's
//! pending changes into a versioned delta, or ships the whole collection as
//! a snapshot when one is due. Observers apply messages newer than what they
//! already hold.

use action_events::{ReplicationMessage, ReplicationPayload};
use bevy_ecs::prelude::*;

use crate::api;
use crate::components::agent::AgentNet;
use crate::components::world::WorldClock;
use crate::config::ReplicationConfig;
use crate::registry::ActionRegistry;

/// Resource: when the authority ships full snapshots
#[derive(Resource, Debug, Clone)]
pub struct ReplicationSettings {
    /// Ticks between periodic snapshots; 0 disables them
    pub snapshot_interval_ticks: u64,
    /// Ship snapshots for every agent on the next collection pass
    pub force_snapshot: bool,
}

impl ReplicationSettings {
    pub fn new(snapshot_interval_ticks: u64) -> Self {
        Self {
            snapshot_interval_ticks,
            force_snapshot: false,
        }
    }

    pub fn from_config(config: &ReplicationConfig) -> Self {
        Self::new(config.snapshot_interval_ticks)
    }

    pub fn snapshot_due(&self, tick: u64) -> bool {
        self.force_snapshot
            || (self.snapshot_interval_ticks > 0 && tick % self.snapshot_interval_ticks == 0)
    }
}

impl Default for ReplicationSettings {
    fn default() -> Self {
        Self::from_config(&ReplicationConfig::default())
    }
}

/// Resource: messages produced by the authority, waiting for the link
#[derive(Resource, Debug, Default)]
pub struct ReplicationOutbox {
    messages: Vec<ReplicationMessage>,
}

impl ReplicationOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ReplicationMessage) {
        self.messages.push(message);
    }

    pub fn drain(&mut self) -> Vec<ReplicationMessage> {
        std::mem::take(&mut self.messages)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Resource: messages received from the authority
#[derive(Resource, Debug, Default)]
pub struct ReplicationInbox {
    messages: Vec<ReplicationMessage>,
}

impl ReplicationInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ReplicationMessage) {
        self.messages.push(message);
    }

    pub fn drain(&mut self) -> Vec<ReplicationMessage> {
        std::mem::take(&mut self.messages)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Collects one message per changed authority agent.
pub fn collect_replication(
    clock: Res<WorldClock>,
    mut settings: ResMut<ReplicationSettings>,
    mut outbox: ResMut<ReplicationOutbox>,
    mut agents: Query<(&AgentNet, &mut ActionRegistry)>,
) {
    let tick = clock.current_tick;
    let snapshot_due = settings.snapshot_due(tick);
    if settings.force_snapshot {
        settings.force_snapshot = false;
    }

    let mut messages = Vec::new();
    for (net, mut registry) in agents.iter_mut() {
        if !net.is_authority() {
            continue;
        }

        let ops = registry.take_pending_ops();
        let payload = if snapshot_due {
            ReplicationPayload::Snapshot(registry.records())
        } else if !ops.is_empty() {
            ReplicationPayload::Delta(ops)
        } else {
            continue;
        };

        messages.push(ReplicationMessage {
            agent: net.id,
            version: registry.bump_version(),
            tick,
            payload,
        });
    }

    // Query order follows archetype layout; ship in a stable order
    messages.sort_by_key(|message| message.agent);
    for message in messages {
        outbox.push(message);
    }
}

/// Applies received messages to observer registries.
pub fn apply_replication(world: &mut World) {
    let messages = match world.get_resource_mut::<ReplicationInbox>() {
        Some(mut inbox) => inbox.drain(),
        None => return,
    };

    for message in messages {
        let Some(agent) = api::find_agent(world, message.agent) else {
            tracing::debug!(agent = %message.agent, "replication for unknown agent dropped");
            continue;
        };
        let Some(net) = world.get::<AgentNet>(agent).copied() else {
            continue;
        };
        if net.is_authority() {
            tracing::warn!(agent = %message.agent, "refusing to mirror onto an authority agent");
            continue;
        }

        let applied = api::registry(world, agent).map_or(0, ActionRegistry::version);
        if message.version <= applied {
            tracing::debug!(
                agent = %message.agent,
                version = message.version,
                applied,
                "stale or duplicate replication skipped"
            );
            continue;
        }
        if !message.is_snapshot() && message.version != applied + 1 {
            tracing::warn!(
                agent = %message.agent,
                version = message.version,
                applied,
                "replication gap, applying delta until the next snapshot"
            );
        }

        api::with_registry(world, agent, |registry, ctx| {
            match &message.payload {
                ReplicationPayload::Delta(ops) => registry.apply_delta(ctx, ops),
                ReplicationPayload::Snapshot(records) => registry.apply_snapshot(ctx, records),
            }
            registry.set_version(message.version);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_due() {
        let mut settings = ReplicationSettings::new(50);
        assert!(settings.snapshot_due(50));
        assert!(settings.snapshot_due(100));
        assert!(!settings.snapshot_due(51));

        settings.force_snapshot = true;
        assert!(settings.snapshot_due(51));
    }

    #[test]
    fn test_zero_interval_disables_periodic() {
        let settings = ReplicationSettings::new(0);
        assert!(!settings.snapshot_due(0));
        assert!(!settings.snapshot_due(100));
    }
}
