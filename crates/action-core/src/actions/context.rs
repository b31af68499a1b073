//! Action Context
//!
//! What an action sees while one of its hooks runs: its owner, the injected
//! services, and a buffer of side effects that is applied to the world once
//! the registry call returns.

use action_events::{ActionEvent, ActionEventKind, ActionId, NetId, ProjectileSpawn, RelayRequest};
use bevy_ecs::prelude::*;
use glam::Vec3;

use crate::actions::catalog::ActionCatalog;
use crate::components::agent::{AgentNet, AimRig, MoveSpeed};
use crate::components::world::{Cue, CueQueue, ProjectileQueue};
use crate::error::InvariantViolation;
use crate::events::ActionEvents;
use crate::services::{ActionServices, Continuation, Notice, SpatialQuery, TimerHandle};
use crate::systems::relay::RelayOutbox;

/// Snapshot of the agent that owns the registry being operated on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OwnerInfo {
    pub entity: Entity,
    pub net: AgentNet,
    pub aim: Option<AimRig>,
}

impl OwnerInfo {
    pub fn id(&self) -> NetId {
        self.net.id
    }

    pub fn is_authority(&self) -> bool {
        self.net.is_authority()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PendingEvent {
    kind: ActionEventKind,
    action: Option<(ActionId, String)>,
    instigator: Option<NetId>,
    replicated: bool,
}

/// Side effects collected during one registry call.
#[derive(Debug, Default)]
pub struct ActionEffects {
    events: Vec<PendingEvent>,
    relay: Vec<RelayRequest>,
    projectiles: Vec<ProjectileSpawn>,
    cues: Vec<Cue>,
    speed_bonus: f32,
}

impl ActionEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.relay.is_empty()
            && self.projectiles.is_empty()
            && self.cues.is_empty()
            && self.speed_bonus == 0.0
    }

    /// Applies the collected effects to the owner and the peer's queues.
    pub(crate) fn apply(self, world: &mut World, owner: &OwnerInfo, tick: u64) {
        if self.speed_bonus != 0.0 {
            if let Some(mut speed) = world.get_mut::<MoveSpeed>(owner.entity) {
                speed.bonus += self.speed_bonus;
            }
        }

        if !self.relay.is_empty() {
            match world.get_resource_mut::<RelayOutbox>() {
                Some(mut outbox) => {
                    for request in self.relay {
                        outbox.push(request);
                    }
                }
                None => tracing::debug!(
                    agent = %owner.id(),
                    count = self.relay.len(),
                    "no relay outbox on this peer, requests dropped"
                ),
            }
        }

        if !self.projectiles.is_empty() {
            if let Some(mut queue) = world.get_resource_mut::<ProjectileQueue>() {
                for spawn in self.projectiles {
                    queue.push(spawn);
                }
            }
        }

        if !self.cues.is_empty() {
            if let Some(mut queue) = world.get_resource_mut::<CueQueue>() {
                for cue in self.cues {
                    queue.push(cue);
                }
            }
        }

        if let Some(mut events) = world.get_resource_mut::<ActionEvents>() {
            for pending in self.events {
                let mut event = ActionEvent::new(events.generate_id(), tick, owner.id(), pending.kind);
                if let Some((id, name)) = pending.action {
                    event = event.with_action(id, name);
                }
                if let Some(instigator) = pending.instigator {
                    event = event.with_instigator(instigator);
                }
                if pending.replicated {
                    event = event.replicated();
                }
                events.push(event);
            }
        }
    }
}

#[derive(Debug, Clone)]
struct ActionScope {
    id: ActionId,
    name: String,
    instigator: NetId,
}

/// Context handed to registry operations and action hooks.
pub struct ActionContext<'a> {
    owner: OwnerInfo,
    tick: u64,
    services: &'a mut ActionServices,
    effects: &'a mut ActionEffects,
    scope: Option<ActionScope>,
    replicated: bool,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        owner: OwnerInfo,
        tick: u64,
        services: &'a mut ActionServices,
        effects: &'a mut ActionEffects,
    ) -> Self {
        Self {
            owner,
            tick,
            services,
            effects,
            scope: None,
            replicated: false,
        }
    }

    pub fn owner(&self) -> &OwnerInfo {
        &self.owner
    }

    pub fn is_authority(&self) -> bool {
        self.owner.is_authority()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn aim(&self) -> Option<AimRig> {
        self.owner.aim
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.services.catalog
    }

    pub fn spatial(&self) -> &dyn SpatialQuery {
        self.services.spatial.as_ref()
    }

    /// Schedules the current action's delayed continuation.
    ///
    /// Returns `None` outside an action hook.
    pub fn schedule_after(&mut self, delay_seconds: f32) -> Option<TimerHandle> {
        let scope = self.scope.as_ref()?;
        let continuation = Continuation {
            agent: self.owner.entity,
            action_id: scope.id,
            instigator: scope.instigator,
            handle: TimerHandle(0),
        };
        Some(self.services.scheduler.schedule_after(delay_seconds, continuation))
    }

    pub fn cancel_timer(&mut self, handle: TimerHandle) -> bool {
        self.services.scheduler.cancel(handle)
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.services.notifier.notify(Notice {
            agent: self.owner.id(),
            message: message.into(),
        });
    }

    pub fn play_cue(&mut self, cue: impl Into<String>) {
        self.effects.cues.push(Cue {
            agent: self.owner.id(),
            cue: cue.into(),
        });
    }

    pub fn add_speed_bonus(&mut self, delta: f32) {
        self.effects.speed_bonus += delta;
    }

    /// Queues a projectile for the gameplay layer.
    pub fn spawn_projectile(
        &mut self,
        projectile: impl Into<String>,
        instigator: NetId,
        origin: Vec3,
        target: Vec3,
    ) {
        let direction = (target - origin).normalize_or_zero();
        let spawn = ProjectileSpawn {
            projectile: projectile.into(),
            owner: self.owner.id(),
            instigator,
            origin: origin.to_array(),
            direction: direction.to_array(),
            target: target.to_array(),
        };
        self.effects.events.push(PendingEvent {
            kind: ActionEventKind::ProjectileSpawned {
                spawn: spawn.clone(),
            },
            action: self.scope.as_ref().map(|scope| (scope.id, scope.name.clone())),
            instigator: Some(instigator),
            replicated: false,
        });
        self.effects.projectiles.push(spawn);
    }

    pub fn report(&mut self, violation: InvariantViolation) {
        self.services.diagnostics.report(violation);
    }

    pub(crate) fn record(
        &mut self,
        kind: ActionEventKind,
        action: Option<(ActionId, &str)>,
        instigator: Option<NetId>,
    ) {
        self.effects.events.push(PendingEvent {
            kind,
            action: action.map(|(id, name)| (id, name.to_string())),
            instigator,
            replicated: self.replicated,
        });
    }

    pub(crate) fn forward(&mut self, request: RelayRequest) {
        self.effects.relay.push(request);
    }

    pub(crate) fn set_replicated(&mut self, replicated: bool) {
        self.replicated = replicated;
    }

    pub(crate) fn enter(&mut self, action_id: ActionId, name: &str, instigator: NetId) {
        self.scope = Some(ActionScope {
            id: action_id,
            name: name.to_string(),
            instigator,
        });
    }

    pub(crate) fn leave(&mut self) {
        self.scope = None;
    }
}
