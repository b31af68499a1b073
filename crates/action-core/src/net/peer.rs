//! Peer
//!
//! One simulation participant: an ECS world with its own services, queues
//! and tick schedule.

use action_events::{
    ActionEvent, ActionId, ActionKind, NetId, PeerId, ProjectileSpawn, RelayRequest,
    ReplicationMessage,
};
use bevy_ecs::prelude::*;

use crate::actions::ActionCatalog;
use crate::api;
use crate::components::agent::{AgentNet, AimRig, MoveSpeed};
use crate::components::world::{AgentIndex, Cue, CueQueue, ProjectileQueue, WorldClock};
use crate::config::SimConfig;
use crate::error::InvariantViolation;
use crate::events::ActionEvents;
use crate::registry::ActionRegistry;
use crate::services::{ActionServices, Diagnostics, Notice, SpatialQuery};
use crate::systems::{
    advance_timers, apply_replication, collect_replication, process_relay_requests, RelayInbox,
    RelayOutbox, ReplicationInbox, ReplicationOutbox, ReplicationSettings,
};

/// Whether a peer hosts the authoritative state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    Host,
    Observer,
}

pub struct Peer {
    id: PeerId,
    role: PeerRole,
    world: World,
    schedule: Schedule,
}

impl Peer {
    pub fn new(role: PeerRole, config: &SimConfig, catalog: ActionCatalog) -> Self {
        let mut world = World::new();

        world.insert_resource(WorldClock::new(config.simulation.tick_seconds));
        world.insert_resource(AgentIndex::new());
        world.insert_resource(ActionEvents::new());
        world.insert_resource(CueQueue::new());
        world.insert_resource(ProjectileQueue::new());
        world.insert_resource(RelayOutbox::new());
        world.insert_resource(RelayInbox::new());
        world.insert_resource(ReplicationSettings::from_config(&config.replication));
        world.insert_resource(ReplicationOutbox::new());
        world.insert_resource(ReplicationInbox::new());
        world.insert_resource(
            ActionServices::new(catalog)
                .with_diagnostics(Diagnostics::new(config.diagnostics.panic_on_invariant)),
        );

        // Relay first so forwarded requests run this tick, timers before
        // collection so continuation stops ship in the same message
        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                process_relay_requests,
                apply_replication,
                advance_timers,
                collect_replication,
            )
                .chain(),
        );

        Self {
            id: PeerId::new(),
            role,
            world,
            schedule,
        }
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn role(&self) -> PeerRole {
        self.role
    }

    pub fn is_host(&self) -> bool {
        self.role == PeerRole::Host
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn current_tick(&self) -> u64 {
        self.world.resource::<WorldClock>().current_tick
    }

    /// Replaces the world query service.
    pub fn set_spatial(&mut self, spatial: impl SpatialQuery + 'static) {
        self.world.resource_mut::<ActionServices>().spatial = Box::new(spatial);
    }

    /// Advances the clock and runs one tick of systems.
    pub fn tick(&mut self) {
        self.world.resource_mut::<WorldClock>().advance_tick();
        self.schedule.run(&mut self.world);
    }

    /// Spawns `id` with this peer's role for it. `defaults` only apply on the host.
    pub fn spawn_agent(
        &mut self,
        id: NetId,
        aim: Option<AimRig>,
        speed: MoveSpeed,
        defaults: &[ActionKind],
    ) -> Entity {
        let net = match self.role {
            PeerRole::Host => AgentNet::authority(id),
            PeerRole::Observer => AgentNet::observer(id),
        };
        api::spawn_agent(&mut self.world, net, aim, speed, defaults)
    }

    pub fn destroy_agent(&mut self, id: NetId) -> usize {
        match self.agent(id) {
            Some(agent) => api::destroy_agent(&mut self.world, agent),
            None => 0,
        }
    }

    pub fn agent(&self, id: NetId) -> Option<Entity> {
        api::find_agent(&self.world, id)
    }

    pub fn registry(&self, id: NetId) -> Option<&ActionRegistry> {
        api::registry(&self.world, self.agent(id)?)
    }

    pub fn speed(&self, id: NetId) -> Option<MoveSpeed> {
        self.world.get::<MoveSpeed>(self.agent(id)?).copied()
    }

    pub fn add_action(&mut self, id: NetId, instigator: NetId, kind: &str) -> Option<ActionId> {
        let agent = self.agent(id)?;
        api::add_action(&mut self.world, agent, instigator, kind)
    }

    pub fn start_action(&mut self, id: NetId, instigator: NetId, name: &str) -> bool {
        match self.agent(id) {
            Some(agent) => api::start_action_by_name(&mut self.world, agent, instigator, name),
            None => false,
        }
    }

    pub fn stop_action(&mut self, id: NetId, instigator: NetId, name: &str) -> bool {
        match self.agent(id) {
            Some(agent) => api::stop_action_by_name(&mut self.world, agent, instigator, name),
            None => false,
        }
    }

    pub fn remove_action(&mut self, id: NetId, action_id: ActionId) -> bool {
        match self.agent(id) {
            Some(agent) => api::remove_action(&mut self.world, agent, action_id),
            None => false,
        }
    }

    /// Ships full snapshots on the next tick.
    pub fn force_snapshot(&mut self) {
        self.world.resource_mut::<ReplicationSettings>().force_snapshot = true;
    }

    pub fn drain_relay(&mut self) -> Vec<RelayRequest> {
        self.world.resource_mut::<RelayOutbox>().drain()
    }

    pub fn deliver_relay(&mut self, request: RelayRequest) {
        self.world.resource_mut::<RelayInbox>().push(request);
    }

    pub fn drain_replication(&mut self) -> Vec<ReplicationMessage> {
        self.world.resource_mut::<ReplicationOutbox>().drain()
    }

    pub fn deliver_replication(&mut self, message: ReplicationMessage) {
        self.world.resource_mut::<ReplicationInbox>().push(message);
    }

    pub fn drain_events(&mut self) -> Vec<ActionEvent> {
        self.world.resource_mut::<ActionEvents>().drain()
    }

    pub fn drain_projectiles(&mut self) -> Vec<ProjectileSpawn> {
        self.world.resource_mut::<ProjectileQueue>().drain()
    }

    pub fn drain_cues(&mut self) -> Vec<Cue> {
        self.world.resource_mut::<CueQueue>().drain()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.world.resource::<ActionServices>().notifier.recent().to_vec()
    }

    pub fn violations(&self) -> &[InvariantViolation] {
        self.world.resource::<ActionServices>().diagnostics.violations()
    }
}
