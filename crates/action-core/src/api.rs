//! Agent API
//!
//! Entry points that operate on one agent's registry inside a peer's world.
//! Each call builds an [`ActionContext`] from the agent's components and the
//! peer's [`ActionServices`], runs the registry operation, then applies the
//! buffered side effects to the world.

use action_events::{ActionId, ActionKind, NetId};
use bevy_ecs::prelude::*;

use crate::actions::{ActionContext, ActionEffects, ActionInstance, OwnerInfo};
use crate::components::agent::{AgentNet, AimRig, MoveSpeed};
use crate::components::world::{AgentIndex, WorldClock};
use crate::registry::ActionRegistry;
use crate::services::ActionServices;

/// Snapshot of the agent components an action context needs.
pub fn owner_info(world: &World, agent: Entity) -> Option<OwnerInfo> {
    let entity = world.get_entity(agent)?;
    let net = *entity.get::<AgentNet>()?;
    Some(OwnerInfo {
        entity: agent,
        net,
        aim: entity.get::<AimRig>().copied(),
    })
}

/// Runs `f` against `agent`'s registry with a fresh context.
///
/// Returns `None` if the agent has no registry or the peer has no
/// [`ActionServices`].
pub fn with_registry<R>(
    world: &mut World,
    agent: Entity,
    f: impl FnOnce(&mut ActionRegistry, &mut ActionContext<'_>) -> R,
) -> Option<R> {
    let owner = owner_info(world, agent)?;
    if !world.contains_resource::<ActionServices>() {
        tracing::warn!(agent = %owner.id(), "no action services on this peer");
        return None;
    }
    let tick = world
        .get_resource::<WorldClock>()
        .map(|clock| clock.current_tick)
        .unwrap_or(0);

    let mut effects = ActionEffects::new();
    let result = world.resource_scope(|world, mut services: Mut<ActionServices>| {
        let mut registry = world.get_mut::<ActionRegistry>(agent)?;
        let mut ctx = ActionContext::new(owner, tick, &mut services, &mut effects);
        Some(f(&mut registry, &mut ctx))
    });
    effects.apply(world, &owner, tick);
    result
}

/// Spawns an agent with an empty registry.
///
/// On the authority, `defaults` are added in order (auto-start actions
/// start immediately). Observers receive their actions through replication.
pub fn spawn_agent(
    world: &mut World,
    net: AgentNet,
    aim: Option<AimRig>,
    speed: MoveSpeed,
    defaults: &[ActionKind],
) -> Entity {
    let mut entity = world.spawn((net, speed, ActionRegistry::new()));
    if let Some(aim) = aim {
        entity.insert(aim);
    }
    let agent = entity.id();

    world.get_resource_or_insert_with(AgentIndex::new).insert(net.id, agent);
    tracing::debug!(agent = %net.id, role = ?net.role, "agent spawned");

    if net.is_authority() {
        for kind in defaults {
            add_action(world, agent, net.id, kind.clone());
        }
    }
    agent
}

/// Despawns an agent after force-stopping its running actions and
/// cancelling its pending timers. Returns the number of actions stopped.
pub fn destroy_agent(world: &mut World, agent: Entity) -> usize {
    let Some(owner) = owner_info(world, agent) else {
        return 0;
    };

    let stopped = with_registry(world, agent, |registry, ctx| registry.teardown(ctx)).unwrap_or(0);
    if let Some(mut services) = world.get_resource_mut::<ActionServices>() {
        let cancelled = services.scheduler.cancel_agent(agent);
        if cancelled > 0 {
            tracing::debug!(agent = %owner.id(), cancelled, "pending timers cancelled");
        }
    }
    if let Some(mut index) = world.get_resource_mut::<AgentIndex>() {
        index.remove(owner.id());
    }
    world.despawn(agent);

    tracing::debug!(agent = %owner.id(), stopped, "agent destroyed");
    stopped
}

/// Looks up an agent by network id.
pub fn find_agent(world: &World, id: NetId) -> Option<Entity> {
    world.get_resource::<AgentIndex>()?.get(id)
}

pub fn registry(world: &World, agent: Entity) -> Option<&ActionRegistry> {
    world.get::<ActionRegistry>(agent)
}

/// Adds an action of `kind` to `agent`. Authority only.
pub fn add_action(
    world: &mut World,
    agent: Entity,
    instigator: NetId,
    kind: impl Into<ActionKind>,
) -> Option<ActionId> {
    let kind = kind.into();
    with_registry(world, agent, |registry, ctx| registry.add_action(ctx, instigator, &kind)).flatten()
}

pub fn start_action_by_name(world: &mut World, agent: Entity, instigator: NetId, name: &str) -> bool {
    with_registry(world, agent, |registry, ctx| {
        registry.start_action_by_name(ctx, instigator, name)
    })
    .unwrap_or(false)
}

pub fn stop_action_by_name(world: &mut World, agent: Entity, instigator: NetId, name: &str) -> bool {
    with_registry(world, agent, |registry, ctx| {
        registry.stop_action_by_name(ctx, instigator, name)
    })
    .unwrap_or(false)
}

/// Retires an idle action. Authority only.
pub fn remove_action(world: &mut World, agent: Entity, action_id: ActionId) -> bool {
    with_registry(world, agent, |registry, ctx| registry.remove_action(ctx, action_id)).unwrap_or(false)
}

/// First action of `kind` on `agent`.
pub fn get_action<'w>(world: &'w World, agent: Entity, kind: &ActionKind) -> Option<&'w ActionInstance> {
    registry(world, agent)?.get_action(kind)
}
