//! Timer System
//!
//! Advances the peer's scheduler by one tick and hands every continuation
//! that came due back to its action.

use bevy_ecs::prelude::*;

use crate::api;
use crate::components::world::WorldClock;
use crate::services::ActionServices;

pub fn advance_timers(world: &mut World) {
    let delta = world
        .get_resource::<WorldClock>()
        .map_or(0.0, |clock| clock.tick_seconds);
    let due = match world.get_resource_mut::<ActionServices>() {
        Some(mut services) => services.scheduler.advance(delta),
        None => return,
    };

    for continuation in due {
        if world.get_entity(continuation.agent).is_none() {
            tracing::debug!(action_id = %continuation.action_id, "timer for despawned agent dropped");
            continue;
        }
        api::with_registry(world, continuation.agent, |registry, ctx| {
            registry.fire_timer(ctx, continuation)
        });
    }
}
