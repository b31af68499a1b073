//! Demo Setup
//!
//! The scripted scene the `action_sim` binary runs: a player carrying every
//! built-in action, a training dummy that only sprints, and the dummy's
//! collision sphere for the player's aim probe to hit.

use action_events::{ActionKind, NetId};
use glam::Vec3;

use crate::components::agent::{AimRig, MoveSpeed};
use crate::net::Session;
use crate::services::{ObstacleField, SphereObstacle};

pub const PLAYER: NetId = NetId(1);
pub const DUMMY: NetId = NetId(2);

const DUMMY_POSITION: Vec3 = Vec3::new(0.0, 0.0, 1500.0);
const DUMMY_RADIUS: f32 = 50.0;

pub fn player_defaults() -> Vec<ActionKind> {
    ["primary_attack", "black_hole", "dash", "sprint"]
        .into_iter()
        .map(ActionKind::new)
        .collect()
}

pub fn dummy_defaults() -> Vec<ActionKind> {
    vec![ActionKind::new("sprint")]
}

/// World geometry for the host's aim probes.
pub fn demo_obstacles() -> ObstacleField {
    let mut field = ObstacleField::new();
    field.add(SphereObstacle {
        center: DUMMY_POSITION + Vec3::Y * 60.0,
        radius: DUMMY_RADIUS,
        owner: Some(DUMMY),
    });
    field
}

/// Spawns the player and the dummy on every peer of `session`.
pub fn spawn_demo_agents(session: &mut Session) {
    session.host_mut().set_spatial(demo_obstacles());
    session.spawn_agent(
        PLAYER,
        Some(AimRig::looking(Vec3::ZERO, Vec3::Z)),
        MoveSpeed::default(),
        &player_defaults(),
    );
    session.spawn_agent(
        DUMMY,
        Some(AimRig::looking(DUMMY_POSITION, -Vec3::Z)),
        MoveSpeed::new(300.0),
        &dummy_defaults(),
    );
}
