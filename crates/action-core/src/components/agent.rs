//! Agent Components
//!
//! Components for individual agents: network identity, aim and movement.

use action_events::NetId;
use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Whether this peer owns the canonical state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetRole {
    /// This peer's state is canonical for the agent
    Authority,
    /// This peer mirrors the agent from the authority
    Observer,
}

/// Network identity and role of an agent on this peer.
///
/// The role is set by the hosting environment when the agent is spawned;
/// nothing in the action core toggles it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentNet {
    pub id: NetId,
    pub role: NetRole,
}

impl AgentNet {
    pub fn authority(id: NetId) -> Self {
        Self {
            id,
            role: NetRole::Authority,
        }
    }

    pub fn observer(id: NetId) -> Self {
        Self {
            id,
            role: NetRole::Observer,
        }
    }

    pub fn is_authority(&self) -> bool {
        self.role == NetRole::Authority
    }
}

/// Aim data used by ranged actions.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct AimRig {
    /// Eye position the aim probe starts from
    pub view_origin: Vec3,
    /// Direction the agent is looking (need not be normalized)
    pub view_direction: Vec3,
    /// Emission point projectiles leave from
    pub muzzle: Vec3,
}

impl AimRig {
    /// Rig at `position` looking along `direction`, with the muzzle offset
    /// slightly forward and to the right of the eye.
    pub fn looking(position: Vec3, direction: Vec3) -> Self {
        let forward = direction.normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        Self {
            view_origin: position + Vec3::Y * 60.0,
            view_direction: forward,
            muzzle: position + Vec3::Y * 40.0 + forward * 30.0 + right * 20.0,
        }
    }
}

impl Default for AimRig {
    fn default() -> Self {
        Self::looking(Vec3::ZERO, Vec3::Z)
    }
}

/// Movement speed, with bonuses granted by running actions.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct MoveSpeed {
    pub base: f32,
    pub bonus: f32,
}

impl MoveSpeed {
    pub fn new(base: f32) -> Self {
        Self { base, bonus: 0.0 }
    }

    pub fn current(&self) -> f32 {
        (self.base + self.bonus).max(0.0)
    }
}

impl Default for MoveSpeed {
    fn default() -> Self {
        Self::new(600.0)
    }
}
