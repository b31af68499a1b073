//! World Resources
//!
//! Per-peer resources: simulation clock, agent lookup, and the queues that
//! hand gameplay effects to the (external) presentation and gameplay layers.

use action_events::{NetId, ProjectileSpawn};
use bevy_ecs::prelude::*;
use std::collections::HashMap;

/// Simulation clock for one peer.
#[derive(Resource, Debug, Clone)]
pub struct WorldClock {
    pub current_tick: u64,
    /// Simulated seconds per tick
    pub tick_seconds: f32,
}

impl WorldClock {
    pub fn new(tick_seconds: f32) -> Self {
        Self {
            current_tick: 0,
            tick_seconds,
        }
    }

    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
    }

    /// Simulated seconds elapsed since tick 0.
    pub fn elapsed_seconds(&self) -> f64 {
        self.current_tick as f64 * self.tick_seconds as f64
    }
}

impl Default for WorldClock {
    fn default() -> Self {
        Self::new(0.05)
    }
}

/// Maps network ids to local entities.
#[derive(Resource, Debug, Default)]
pub struct AgentIndex {
    entities: HashMap<NetId, Entity>,
}

impl AgentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: NetId, entity: Entity) {
        self.entities.insert(id, entity);
    }

    pub fn remove(&mut self, id: NetId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: NetId) -> Option<Entity> {
        self.entities.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// A presentation cue (animation, particles, sound) requested by an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub agent: NetId,
    pub cue: String,
}

/// Resource: cues waiting for the presentation layer
#[derive(Resource, Debug, Default)]
pub struct CueQueue {
    pub cues: Vec<Cue>,
}

impl CueQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cue: Cue) {
        self.cues.push(cue);
    }

    pub fn drain(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

/// Resource: projectiles waiting for the gameplay layer to spawn them
#[derive(Resource, Debug, Default)]
pub struct ProjectileQueue {
    pub spawns: Vec<ProjectileSpawn>,
}

impl ProjectileQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, spawn: ProjectileSpawn) {
        self.spawns.push(spawn);
    }

    pub fn drain(&mut self) -> Vec<ProjectileSpawn> {
        std::mem::take(&mut self.spawns)
    }

    pub fn len(&self) -> usize {
        self.spawns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spawns.is_empty()
    }
}
