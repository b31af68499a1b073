//! Action Catalog
//!
//! Maps action kinds to factories that build fresh behaviors. Every peer
//! holds its own catalog; observers use it to materialize replicated actions.

use std::collections::BTreeMap;
use std::sync::Arc;

use action_events::{ActionId, ActionKind};
use bevy_ecs::entity::Entity;

use super::projectile::{ProjectileAttack, ProjectileParams};
use super::sprint::Sprint;
use super::{ActionBehavior, ActionInstance};
use crate::config::SimConfig;
use crate::error::ActionError;

/// Builds a fresh behavior for one action kind.
pub type ActionFactory = Arc<dyn Fn() -> Box<dyn ActionBehavior> + Send + Sync>;

/// Registered action kinds.
#[derive(Clone, Default)]
pub struct ActionCatalog {
    factories: BTreeMap<ActionKind, ActionFactory>,
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in kinds, tuned from `config`.
    pub fn with_defaults(config: &SimConfig) -> Self {
        let mut catalog = Self::new();

        let attack = ProjectileParams::from_config(&config.projectile);
        catalog.register("primary_attack", move || {
            Box::new(ProjectileAttack::new("PrimaryAttack", "magic_bolt", "cast_primary", attack))
        });
        catalog.register("black_hole", move || {
            Box::new(ProjectileAttack::new("BlackHole", "black_hole", "cast_black_hole", attack))
        });
        catalog.register("dash", move || {
            Box::new(ProjectileAttack::new("Dash", "dash_projectile", "cast_dash", attack))
        });

        let bonus = config.sprint.speed_bonus;
        catalog.register("sprint", move || Box::new(Sprint::new(bonus)));

        catalog
    }

    /// Registers (or replaces) the factory for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<ActionKind>, factory: F)
    where
        F: Fn() -> Box<dyn ActionBehavior> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
    }

    pub fn contains(&self, kind: &ActionKind) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &ActionKind> {
        self.factories.keys()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Builds a new idle instance of `kind` owned by `owner`.
    pub fn spawn_instance(
        &self,
        kind: &ActionKind,
        id: ActionId,
        owner: Entity,
    ) -> Result<ActionInstance, ActionError> {
        if kind.is_empty() {
            return Err(ActionError::EmptyKind);
        }
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| ActionError::UnknownKind(kind.clone()))?;
        Ok(ActionInstance::new(id, kind.clone(), owner, factory()))
    }
}

impl std::fmt::Debug for ActionCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}
