//! Capability Services
//!
//! Everything an action may touch outside its own state is injected through
//! the [`ActionServices`] resource: the action catalog, a timer service, world
//! queries, a notice sink and invariant reporting. Each peer builds its own.

pub mod notifier;
pub mod scheduler;
pub mod spatial;

pub use notifier::{Notice, NoticeLog, Notifier};
pub use scheduler::{Continuation, Scheduler, TimerHandle, TimerQueue};
pub use spatial::{ObstacleField, SpatialQuery, SphereObstacle, SweepHit};

use bevy_ecs::prelude::*;

use crate::actions::catalog::ActionCatalog;
use crate::error::InvariantViolation;

/// Records invariant violations.
///
/// Every violation is logged at error level and kept for inspection. In
/// strict mode the first violation panics instead.
#[derive(Debug, Default)]
pub struct Diagnostics {
    panic_on_invariant: bool,
    violations: Vec<InvariantViolation>,
}

impl Diagnostics {
    pub fn new(panic_on_invariant: bool) -> Self {
        Self {
            panic_on_invariant,
            violations: Vec::new(),
        }
    }

    pub fn report(&mut self, violation: InvariantViolation) {
        tracing::error!(%violation, "invariant violated");
        if self.panic_on_invariant {
            panic!("invariant violated: {}", violation);
        }
        self.violations.push(violation);
    }

    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    pub fn drain(&mut self) -> Vec<InvariantViolation> {
        std::mem::take(&mut self.violations)
    }
}

/// Resource: capabilities available to registries and actions on one peer
#[derive(Resource)]
pub struct ActionServices {
    pub catalog: ActionCatalog,
    pub scheduler: Box<dyn Scheduler>,
    pub spatial: Box<dyn SpatialQuery>,
    pub notifier: Box<dyn Notifier>,
    pub diagnostics: Diagnostics,
}

impl ActionServices {
    /// Services backed by the default implementations and an empty world.
    pub fn new(catalog: ActionCatalog) -> Self {
        Self {
            catalog,
            scheduler: Box::new(TimerQueue::new()),
            spatial: Box::new(ObstacleField::new()),
            notifier: Box::new(NoticeLog::new()),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn with_spatial(mut self, spatial: impl SpatialQuery + 'static) -> Self {
        self.spatial = Box::new(spatial);
        self
    }

    pub fn with_scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Box::new(scheduler);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}
