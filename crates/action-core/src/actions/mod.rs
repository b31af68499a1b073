//! Actions
//!
//! A single runnable unit of behavior attached to an agent. Concrete
//! behaviors implement [`ActionBehavior`]; the registry only ever sees them
//! through [`ActionInstance`], which owns the running flag and performs the
//! Idle -> Running -> Idle transitions.

pub mod catalog;
pub mod context;
pub mod projectile;
pub mod sprint;

pub use catalog::{ActionCatalog, ActionFactory};
pub use context::{ActionContext, ActionEffects, OwnerInfo};
pub use projectile::{ProjectileAttack, ProjectileParams};
pub use sprint::Sprint;

use std::any::Any;
use std::fmt;

use action_events::{ActionEventKind, ActionId, ActionKind, ActionRecord, NetId};
use bevy_ecs::entity::Entity;

use crate::error::InvariantViolation;
use crate::services::TimerHandle;

/// What a delayed continuation wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// Keep running
    Continue,
    /// Transition back to idle
    Stop,
}

/// Behavior of a concrete action kind.
///
/// Hooks run after the running flag has been updated by the owning
/// [`ActionInstance`]. `can_start` must not have side effects.
pub trait ActionBehavior: Send + Sync + 'static {
    /// Name used for start/stop-by-name lookups.
    fn name(&self) -> &str;

    /// Start as soon as the authority adds the action.
    fn auto_start(&self) -> bool {
        false
    }

    /// Preconditions beyond "not already running".
    fn can_start(&self, _ctx: &ActionContext<'_>, _instigator: NetId) -> bool {
        true
    }

    fn on_start(&mut self, _ctx: &mut ActionContext<'_>, _instigator: NetId) {}

    /// Release timers and effects acquired in `on_start`.
    fn on_stop(&mut self, _ctx: &mut ActionContext<'_>, _instigator: NetId) {}

    /// A continuation scheduled through [`ActionContext::schedule_after`] fired.
    fn on_timer(
        &mut self,
        _ctx: &mut ActionContext<'_>,
        _handle: TimerHandle,
        _instigator: NetId,
    ) -> TimerOutcome {
        TimerOutcome::Continue
    }

    fn as_any(&self) -> &dyn Any;
}

/// An action owned by one agent's registry.
pub struct ActionInstance {
    id: ActionId,
    kind: ActionKind,
    /// Owning agent; the registry owns the instance, never the reverse
    owner: Entity,
    running: bool,
    instigator: Option<NetId>,
    behavior: Box<dyn ActionBehavior>,
}

impl ActionInstance {
    pub(crate) fn new(
        id: ActionId,
        kind: ActionKind,
        owner: Entity,
        behavior: Box<dyn ActionBehavior>,
    ) -> Self {
        Self {
            id,
            kind,
            owner,
            running: false,
            instigator: None,
            behavior,
        }
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        self.behavior.name()
    }

    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Instigator of the most recent transition.
    pub fn instigator(&self) -> Option<NetId> {
        self.instigator
    }

    pub fn auto_start(&self) -> bool {
        self.behavior.auto_start()
    }

    pub fn behavior(&self) -> &dyn ActionBehavior {
        self.behavior.as_ref()
    }

    /// Downcasts the behavior to a concrete type.
    pub fn behavior_as<T: ActionBehavior>(&self) -> Option<&T> {
        self.behavior.as_any().downcast_ref::<T>()
    }

    pub fn can_start(&self, ctx: &ActionContext<'_>, instigator: NetId) -> bool {
        !self.running && self.behavior.can_start(ctx, instigator)
    }

    /// Idle -> Running. Reports and does nothing if already running.
    pub fn start_action(&mut self, ctx: &mut ActionContext<'_>, instigator: NetId) -> bool {
        if self.running {
            ctx.report(InvariantViolation::AlreadyRunning {
                agent: ctx.owner().id(),
                name: self.name().to_string(),
            });
            return false;
        }

        self.running = true;
        self.instigator = Some(instigator);
        tracing::debug!(agent = %ctx.owner().id(), action = self.name(), "started");
        ctx.record(ActionEventKind::Started, Some((self.id, self.name())), Some(instigator));

        ctx.enter(self.id, self.behavior.name(), instigator);
        self.behavior.on_start(ctx, instigator);
        ctx.leave();
        true
    }

    /// Running -> Idle. Returns false, without touching any resources, when idle.
    pub fn stop_action(&mut self, ctx: &mut ActionContext<'_>, instigator: NetId) -> bool {
        if !self.running {
            return false;
        }

        self.running = false;
        self.instigator = Some(instigator);
        tracing::debug!(agent = %ctx.owner().id(), action = self.name(), "stopped");
        ctx.record(ActionEventKind::Stopped, Some((self.id, self.name())), Some(instigator));

        ctx.enter(self.id, self.behavior.name(), instigator);
        self.behavior.on_stop(ctx, instigator);
        ctx.leave();
        true
    }

    /// Runs a fired continuation. Returns true if it stopped the action.
    pub(crate) fn fire_timer(
        &mut self,
        ctx: &mut ActionContext<'_>,
        handle: TimerHandle,
        instigator: NetId,
    ) -> bool {
        if !self.running {
            tracing::debug!(action = self.name(), "timer fired for idle action, ignored");
            return false;
        }

        ctx.enter(self.id, self.behavior.name(), instigator);
        let outcome = self.behavior.on_timer(ctx, handle, instigator);
        ctx.leave();

        match outcome {
            TimerOutcome::Continue => false,
            TimerOutcome::Stop => self.stop_action(ctx, instigator),
        }
    }

    /// Takes the instigator reported by the authority.
    pub(crate) fn sync_instigator(&mut self, instigator: Option<NetId>) {
        self.instigator = instigator;
    }

    /// Replicated state of this action.
    pub fn record(&self) -> ActionRecord {
        ActionRecord {
            action_id: self.id,
            kind: self.kind.clone(),
            running: self.running,
            instigator: self.instigator,
        }
    }
}

impl fmt::Debug for ActionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionInstance")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.name())
            .field("running", &self.running)
            .field("instigator", &self.instigator)
            .finish()
    }
}
