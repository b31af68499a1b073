//! Delayed Projectile Attack
//!
//! Plays a cast cue on start, then after a short delay probes along the
//! owner's aim and spawns a projectile from the muzzle toward whatever the
//! probe hit. Only the authority schedules the delayed spawn; observers get
//! the cue alone.

use std::any::Any;

use action_events::NetId;
use glam::Vec3;

use super::{ActionBehavior, ActionContext, TimerOutcome};
use crate::components::agent::AimRig;
use crate::config::ProjectileConfig;
use crate::services::TimerHandle;

/// Tuning shared by every projectile attack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileParams {
    /// Seconds from start to projectile spawn
    pub attack_delay: f32,
    pub max_range: f32,
    pub sweep_radius: f32,
}

impl ProjectileParams {
    pub fn from_config(config: &ProjectileConfig) -> Self {
        Self {
            attack_delay: config.attack_delay,
            max_range: config.max_range,
            sweep_radius: config.sweep_radius,
        }
    }
}

impl Default for ProjectileParams {
    fn default() -> Self {
        Self::from_config(&ProjectileConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct ProjectileAttack {
    name: String,
    projectile: String,
    cast_cue: String,
    params: ProjectileParams,
    pending: Option<TimerHandle>,
}

impl ProjectileAttack {
    pub fn new(
        name: impl Into<String>,
        projectile: impl Into<String>,
        cast_cue: impl Into<String>,
        params: ProjectileParams,
    ) -> Self {
        Self {
            name: name.into(),
            projectile: projectile.into(),
            cast_cue: cast_cue.into(),
            params,
            pending: None,
        }
    }

    pub fn projectile(&self) -> &str {
        &self.projectile
    }

    pub fn params(&self) -> ProjectileParams {
        self.params
    }

    /// Whether the delayed spawn is still outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Point the projectile should travel toward: the first blocking hit
    /// along the aim, or the end of the probe if nothing blocks it.
    fn aim_target(&self, ctx: &ActionContext<'_>, aim: &AimRig) -> Vec3 {
        let direction = aim.view_direction.try_normalize().unwrap_or(Vec3::Z);
        let start = aim.view_origin;
        let end = start + direction * self.params.max_range;

        match ctx
            .spatial()
            .sweep_sphere(start, end, self.params.sweep_radius, Some(ctx.owner().id()))
        {
            Some(hit) => hit.impact_point,
            None => end,
        }
    }
}

impl ActionBehavior for ProjectileAttack {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_start(&mut self, ctx: &mut ActionContext<'_>, _instigator: NetId) {
        ctx.play_cue(self.cast_cue.clone());
        if ctx.is_authority() {
            self.pending = ctx.schedule_after(self.params.attack_delay);
        }
    }

    fn on_stop(&mut self, ctx: &mut ActionContext<'_>, _instigator: NetId) {
        if let Some(handle) = self.pending.take() {
            ctx.cancel_timer(handle);
        }
    }

    fn on_timer(
        &mut self,
        ctx: &mut ActionContext<'_>,
        handle: TimerHandle,
        instigator: NetId,
    ) -> TimerOutcome {
        if self.pending != Some(handle) {
            tracing::debug!(action = %self.name, ?handle, "stale timer ignored");
            return TimerOutcome::Continue;
        }
        self.pending = None;

        let aim = ctx.aim().unwrap_or_default();
        let target = self.aim_target(ctx, &aim);
        ctx.spawn_projectile(self.projectile.clone(), instigator, aim.muzzle, target);
        TimerOutcome::Stop
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionCatalog, ActionEffects, OwnerInfo};
    use crate::components::agent::AgentNet;
    use crate::services::ActionServices;
    use bevy_ecs::world::World;

    fn owner(world: &mut World, net: AgentNet) -> OwnerInfo {
        OwnerInfo {
            entity: world.spawn_empty().id(),
            net,
            aim: Some(AimRig::default()),
        }
    }

    fn attack() -> ProjectileAttack {
        ProjectileAttack::new("PrimaryAttack", "magic_bolt", "cast_primary", ProjectileParams::default())
    }

    #[test]
    fn test_authority_schedules_spawn() {
        let mut world = World::new();
        let owner = owner(&mut world, AgentNet::authority(NetId(1)));
        let mut services = ActionServices::new(ActionCatalog::new());
        let mut effects = ActionEffects::new();
        let mut ctx = ActionContext::new(owner, 0, &mut services, &mut effects);

        let mut action = attack();
        ctx.enter(action_events::ActionId(0), "PrimaryAttack", NetId(1));
        action.on_start(&mut ctx, NetId(1));
        ctx.leave();

        assert!(action.is_pending());
        assert_eq!(services.scheduler.pending(), 1);
    }

    #[test]
    fn test_observer_only_plays_cue() {
        let mut world = World::new();
        let owner = owner(&mut world, AgentNet::observer(NetId(1)));
        let mut services = ActionServices::new(ActionCatalog::new());
        let mut effects = ActionEffects::new();
        let mut ctx = ActionContext::new(owner, 0, &mut services, &mut effects);

        let mut action = attack();
        ctx.enter(action_events::ActionId(0), "PrimaryAttack", NetId(1));
        action.on_start(&mut ctx, NetId(1));
        ctx.leave();

        assert!(!action.is_pending());
        assert_eq!(services.scheduler.pending(), 0);
        assert!(!effects.is_empty());
    }

    #[test]
    fn test_stop_cancels_pending_spawn() {
        let mut world = World::new();
        let owner = owner(&mut world, AgentNet::authority(NetId(1)));
        let mut services = ActionServices::new(ActionCatalog::new());
        let mut effects = ActionEffects::new();
        let mut ctx = ActionContext::new(owner, 0, &mut services, &mut effects);

        let mut action = attack();
        ctx.enter(action_events::ActionId(0), "PrimaryAttack", NetId(1));
        action.on_start(&mut ctx, NetId(1));
        action.on_stop(&mut ctx, NetId(1));
        ctx.leave();

        assert!(!action.is_pending());
        assert_eq!(services.scheduler.pending(), 0);
    }
}
