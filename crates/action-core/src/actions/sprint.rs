//! Sprint
//!
//! Raises the owner's movement speed while running.

use std::any::Any;

use action_events::NetId;

use super::{ActionBehavior, ActionContext};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprint {
    speed_bonus: f32,
}

impl Sprint {
    pub fn new(speed_bonus: f32) -> Self {
        Self { speed_bonus }
    }

    pub fn speed_bonus(&self) -> f32 {
        self.speed_bonus
    }
}

impl ActionBehavior for Sprint {
    fn name(&self) -> &str {
        "Sprint"
    }

    fn on_start(&mut self, ctx: &mut ActionContext<'_>, _instigator: NetId) {
        ctx.add_speed_bonus(self.speed_bonus);
    }

    fn on_stop(&mut self, ctx: &mut ActionContext<'_>, _instigator: NetId) {
        ctx.add_speed_bonus(-self.speed_bonus);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
