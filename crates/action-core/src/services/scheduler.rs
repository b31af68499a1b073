//! Scheduler
//!
//! One-shot delayed continuations for actions. A continuation is plain data
//! naming the agent and action to call back; the timer system resolves it
//! against the world when it comes due.

use action_events::{ActionId, NetId};
use bevy_ecs::entity::Entity;

/// Tolerance for comparing accumulated tick time against due times.
const DUE_EPSILON: f64 = 1e-6;

/// Handle returned by [`Scheduler::schedule_after`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// Work to resume when a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuation {
    pub agent: Entity,
    pub action_id: ActionId,
    pub instigator: NetId,
    pub handle: TimerHandle,
}

/// Timer service injected into the action core.
pub trait Scheduler: Send + Sync {
    /// Schedules `continuation` to fire after `delay_seconds`. The handle
    /// field of the passed continuation is overwritten.
    fn schedule_after(&mut self, delay_seconds: f32, continuation: Continuation) -> TimerHandle;

    /// Cancels a pending timer. Returns false if it already fired or never existed.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    /// Cancels every pending timer belonging to `agent`.
    fn cancel_agent(&mut self, agent: Entity) -> usize;

    /// Advances time and returns the continuations that came due, oldest first.
    fn advance(&mut self, delta_seconds: f32) -> Vec<Continuation>;

    /// Current scheduler time in seconds.
    fn now(&self) -> f64;

    /// Number of pending timers.
    fn pending(&self) -> usize;
}

#[derive(Debug, Clone)]
struct PendingTimer {
    due: f64,
    continuation: Continuation,
}

/// Default [`Scheduler`]: a due-time ordered list driven by the tick loop.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: f64,
    next_handle: u64,
    timers: Vec<PendingTimer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for TimerQueue {
    fn schedule_after(&mut self, delay_seconds: f32, mut continuation: Continuation) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        continuation.handle = handle;

        let due = self.now + delay_seconds.max(0.0) as f64;
        // Keep sorted by due time; equal due times fire in scheduling order
        let index = self.timers.partition_point(|t| t.due <= due);
        self.timers.insert(index, PendingTimer { due, continuation });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.continuation.handle != handle);
        self.timers.len() != before
    }

    fn cancel_agent(&mut self, agent: Entity) -> usize {
        let before = self.timers.len();
        self.timers.retain(|t| t.continuation.agent != agent);
        before - self.timers.len()
    }

    fn advance(&mut self, delta_seconds: f32) -> Vec<Continuation> {
        self.now += delta_seconds.max(0.0) as f64;
        let now = self.now + DUE_EPSILON;
        let ready = self.timers.partition_point(|t| t.due <= now);
        self.timers
            .drain(..ready)
            .map(|t| t.continuation)
            .collect()
    }

    fn now(&self) -> f64 {
        self.now
    }

    fn pending(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    fn continuation(agent: Entity, action: u32) -> Continuation {
        Continuation {
            agent,
            action_id: ActionId(action),
            instigator: NetId(1),
            handle: TimerHandle(0),
        }
    }

    #[test]
    fn test_fires_after_delay() {
        let mut world = World::new();
        let agent = world.spawn_empty().id();
        let mut queue = TimerQueue::new();

        let handle = queue.schedule_after(0.2, continuation(agent, 0));

        // 0.05 per tick: nothing due until the fourth tick
        for _ in 0..3 {
            assert!(queue.advance(0.05).is_empty());
        }
        let fired = queue.advance(0.05);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].handle, handle);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_cancel() {
        let mut world = World::new();
        let agent = world.spawn_empty().id();
        let mut queue = TimerQueue::new();

        let handle = queue.schedule_after(0.1, continuation(agent, 0));
        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle));
        assert!(queue.advance(1.0).is_empty());
    }

    #[test]
    fn test_cancel_agent() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut queue = TimerQueue::new();

        queue.schedule_after(0.1, continuation(a, 0));
        queue.schedule_after(0.2, continuation(a, 1));
        queue.schedule_after(0.1, continuation(b, 0));

        assert_eq!(queue.cancel_agent(a), 2);
        let fired = queue.advance(1.0);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].agent, b);
    }

    #[test]
    fn test_fire_order() {
        let mut world = World::new();
        let agent = world.spawn_empty().id();
        let mut queue = TimerQueue::new();

        queue.schedule_after(0.3, continuation(agent, 2));
        queue.schedule_after(0.1, continuation(agent, 0));
        queue.schedule_after(0.1, continuation(agent, 1));

        let fired: Vec<u32> = queue.advance(0.5).iter().map(|c| c.action_id.0).collect();
        assert_eq!(fired, vec![0, 1, 2]);
        assert!((queue.now() - 0.5).abs() < 1e-6);
    }
}
