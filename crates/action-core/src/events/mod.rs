//! Event Recording
//!
//! Lifecycle events produced on one peer, and the JSONL logger that
//! persists them.

pub mod logger;

pub use logger::{EventLogger, EventTally};

use action_events::ActionEvent;
use bevy_ecs::prelude::*;

/// Resource: events produced since the last drain
#[derive(Resource, Debug)]
pub struct ActionEvents {
    events: Vec<ActionEvent>,
    next_event_id: u64,
}

impl ActionEvents {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_event_id: 1,
        }
    }

    /// Generate the next event ID
    pub fn generate_id(&mut self) -> String {
        let id = format!("aev_{:08}", self.next_event_id);
        self.next_event_id += 1;
        id
    }

    pub fn push(&mut self, event: ActionEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[ActionEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<ActionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for ActionEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_events::{ActionEventKind, NetId};

    #[test]
    fn test_event_id_generation() {
        let mut events = ActionEvents::new();
        assert_eq!(events.generate_id(), "aev_00000001");
        assert_eq!(events.generate_id(), "aev_00000002");
    }

    #[test]
    fn test_drain() {
        let mut events = ActionEvents::new();
        let id = events.generate_id();
        events.push(ActionEvent::new(id, 1, NetId(1), ActionEventKind::Added));
        assert_eq!(events.len(), 1);

        let drained = events.drain();
        assert_eq!(drained.len(), 1);
        assert!(events.is_empty());

        // Ids keep counting across drains
        assert_eq!(events.generate_id(), "aev_00000002");
    }
}
