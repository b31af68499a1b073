//! Event Logger
//!
//! Drains a session's lifecycle events once per tick. Host events go to an
//! append-only JSONL file, one event per line; observer events are only
//! counted, since every one of them mirrors or forwards a host transition.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use action_events::{ActionEvent, ActionEventKind};

use crate::net::Session;

/// Running totals over everything the logger has drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventTally {
    /// Host events, written or not
    pub host: u64,
    pub observer: u64,
    /// Host `StartRejected` events
    pub rejected_starts: u64,
}

pub struct EventLogger {
    sink: Option<BufWriter<File>>,
    tally: EventTally,
}

impl EventLogger {
    /// Truncates or creates `path`, creating missing parent directories.
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            sink: Some(BufWriter::new(File::create(path)?)),
            tally: EventTally::default(),
        })
    }

    /// Counts events without writing them anywhere.
    pub fn discard() -> Self {
        Self {
            sink: None,
            tally: EventTally::default(),
        }
    }

    pub fn tally(&self) -> EventTally {
        self.tally
    }

    pub fn is_writing(&self) -> bool {
        self.sink.is_some()
    }

    /// Writes a host event and counts it.
    pub fn write_event(&mut self, event: &ActionEvent) -> std::io::Result<()> {
        self.tally.host += 1;
        if event.kind == ActionEventKind::StartRejected {
            self.tally.rejected_starts += 1;
        }
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };
        serde_json::to_writer(&mut *sink, event)?;
        sink.write_all(b"\n")
    }

    /// Drains every peer's pending events. Returns how many host events
    /// this call wrote.
    pub fn drain_session(&mut self, session: &mut Session) -> std::io::Result<usize> {
        let events = session.host_mut().drain_events();
        for event in &events {
            self.write_event(event)?;
        }
        for observer in session.observers_mut() {
            self.tally.observer += observer.drain_events().len() as u64;
        }
        Ok(events.len())
    }

    pub fn finish(&mut self) -> std::io::Result<()> {
        match self.sink.as_mut() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        if let Err(err) = self.finish() {
            tracing::warn!(%err, "event log not flushed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionCatalog;
    use crate::config::SimConfig;
    use crate::setup::{self, PLAYER};
    use action_events::{ActionId, NetId};
    use std::io::BufRead;

    fn read_lines(path: &Path) -> Vec<ActionEvent> {
        let file = File::open(path).unwrap();
        std::io::BufReader::new(file)
            .lines()
            .map(|line| serde_json::from_str(&line.unwrap()).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("events.jsonl");

        let mut logger = EventLogger::create(&path).unwrap();
        assert!(logger.is_writing());
        let event = ActionEvent::new("aev_00000001", 3, NetId(1), ActionEventKind::Started)
            .with_action(ActionId(0), "Sprint")
            .with_instigator(NetId(1));
        logger.write_event(&event).unwrap();
        logger.finish().unwrap();

        assert_eq!(read_lines(&path), vec![event]);
    }

    #[test]
    fn test_discard_still_counts() {
        let mut logger = EventLogger::discard();
        logger
            .write_event(&ActionEvent::new("aev_00000001", 1, NetId(1), ActionEventKind::Added))
            .unwrap();
        logger
            .write_event(&ActionEvent::new(
                "aev_00000002",
                1,
                NetId(1),
                ActionEventKind::StartRejected,
            ))
            .unwrap();

        assert!(!logger.is_writing());
        assert_eq!(
            logger.tally(),
            EventTally {
                host: 2,
                observer: 0,
                rejected_starts: 1,
            }
        );
    }

    #[test]
    fn test_drain_session_writes_host_events_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let config = SimConfig::default();
        let catalog = ActionCatalog::with_defaults(&config);
        let mut session = Session::new(config, catalog);
        session.add_observer();
        setup::spawn_demo_agents(&mut session);
        session.tick();

        let mut logger = EventLogger::create(&path).unwrap();
        let written = logger.drain_session(&mut session).unwrap();
        assert!(written > 0);
        let tally = logger.tally();
        assert_eq!(tally.host, written as u64);
        assert!(tally.observer > 0);

        // Everything was drained
        assert_eq!(logger.drain_session(&mut session).unwrap(), 0);
        assert!(session.observer_mut(0).unwrap().drain_events().is_empty());

        logger.finish().unwrap();
        let logged = read_lines(&path);
        assert_eq!(logged.len(), written);
        assert!(logged.iter().all(|e| !e.replicated));
        assert!(logged.iter().any(|e| e.agent == PLAYER));
    }
}
