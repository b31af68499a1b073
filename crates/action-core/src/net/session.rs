//! Session
//!
//! One host and any number of observers wired through a [`Link`]. Each
//! session tick moves relay requests to the host, ticks the host, ships its
//! replication to every observer, then ticks the observers.

use action_events::{ActionKind, NetId};

use super::link::{Delivery, Link, LoopbackLink};
use super::peer::{Peer, PeerRole};
use crate::actions::ActionCatalog;
use crate::components::agent::{AimRig, MoveSpeed};
use crate::config::SimConfig;

/// What every peer needs to spawn its copy of an agent.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AgentSpec {
    id: NetId,
    aim: Option<AimRig>,
    speed: MoveSpeed,
}

pub struct Session {
    config: SimConfig,
    catalog: ActionCatalog,
    host: Peer,
    observers: Vec<Peer>,
    link: Box<dyn Link>,
    agents: Vec<AgentSpec>,
    relay_lost: u64,
}

impl Session {
    /// Session with a host only, linked through a [`LoopbackLink`] built from
    /// the config's network settings.
    pub fn new(config: SimConfig, catalog: ActionCatalog) -> Self {
        let link = LoopbackLink::new(config.simulation.seed, &config.network);
        Self::with_link(config, catalog, link)
    }

    pub fn with_link(config: SimConfig, catalog: ActionCatalog, link: impl Link + 'static) -> Self {
        let host = Peer::new(PeerRole::Host, &config, catalog.clone());
        Self {
            config,
            catalog,
            host,
            observers: Vec::new(),
            link: Box::new(link),
            agents: Vec::new(),
            relay_lost: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn host(&self) -> &Peer {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut Peer {
        &mut self.host
    }

    pub fn observer(&self, index: usize) -> Option<&Peer> {
        self.observers.get(index)
    }

    pub fn observer_mut(&mut self, index: usize) -> Option<&mut Peer> {
        self.observers.get_mut(index)
    }

    pub fn observers(&self) -> &[Peer] {
        &self.observers
    }

    pub fn observers_mut(&mut self) -> &mut [Peer] {
        &mut self.observers
    }

    pub fn link_mut(&mut self) -> &mut dyn Link {
        self.link.as_mut()
    }

    /// Relay requests the link has lost so far.
    pub fn relay_lost(&self) -> u64 {
        self.relay_lost
    }

    /// Joins a new observer, spawns its copies of every agent and asks the
    /// host for a snapshot. Returns the observer's index.
    pub fn add_observer(&mut self) -> usize {
        let mut observer = Peer::new(PeerRole::Observer, &self.config, self.catalog.clone());
        for agent in &self.agents {
            observer.spawn_agent(agent.id, agent.aim, agent.speed, &[]);
        }
        tracing::info!(peer = %observer.id(), agents = self.agents.len(), "observer joined");

        self.observers.push(observer);
        self.host.force_snapshot();
        self.observers.len() - 1
    }

    /// Spawns `id` on every peer; `defaults` are added by the host.
    pub fn spawn_agent(
        &mut self,
        id: NetId,
        aim: Option<AimRig>,
        speed: MoveSpeed,
        defaults: &[ActionKind],
    ) {
        self.host.spawn_agent(id, aim, speed, defaults);
        for observer in &mut self.observers {
            observer.spawn_agent(id, aim, speed, &[]);
        }
        self.agents.push(AgentSpec { id, aim, speed });
    }

    /// Destroys `id` on every peer. Returns the number of actions the host
    /// force-stopped.
    pub fn destroy_agent(&mut self, id: NetId) -> usize {
        let stopped = self.host.destroy_agent(id);
        for observer in &mut self.observers {
            observer.destroy_agent(id);
        }
        self.agents.retain(|agent| agent.id != id);
        stopped
    }

    pub fn disconnect(&mut self) {
        tracing::info!("link disconnected");
        self.link.set_connected(false);
    }

    /// Restores the link and asks the host for a snapshot.
    pub fn reconnect(&mut self) {
        tracing::info!("link reconnected");
        self.link.set_connected(true);
        self.host.force_snapshot();
    }

    pub fn tick(&mut self) {
        for observer in &mut self.observers {
            for request in observer.drain_relay() {
                if self.link.send_relay(&request) {
                    self.host.deliver_relay(request);
                } else {
                    self.relay_lost += 1;
                }
            }
        }

        self.host.tick();

        let messages = self.host.drain_replication();
        for observer in &mut self.observers {
            for message in &messages {
                match self.link.replicate(message) {
                    Delivery::Dropped => {}
                    Delivery::Delivered => observer.deliver_replication(message.clone()),
                    Delivery::Duplicated => {
                        observer.deliver_replication(message.clone());
                        observer.deliver_replication(message.clone());
                    }
                }
            }
        }

        for observer in &mut self.observers {
            observer.tick();
        }
    }

    /// Runs `ticks` session ticks.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }
}
