//! Links
//!
//! The transport between peers. Delivery is in-process; a link only decides
//! whether each message arrives, and how often.

use action_events::{RelayRequest, ReplicationMessage};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::NetworkConfig;

/// Fate of one replication message on its way to one observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Dropped,
    Delivered,
    /// Delivered twice
    Duplicated,
}

/// Transport between the host and its observers.
pub trait Link: Send + Sync {
    /// Whether a relay request reaches the host.
    fn send_relay(&mut self, request: &RelayRequest) -> bool;

    fn replicate(&mut self, message: &ReplicationMessage) -> Delivery;

    fn set_connected(&mut self, connected: bool);

    fn is_connected(&self) -> bool;
}

/// In-process link with seeded loss and duplication.
///
/// Relay requests are lost at `relay_loss_rate`. Replication is reliable
/// but may be delivered twice at `duplicate_rate`. While disconnected,
/// nothing gets through.
#[derive(Debug, Clone)]
pub struct LoopbackLink {
    rng: SmallRng,
    relay_loss_rate: f64,
    duplicate_rate: f64,
    connected: bool,
}

impl LoopbackLink {
    pub fn new(seed: u64, config: &NetworkConfig) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            relay_loss_rate: probability(config.relay_loss_rate),
            duplicate_rate: probability(config.duplicate_rate),
            connected: true,
        }
    }

    /// A link that never loses or duplicates anything.
    pub fn reliable() -> Self {
        Self::new(0, &NetworkConfig::default())
    }
}

/// Clamps `rate` into `[0, 1]`; NaN counts as never.
fn probability(rate: f64) -> f64 {
    if rate.is_nan() {
        tracing::warn!("link rate is NaN, treating it as 0.0");
        return 0.0;
    }
    rate.clamp(0.0, 1.0)
}

impl Link for LoopbackLink {
    fn send_relay(&mut self, request: &RelayRequest) -> bool {
        if !self.connected {
            tracing::debug!(agent = %request.agent, "link down, relay request dropped");
            return false;
        }
        if self.rng.gen_bool(self.relay_loss_rate) {
            tracing::debug!(
                agent = %request.agent,
                action = %request.action_name,
                "relay request lost"
            );
            return false;
        }
        true
    }

    fn replicate(&mut self, message: &ReplicationMessage) -> Delivery {
        if !self.connected {
            tracing::debug!(agent = %message.agent, version = message.version, "link down, replication dropped");
            return Delivery::Dropped;
        }
        if self.rng.gen_bool(self.duplicate_rate) {
            Delivery::Duplicated
        } else {
            Delivery::Delivered
        }
    }

    fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
