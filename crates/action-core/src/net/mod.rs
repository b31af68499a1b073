//! In-process networking: peers, the links between them, and sessions that
//! drive a host and its observers in lockstep.

pub mod link;
pub mod peer;
pub mod session;

pub use link::{Delivery, Link, LoopbackLink};
pub use peer::{Peer, PeerRole};
pub use session::Session;
