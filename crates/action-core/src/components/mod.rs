//! ECS Components
//!
//! Agent components and per-peer world resources.

pub mod agent;
pub mod world;

pub use agent::*;
pub use world::*;
