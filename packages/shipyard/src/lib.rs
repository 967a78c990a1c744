//! Shipyard: builds game-server plugin projects into container images and
//! wires them into a shared Compose/Swarm deployment.
//!
//! This crate only re-exports the layered crates underneath it.

pub use application;
pub use domain;
pub use infrastructure;
