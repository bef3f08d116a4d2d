//! # Ports Module
//!
//! Hexagonal architecture ports (inbound hooks, outbound collaborators).

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
