//! # Domain Module
//!
//! Core domain types for the liquid-stake reconciliation engine.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod messages;
pub mod packets;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use messages::*;
pub use packets::*;
pub use value_objects::*;
