//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits backed by local memory.

mod memory_store;

pub use memory_store::InMemoryStore;
