//! # LSIBC Test Suite
//!
//! Unified test crate driving the engine through its public hooks only.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Wired service over the in-memory store and mocks
//! └── integration/
//!     ├── scenarios.rs  # Deposit, ack, timeout and autocompound round trips
//!     ├── lifecycle.rs  # Multi-epoch unbonding and redelegation flows
//!     └── properties.rs # Invariants over randomized inputs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p lsibc-tests
//! cargo test -p lsibc-tests integration::scenarios::
//!
//! # Benchmarks
//! cargo bench -p lsibc-tests
//! ```

#![allow(dead_code)]
