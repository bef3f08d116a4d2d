//! # LSIBC Telemetry
//!
//! Structured logging for the liquid-stake IBC engine.
//!
//! The core crate only emits `tracing` events. This crate installs the
//! subscriber that turns them into human readable or JSON log lines.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lsibc_telemetry::{init_tracing, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_tracing(&config).expect("Failed to initialize logging");
//! tracing::info!(epoch = 5, "[lsibc] Deposit sent");
//! ```

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log level could not be parsed as a filter directive
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber is already installed
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Install the global tracing subscriber.
///
/// Fails if a subscriber is already set, so call this once at startup.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    logging::init_subscriber(config)
}

/// Install the subscriber, ignoring an already installed one.
///
/// Intended for test harnesses that share a process.
pub fn try_init_tracing(config: &TelemetryConfig) -> bool {
    init_tracing(config).is_ok()
}
