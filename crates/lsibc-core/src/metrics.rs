//! # Liquid-Stake Metrics
//!
//! Prometheus counters for the epoch workflows and callbacks.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! lsibc-core = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `lsibc_deposits_sent_total` - Deposit transfers submitted
//! - `lsibc_validator_unbondings_total` - Force-unbonds submitted (by chain)
//! - `lsibc_undelegation_failures_total` - Undelegations marked failed (by chain)
//! - `lsibc_redelegations_submitted_total` - Redelegation transactions submitted
//! - `lsibc_callback_errors_total` - Callback handlers that returned an error (by callback)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Deposit transfers submitted
    pub static ref DEPOSITS_SENT: IntCounter = register_int_counter!(
        "lsibc_deposits_sent_total",
        "Total number of deposit transfers submitted"
    )
    .expect("Failed to create DEPOSITS_SENT metric");

    /// Force-unbonds submitted, labeled by chain
    pub static ref VALIDATOR_UNBONDINGS: IntCounterVec = register_int_counter_vec!(
        "lsibc_validator_unbondings_total",
        "Total number of validator force-unbonds submitted",
        &["chain_id"]
    )
    .expect("Failed to create VALIDATOR_UNBONDINGS metric");

    /// Undelegations marked failed, labeled by chain
    pub static ref UNDELEGATION_FAILURES: IntCounterVec = register_int_counter_vec!(
        "lsibc_undelegation_failures_total",
        "Total number of undelegation batches marked failed",
        &["chain_id"]
    )
    .expect("Failed to create UNDELEGATION_FAILURES metric");

    /// Redelegation transactions submitted
    pub static ref REDELEGATIONS_SUBMITTED: IntCounter = register_int_counter!(
        "lsibc_redelegations_submitted_total",
        "Total number of redelegation transactions submitted"
    )
    .expect("Failed to create REDELEGATIONS_SUBMITTED metric");

    /// Callback errors, labeled by callback
    pub static ref CALLBACK_ERRORS: IntCounterVec = register_int_counter_vec!(
        "lsibc_callback_errors_total",
        "Total number of callback handlers that returned an error",
        &["callback"]
    )
    .expect("Failed to create CALLBACK_ERRORS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a deposit transfer submitted
#[cfg(feature = "metrics")]
pub fn record_deposit_sent() {
    DEPOSITS_SENT.inc();
}

/// Record a validator force-unbond
#[cfg(feature = "metrics")]
pub fn record_validator_unbonding(chain_id: &str) {
    VALIDATOR_UNBONDINGS.with_label_values(&[chain_id]).inc();
}

/// Record an undelegation failure
#[cfg(feature = "metrics")]
pub fn record_undelegation_failure(chain_id: &str) {
    UNDELEGATION_FAILURES.with_label_values(&[chain_id]).inc();
}

/// Record a redelegation submitted
#[cfg(feature = "metrics")]
pub fn record_redelegation_submitted() {
    REDELEGATIONS_SUBMITTED.inc();
}

/// Record a callback error
#[cfg(feature = "metrics")]
pub fn record_callback_error(callback: &str) {
    CALLBACK_ERRORS.with_label_values(&[callback]).inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

/// Record a deposit transfer submitted (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_deposit_sent() {}

/// Record a validator force-unbond (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_validator_unbonding(_chain_id: &str) {}

/// Record an undelegation failure (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_undelegation_failure(_chain_id: &str) {}

/// Record a redelegation submitted (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_redelegation_submitted() {}

/// Record a callback error (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_callback_error(_callback: &str) {}
