//! # Algorithms Module
//!
//! Pure computations used by the workflows: undelegation allocation,
//! rebalance moves, weight redistribution and fee math.

pub mod allocation;
pub mod fees;
pub mod rebalance;
pub mod weights;

pub use allocation::allocate_undelegation;
pub use fees::{c_value_within_limits, compute_c_value, split_restake_fee};
pub use rebalance::{generate_redelegations, RedelegationMove};
pub use weights::redistribute_weight;
