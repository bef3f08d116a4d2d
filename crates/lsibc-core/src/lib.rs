//! # LSIBC Core
//!
//! Epoch-driven reconciliation engine for cross-chain liquid staking.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! User funds pooled on the local ledger are staked on remote host chains
//! through asynchronous cross-chain messages. This crate tracks every fund
//! movement whose remote outcome is delayed and possibly failing:
//! - Epoch workflows batch deposits, undelegations, reward withdrawals and
//!   redelegations into remote operations
//! - The callback reconciler resolves each acknowledgement or timeout back
//!   into local state, keyed by sequence id
//!
//! ## Record Lifecycles
//!
//! | Record | States |
//! |--------|--------|
//! | Deposit / LSM deposit | PENDING -> SENT -> RECEIVED, SENT -> PENDING |
//! | Unbonding | PENDING -> INITIATED -> MATURED -> CLAIMABLE, -> FAILED |
//! | Redelegate tx | SENT -> SUCCESS / FAILED |
//!
//! ## Module Structure
//!
//! ```text
//! lsibc-core/
//! ├── domain/          # Host chain, records, packets, remote messages, errors
//! ├── algorithms/      # Allocation, rebalance, weights, fees
//! ├── ports/           # Epoch/transfer/remote-tx hooks, outbound collaborators
//! ├── adapters/        # In-memory store
//! └── service/         # Workflows and reconciler
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::InMemoryStore;
pub use algorithms::{
    allocate_undelegation, c_value_within_limits, compute_c_value, generate_redelegations,
    redistribute_weight, split_restake_fee, RedelegationMove,
};
pub use config::{module_address, ConfigError, LiquidStakeConfig};
pub use domain::{
    Acknowledgement, Amount, BlockContext, ChainId, ChannelId, Coin, Dec, Deposit, DepositState,
    EpochIdentifier, FungibleTokenPacketData, HostChain, LiquidStakeError, LiquidStakeResult,
    LsmDeposit, Packet, RedelegateTx, RedelegateTxState, RemoteMsg, RemoteTxOutcome, SequenceId,
    Unbonding, UnbondingState, Validator, ValidatorUnbonding,
};
pub use events::{EventManager, LiquidStakeEvent};
pub use ports::{
    BalanceQuerier, BankGateway, EpochHooks, LiquidStakeStore, RemoteTxExecutor, RemoteTxHooks,
    TransferHooks, TransferRouter,
};
pub use service::{InboundTransfer, LiquidStakeService};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
