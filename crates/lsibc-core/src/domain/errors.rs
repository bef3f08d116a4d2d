//! # Domain Errors
//!
//! Error types for the liquid-stake reconciliation engine.
//!
//! Lookup and decode errors are fatal to a callback handler; workflow loops
//! log them and move on to the next record.

use thiserror::Error;

/// Liquid-stake error types.
#[derive(Debug, Error)]
pub enum LiquidStakeError {
    /// Host chain is not registered.
    #[error("Host chain with id {0} is not registered")]
    HostChainNotFound(String),

    /// No deposit record for the chain and epoch.
    #[error("Deposit not found for chain {chain_id} and epoch {epoch}")]
    DepositNotFound {
        /// Host chain id
        chain_id: String,
        /// Deposit epoch
        epoch: i64,
    },

    /// Acknowledgement reported failure.
    #[error("Invalid acknowledgement: {0}")]
    InvalidAcknowledgement(String),

    /// Packet data or acknowledgement could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Message response list was empty.
    #[error("Missing message response")]
    MissingResponse,

    /// Integer amount could not be parsed.
    #[error("Could not parse amount: {0}")]
    ParseAmount(String),

    /// Decimal could not be parsed.
    #[error("Could not parse decimal: {0}")]
    ParseDecimal(String),

    /// Unknown epoch identifier.
    #[error("Unknown epoch identifier: {0}")]
    UnknownEpochIdentifier(String),

    /// Aggregate undelegation exceeds what is delegated.
    #[error("Insufficient delegation: requested {requested}, available {available}")]
    InsufficientDelegation {
        /// Requested undelegation amount
        requested: u128,
        /// Total delegated amount
        available: u128,
    },

    /// Protocol fee could not be sent.
    #[error("Failed to send restake fee to fee address {address}: {reason}")]
    FeeTransfer {
        /// Fee recipient
        address: String,
        /// Underlying bank error
        reason: String,
    },

    /// Transport reported an error for the packet.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Remote submission failed.
    #[error("Remote submission failed: {0}")]
    Remote(#[from] RemoteError),

    /// Bank operation failed.
    #[error("Bank error: {0}")]
    Bank(#[from] BankError),

    /// Balance query could not be issued.
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Invalid record state transition.
    #[error("Invalid {record} transition: {from} -> {to}")]
    InvalidTransition {
        /// Record kind
        record: &'static str,
        /// Current state
        from: String,
        /// Attempted state
        to: String,
    },

    /// Arithmetic overflow on an amount.
    #[error("Amount overflow")]
    Overflow,
}

/// Result alias for liquid-stake operations.
pub type LiquidStakeResult<T> = Result<T, LiquidStakeError>;

/// Errors returned by the transfer router and the remote executor.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The collaborator rejected the submission.
    #[error("submission rejected: {0}")]
    Rejected(String),

    /// The remote account channel is not open.
    #[error("channel for owner {0} is not open")]
    ChannelNotOpen(String),
}

/// Errors returned by the bank collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BankError {
    /// Sender balance too low.
    #[error("insufficient funds in {account}: need {needed}")]
    InsufficientFunds {
        /// Sending account
        account: String,
        /// Requested amount
        needed: u128,
    },

    /// Transfer refused.
    #[error("send refused: {0}")]
    Refused(String),
}

/// Errors returned by the balance query collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("query not issued: {0}")]
pub struct QueryError(pub String);

/// Error reported by the transport alongside an acknowledgement or timeout.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);
