//! # Domain Events
//!
//! Events emitted by the workflows and the reconciler. The host ledger
//! drains them once per block.

use crate::domain::{Amount, ChainId, Coin, Dec, SequenceId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Liquid-stake event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiquidStakeEvent {
    /// Deposit batch transferred to the host chain.
    DelegationWorkflow {
        /// Host chain
        chain_id: ChainId,
        /// Deposit epoch
        epoch: i64,
        /// Transferred amount, in the host denom
        amount: Coin,
        /// Transfer sequence id
        sequence_id: SequenceId,
    },

    /// LSM deposits transferred for a chain.
    LsmWorkflow {
        /// Host chain
        chain_id: ChainId,
        /// Total shares sent
        shares: Amount,
    },

    /// Undelegation batch submitted.
    UndelegationWorkflow {
        /// Host chain
        chain_id: ChainId,
        /// Undelegation epoch
        epoch: i64,
        /// Total unbonded
        unbond_amount: Coin,
        /// Total burned
        burn_amount: Coin,
        /// Hex-encoded message batch
        messages: String,
        /// Batch sequence id
        sequence_id: SequenceId,
    },

    /// Undelegation batch could not be submitted.
    UnsuccessfulUndelegationInitiation {
        /// Host chain
        chain_id: ChainId,
        /// Undelegation epoch
        epoch: i64,
    },

    /// Submitted undelegation was rejected or timed out.
    UndelegationFailed {
        /// Host chain
        chain_id: ChainId,
        /// Unbonding bucket
        epoch: i64,
    },

    /// Validator force-unbond submitted.
    ValidatorUndelegationWorkflow {
        /// Host chain
        chain_id: ChainId,
        /// Undelegation epoch
        epoch: i64,
        /// Validator
        validator_address: String,
        /// Undelegated amount
        amount: Coin,
        /// Sequence id
        sequence_id: SequenceId,
    },

    /// Reward withdrawal batch submitted.
    RewardsWorkflow {
        /// Host chain
        chain_id: ChainId,
        /// Rewards epoch
        epoch: i64,
        /// Hex-encoded message batch
        messages: String,
    },

    /// Redelegation submitted.
    RedelegationWorkflow {
        /// Host chain
        chain_id: ChainId,
        /// Redelegation epoch
        epoch: i64,
        /// Source validator
        src: String,
        /// Destination validator
        dst: String,
        /// Moved amount
        amount: Coin,
        /// Sequence id
        sequence_id: SequenceId,
    },

    /// Redelegation acknowledged or timed out.
    RedelegationResolved {
        /// Host chain
        chain_id: ChainId,
        /// Sequence id
        sequence_id: SequenceId,
        /// Whether it applied
        success: bool,
    },

    /// Matured unbondings sent back to the local chain.
    UnbondingTransferSent {
        /// Host chain
        chain_id: ChainId,
        /// Transferred amount
        amount: Coin,
        /// Sequence id
        sequence_id: SequenceId,
    },

    /// Unbonded funds arrived; the unbonding is claimable.
    UnbondingMaturedReceived {
        /// Host chain
        chain_id: ChainId,
        /// Unbonding bucket
        epoch: i64,
        /// Unbonded amount
        amount: Coin,
    },

    /// Force-unbonded funds arrived and were pooled into deposits.
    ValidatorUnbondingMaturedReceived {
        /// Host chain
        chain_id: ChainId,
        /// Received amount
        amount: Coin,
    },

    /// Rewards arrived and were pooled into deposits.
    AutocompoundRewardsReceived {
        /// Host chain
        chain_id: ChainId,
        /// Received amount
        transfer: Coin,
        /// Protocol fee taken
        fee: Coin,
    },

    /// Deposit transfer acknowledged.
    StakingDepositTransferReceived {
        /// Host chain
        chain_id: ChainId,
        /// Sequence id
        sequence_id: SequenceId,
    },

    /// LSM deposit transfer acknowledged.
    LsmDepositTransferReceived {
        /// Host chain
        chain_id: ChainId,
        /// Sequence id
        sequence_id: SequenceId,
    },

    /// Deposit transfer timed out.
    StakingDepositTransferTimeout {
        /// Host chain
        chain_id: ChainId,
        /// Sequence id
        sequence_id: SequenceId,
    },

    /// LSM deposit transfer timed out.
    LsmDepositTransferTimeout {
        /// Host chain
        chain_id: ChainId,
        /// Sequence id
        sequence_id: SequenceId,
    },

    /// C value recomputed.
    CValueUpdated {
        /// Host chain
        chain_id: ChainId,
        /// New value
        c_value: Dec,
    },

    /// Chain deactivated because its C value left the limits.
    ChainDisabled {
        /// Host chain
        chain_id: ChainId,
        /// Offending value
        c_value: Dec,
    },
}

/// Collects events emitted during a block.
#[derive(Debug, Default)]
pub struct EventManager {
    events: RwLock<Vec<LiquidStakeEvent>>,
}

impl EventManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit an event.
    pub fn emit(&self, event: LiquidStakeEvent) {
        self.events.write().push(event);
    }

    /// Events emitted so far.
    pub fn events(&self) -> Vec<LiquidStakeEvent> {
        self.events.read().clone()
    }

    /// Drain emitted events.
    pub fn take_events(&self) -> Vec<LiquidStakeEvent> {
        std::mem::take(&mut *self.events.write())
    }
}
