//! # Outbound Ports
//!
//! Collaborators the engine drives: the keyed state store, the local
//! transfer application, the remote account executor, the bank and the
//! interchain balance queries.

use crate::domain::{
    Amount, BankError, ChainId, ChannelId, Coin, Deposit, DepositState, EpochIdentifier, HostChain,
    LsmDeposit, MsgTransfer, QueryError, RedelegateTx, RemoteError, RemoteMsg, SequenceId,
    TxResponse, Unbonding, UnbondingState, ValidatorUnbonding,
};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Durable protocol state - outbound port.
///
/// Host chain registry, pending records and the epoch counters. Listing
/// methods return records in key order.
pub trait LiquidStakeStore: Send + Sync {
    /// Get a host chain.
    fn host_chain(&self, chain_id: &ChainId) -> Option<HostChain>;

    /// All registered host chains.
    fn all_host_chains(&self) -> Vec<HostChain>;

    /// Insert or replace a host chain.
    fn set_host_chain(&self, host_chain: HostChain);

    /// Host chain whose native denom is `host_denom`.
    fn host_chain_by_host_denom(&self, host_denom: &str) -> Option<HostChain> {
        self.all_host_chains()
            .into_iter()
            .find(|hc| hc.host_denom == host_denom)
    }

    /// Current number of an epoch.
    fn epoch_number(&self, identifier: EpochIdentifier) -> i64;

    /// Record the current number of an epoch.
    fn set_epoch_number(&self, identifier: EpochIdentifier, number: i64);

    /// Get a deposit.
    fn deposit(&self, chain_id: &ChainId, epoch: i64) -> Option<Deposit>;

    /// All deposits.
    fn all_deposits(&self) -> Vec<Deposit>;

    /// Insert or replace a deposit.
    fn set_deposit(&self, deposit: Deposit);

    /// Delete a deposit.
    fn delete_deposit(&self, chain_id: &ChainId, epoch: i64);

    /// PENDING deposits with epoch at most `epoch`.
    fn pending_deposits_up_to(&self, epoch: i64) -> Vec<Deposit> {
        self.all_deposits()
            .into_iter()
            .filter(|d| d.state == DepositState::Pending && d.epoch <= epoch)
            .collect()
    }

    /// Deposits waiting on `sequence_id`.
    fn deposits_with_sequence(&self, sequence_id: &SequenceId) -> Vec<Deposit> {
        self.all_deposits()
            .into_iter()
            .filter(|d| d.sequence_id.as_ref() == Some(sequence_id))
            .collect()
    }

    /// All LSM deposits.
    fn all_lsm_deposits(&self) -> Vec<LsmDeposit>;

    /// Insert or replace an LSM deposit.
    fn set_lsm_deposit(&self, deposit: LsmDeposit);

    /// PENDING LSM deposits of a chain.
    fn transferable_lsm_deposits(&self, chain_id: &ChainId) -> Vec<LsmDeposit> {
        self.all_lsm_deposits()
            .into_iter()
            .filter(|d| &d.chain_id == chain_id && d.state == DepositState::Pending)
            .collect()
    }

    /// LSM deposits waiting on `sequence_id`.
    fn lsm_deposits_with_sequence(&self, sequence_id: &SequenceId) -> Vec<LsmDeposit> {
        self.all_lsm_deposits()
            .into_iter()
            .filter(|d| d.sequence_id.as_ref() == Some(sequence_id))
            .collect()
    }

    /// Get an unbonding.
    fn unbonding(&self, chain_id: &ChainId, epoch: i64) -> Option<Unbonding>;

    /// All unbondings.
    fn all_unbondings(&self) -> Vec<Unbonding>;

    /// Insert or replace an unbonding.
    fn set_unbonding(&self, unbonding: Unbonding);

    /// Unbondings of a chain in `state`.
    fn unbondings_in_state(&self, chain_id: &ChainId, state: UnbondingState) -> Vec<Unbonding> {
        self.all_unbondings()
            .into_iter()
            .filter(|u| &u.chain_id == chain_id && u.state == state)
            .collect()
    }

    /// Unbondings waiting on `sequence_id`.
    fn unbondings_with_sequence(&self, sequence_id: &SequenceId) -> Vec<Unbonding> {
        self.all_unbondings()
            .into_iter()
            .filter(|u| u.sequence_id.as_ref() == Some(sequence_id))
            .collect()
    }

    /// All validator unbondings.
    fn all_validator_unbondings(&self) -> Vec<ValidatorUnbonding>;

    /// Insert or replace a validator unbonding.
    fn set_validator_unbonding(&self, unbonding: ValidatorUnbonding);

    /// Delete a validator unbonding.
    fn delete_validator_unbonding(&self, chain_id: &ChainId, validator_address: &str, epoch: i64);

    /// Get a redelegation transaction.
    fn redelegate_tx(&self, chain_id: &ChainId, sequence_id: &SequenceId) -> Option<RedelegateTx>;

    /// All redelegation transactions.
    fn all_redelegate_txs(&self) -> Vec<RedelegateTx>;

    /// Insert or replace a redelegation transaction.
    fn set_redelegate_tx(&self, tx: RedelegateTx);
}

/// Local transfer application - outbound port.
pub trait TransferRouter: Send + Sync {
    /// Submit a single transfer message.
    fn transfer(&self, msg: &MsgTransfer) -> Result<TxResponse, RemoteError>;
}

/// Remote account transaction executor - outbound port.
///
/// Messages apply atomically on the host chain; the returned sequence id
/// identifies the whole batch.
pub trait RemoteTxExecutor: Send + Sync {
    /// Execute `messages` through the account owned by `owner`.
    fn execute(
        &self,
        connection_id: &str,
        owner: &str,
        messages: &[RemoteMsg],
    ) -> Result<SequenceId, RemoteError>;
}

/// Local bank - outbound port.
pub trait BankGateway: Send + Sync {
    /// Send from a module account to an address.
    fn send_from_module(&self, module: &str, recipient: &str, coin: &Coin)
        -> Result<(), BankError>;

    /// Total supply of a denom.
    fn total_supply(&self, denom: &str) -> Amount;
}

/// Interchain balance queries - outbound port.
///
/// Fire-and-forget; results are handled outside the engine.
pub trait BalanceQuerier: Send + Sync {
    /// Query the rewards account balance.
    fn query_rewards_balance(&self, host_chain: &HostChain) -> Result<(), QueryError>;

    /// Query the non-compoundable rewards balance.
    fn query_non_compoundable_rewards_balance(
        &self,
        host_chain: &HostChain,
    ) -> Result<(), QueryError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock transfer router.
///
/// Assigns increasing packet sequences starting at 1.
#[derive(Default)]
pub struct MockTransferRouter {
    /// Reject every submission?
    pub should_fail: bool,
    /// Answer with an undecodable response?
    pub malformed_response: bool,
    next_sequence: Mutex<u64>,
    sent: Mutex<Vec<MsgTransfer>>,
}

impl MockTransferRouter {
    /// Router that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Router that rejects everything.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Router whose responses cannot be decoded.
    pub fn malformed() -> Self {
        Self {
            malformed_response: true,
            ..Self::default()
        }
    }

    /// Transfers accepted so far.
    pub fn sent(&self) -> Vec<MsgTransfer> {
        self.sent.lock().clone()
    }
}

impl TransferRouter for MockTransferRouter {
    fn transfer(&self, msg: &MsgTransfer) -> Result<TxResponse, RemoteError> {
        if self.should_fail {
            return Err(RemoteError::Rejected("mock failure".to_string()));
        }
        self.sent.lock().push(msg.clone());
        if self.malformed_response {
            return Ok(TxResponse {
                msg_responses: vec![b"not a response".to_vec()],
            });
        }
        let mut next = self.next_sequence.lock();
        *next += 1;
        TxResponse::for_sequence(*next).map_err(|e| RemoteError::Rejected(e.to_string()))
    }
}

/// One batch handed to [`MockRemoteTxExecutor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutedTx {
    /// Connection.
    pub connection_id: String,
    /// Account owner.
    pub owner: String,
    /// Messages in order.
    pub messages: Vec<RemoteMsg>,
    /// Assigned sequence id.
    pub sequence_id: SequenceId,
}

/// Mock remote executor.
///
/// Sequence ids are allocated on `channel-ica`, starting at 1. Calls are
/// numbered from 1; failed calls do not consume a sequence.
#[derive(Default)]
pub struct MockRemoteTxExecutor {
    /// Reject every submission?
    pub should_fail: bool,
    /// Call numbers to reject.
    pub fail_on_calls: Vec<usize>,
    state: Mutex<ExecutorState>,
}

#[derive(Default)]
struct ExecutorState {
    calls: usize,
    next_sequence: u64,
    executed: Vec<ExecutedTx>,
}

impl MockRemoteTxExecutor {
    /// Channel the mock allocates sequences on.
    pub const CHANNEL: &'static str = "channel-ica";

    /// Executor that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor that rejects everything.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Executor that rejects the given call numbers.
    pub fn failing_on(calls: Vec<usize>) -> Self {
        Self {
            fail_on_calls: calls,
            ..Self::default()
        }
    }

    /// Batches accepted so far.
    pub fn executed(&self) -> Vec<ExecutedTx> {
        self.state.lock().executed.clone()
    }

    /// Total submission attempts.
    pub fn calls(&self) -> usize {
        self.state.lock().calls
    }
}

impl RemoteTxExecutor for MockRemoteTxExecutor {
    fn execute(
        &self,
        connection_id: &str,
        owner: &str,
        messages: &[RemoteMsg],
    ) -> Result<SequenceId, RemoteError> {
        let mut state = self.state.lock();
        state.calls += 1;
        if self.should_fail || self.fail_on_calls.contains(&state.calls) {
            return Err(RemoteError::Rejected("mock failure".to_string()));
        }
        state.next_sequence += 1;
        let sequence_id = SequenceId::new(ChannelId::new(Self::CHANNEL), state.next_sequence);
        state.executed.push(ExecutedTx {
            connection_id: connection_id.to_string(),
            owner: owner.to_string(),
            messages: messages.to_vec(),
            sequence_id: sequence_id.clone(),
        });
        Ok(sequence_id)
    }
}

/// Mock bank.
#[derive(Default)]
pub struct MockBank {
    /// Reject every send?
    pub should_fail: bool,
    supplies: Mutex<HashMap<String, Amount>>,
    sends: Mutex<Vec<(String, String, Coin)>>,
    supply_queries: Mutex<usize>,
}

impl MockBank {
    /// Bank that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bank that refuses every send.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Set the supply of a denom.
    pub fn set_supply(&self, denom: &str, amount: Amount) {
        self.supplies.lock().insert(denom.to_string(), amount);
    }

    /// Sends performed, as (module, recipient, coin).
    pub fn sends(&self) -> Vec<(String, String, Coin)> {
        self.sends.lock().clone()
    }

    /// Number of supply lookups.
    pub fn supply_queries(&self) -> usize {
        *self.supply_queries.lock()
    }
}

impl BankGateway for MockBank {
    fn send_from_module(
        &self,
        module: &str,
        recipient: &str,
        coin: &Coin,
    ) -> Result<(), BankError> {
        if self.should_fail {
            return Err(BankError::Refused("mock failure".to_string()));
        }
        self.sends
            .lock()
            .push((module.to_string(), recipient.to_string(), coin.clone()));
        Ok(())
    }

    fn total_supply(&self, denom: &str) -> Amount {
        *self.supply_queries.lock() += 1;
        self.supplies.lock().get(denom).copied().unwrap_or(0)
    }
}

/// Mock balance querier.
#[derive(Default)]
pub struct MockBalanceQuerier {
    /// Reject every query?
    pub should_fail: bool,
    rewards: Mutex<Vec<ChainId>>,
    non_compoundable: Mutex<Vec<ChainId>>,
}

impl MockBalanceQuerier {
    /// Querier that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chains queried for the rewards balance.
    pub fn rewards_queries(&self) -> Vec<ChainId> {
        self.rewards.lock().clone()
    }

    /// Chains queried for the non-compoundable balance.
    pub fn non_compoundable_queries(&self) -> Vec<ChainId> {
        self.non_compoundable.lock().clone()
    }
}

impl BalanceQuerier for MockBalanceQuerier {
    fn query_rewards_balance(&self, host_chain: &HostChain) -> Result<(), QueryError> {
        if self.should_fail {
            return Err(QueryError("mock failure".to_string()));
        }
        self.rewards.lock().push(host_chain.chain_id.clone());
        Ok(())
    }

    fn query_non_compoundable_rewards_balance(
        &self,
        host_chain: &HostChain,
    ) -> Result<(), QueryError> {
        if self.should_fail {
            return Err(QueryError("mock failure".to_string()));
        }
        self.non_compoundable.lock().push(host_chain.chain_id.clone());
        Ok(())
    }
}
