//! # Domain Entities
//!
//! Host chain aggregate and the pending records tracked across cross-chain
//! round trips.

use super::errors::{LiquidStakeError, LiquidStakeResult};
use super::value_objects::{
    ibc_denom, Amount, ChainId, ChannelId, ChannelState, Coin, Dec, DepositState,
    RedelegateTxState, SequenceId, UnbondingState, TRANSFER_PORT,
};
use serde::{Deserialize, Serialize};

fn invalid_transition<S: std::fmt::Debug>(record: &'static str, from: S, to: S) -> LiquidStakeError {
    LiquidStakeError::InvalidTransition {
        record,
        from: format!("{:?}", from),
        to: format!("{:?}", to),
    }
}

/// Protocol-controlled account on a host chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcaAccount {
    /// Address on the host chain.
    pub address: String,
    /// Local owner id of the account.
    pub owner: String,
    /// Last confirmed balance.
    pub balance: Coin,
    /// Channel state.
    pub channel_state: ChannelState,
}

impl IcaAccount {
    /// Check if the account channel is open.
    pub fn is_live(&self) -> bool {
        self.channel_state == ChannelState::Created
    }
}

/// Per-chain protocol parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostChainParams {
    /// Fee rate taken from autocompounded rewards.
    pub restake_fee: Dec,
    /// Local address receiving protocol fees.
    pub fee_address: String,
    /// Undelegations run every `unbonding_factor` undelegation epochs.
    pub unbonding_factor: i64,
    /// Rebalance moves at or below this amount are dropped.
    pub redelegation_acceptable_delta: Amount,
}

/// Feature flags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostChainFlags {
    /// Tokenized-share deposits enabled.
    pub lsm: bool,
}

/// Non-compoundable reward configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardParams {
    /// Reward denom that cannot be restaked.
    pub denom: String,
    /// Destination address for that denom.
    pub destination: String,
}

/// Validator delegated to on a host chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Operator address.
    pub operator_address: String,
    /// Confirmed delegated amount.
    pub delegated_amount: Amount,
    /// Target weight.
    pub weight: Dec,
    /// Epoch the validator entered unbonding, 0 when bonded.
    pub unbonding_epoch: i64,
}

impl Validator {
    /// Create a bonded validator.
    pub fn new(operator_address: impl Into<String>, delegated_amount: Amount, weight: Dec) -> Self {
        Self {
            operator_address: operator_address.into(),
            delegated_amount,
            weight,
            unbonding_epoch: 0,
        }
    }

    /// Check if the validator has an unbonding marker.
    pub fn is_unbonding(&self) -> bool {
        self.unbonding_epoch > 0
    }
}

/// Registered host chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostChain {
    /// Chain id.
    pub chain_id: ChainId,
    /// Whether workflows may touch this chain.
    pub active: bool,
    /// Local transfer channel towards the host chain.
    pub channel_id: ChannelId,
    /// Host side of the transfer channel.
    pub counterparty_channel_id: ChannelId,
    /// Connection used by the remote accounts.
    pub connection_id: String,
    /// Native staking denom on the host chain.
    pub host_denom: String,
    /// Account holding the delegations.
    pub delegation_account: IcaAccount,
    /// Account withdrawing rewards.
    pub rewards_account: Option<IcaAccount>,
    /// Validator set, in registration order.
    pub validators: Vec<Validator>,
    /// Parameters.
    pub params: HostChainParams,
    /// Feature flags.
    pub flags: HostChainFlags,
    /// Non-compoundable reward settings.
    pub reward_params: Option<RewardParams>,
    /// Current exchange value.
    pub c_value: Dec,
    /// Exchange value before the last update.
    pub last_c_value: Dec,
}

impl HostChain {
    /// Local denom of the host token after it crossed the transfer channel.
    pub fn ibc_denom(&self) -> String {
        ibc_denom(TRANSFER_PORT, &self.channel_id, &self.host_denom)
    }

    /// Derivative token denom.
    pub fn mint_denom(&self) -> String {
        format!("stk/{}", self.host_denom)
    }

    /// Check if `epoch` is one of this chain's unbonding epochs.
    pub fn is_unbonding_epoch(&self, epoch: i64) -> bool {
        let factor = self.params.unbonding_factor;
        factor > 0 && epoch % factor == 0
    }

    /// Unbonding bucket that `epoch` contributes to.
    pub fn current_unbonding_epoch(&self, epoch: i64) -> i64 {
        let factor = self.params.unbonding_factor;
        if factor <= 0 {
            return epoch;
        }
        match epoch % factor {
            0 => epoch,
            rem => epoch + factor - rem,
        }
    }

    /// Sum of confirmed validator delegations.
    pub fn total_delegated(&self) -> Amount {
        self.validators
            .iter()
            .fold(0, |acc: Amount, v| acc.saturating_add(v.delegated_amount))
    }

    /// Look up a validator.
    pub fn validator(&self, operator_address: &str) -> Option<&Validator> {
        self.validators
            .iter()
            .find(|v| v.operator_address == operator_address)
    }

    /// Look up a validator for mutation.
    pub fn validator_mut(&mut self, operator_address: &str) -> Option<&mut Validator> {
        self.validators
            .iter_mut()
            .find(|v| v.operator_address == operator_address)
    }

    /// Whether the rewards account channel is open.
    pub fn rewards_account_live(&self) -> bool {
        self.rewards_account
            .as_ref()
            .map(IcaAccount::is_live)
            .unwrap_or(false)
    }
}

/// Pooled user deposits for one chain and epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    /// Host chain.
    pub chain_id: ChainId,
    /// Deposit epoch.
    pub epoch: i64,
    /// Pooled amount, in the chain's local IBC denom.
    pub amount: Coin,
    /// Lifecycle state.
    pub state: DepositState,
    /// Set while the transfer is in flight.
    pub sequence_id: Option<SequenceId>,
}

impl Deposit {
    /// Create an empty pending deposit.
    pub fn new(chain_id: ChainId, epoch: i64, denom: impl Into<String>) -> Self {
        Self {
            chain_id,
            epoch,
            amount: Coin::zero(denom),
            state: DepositState::Pending,
            sequence_id: None,
        }
    }

    fn transition_to(&mut self, next: DepositState) -> LiquidStakeResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(invalid_transition("deposit", self.state, next));
        }
        self.state = next;
        Ok(())
    }

    /// PENDING -> SENT.
    pub fn mark_sent(&mut self, sequence_id: SequenceId) -> LiquidStakeResult<()> {
        self.transition_to(DepositState::Sent)?;
        self.sequence_id = Some(sequence_id);
        Ok(())
    }

    /// SENT -> RECEIVED.
    pub fn mark_received(&mut self) -> LiquidStakeResult<()> {
        self.transition_to(DepositState::Received)?;
        self.sequence_id = None;
        Ok(())
    }

    /// SENT -> PENDING.
    pub fn revert(&mut self) -> LiquidStakeResult<()> {
        self.transition_to(DepositState::Pending)?;
        self.sequence_id = None;
        Ok(())
    }
}

/// Deposit of tokenized validator shares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LsmDeposit {
    /// Unique id.
    pub id: u64,
    /// Host chain.
    pub chain_id: ChainId,
    /// Depositor.
    pub delegator_address: String,
    /// Local denom of the share token.
    pub denom: String,
    /// Number of shares.
    pub shares: Amount,
    /// Lifecycle state.
    pub state: DepositState,
    /// Set while the transfer is in flight.
    pub sequence_id: Option<SequenceId>,
}

impl LsmDeposit {
    fn transition_to(&mut self, next: DepositState) -> LiquidStakeResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(invalid_transition("lsm deposit", self.state, next));
        }
        self.state = next;
        Ok(())
    }

    /// PENDING -> SENT.
    pub fn mark_sent(&mut self, sequence_id: SequenceId) -> LiquidStakeResult<()> {
        self.transition_to(DepositState::Sent)?;
        self.sequence_id = Some(sequence_id);
        Ok(())
    }

    /// SENT -> RECEIVED.
    pub fn mark_received(&mut self) -> LiquidStakeResult<()> {
        self.transition_to(DepositState::Received)?;
        self.sequence_id = None;
        Ok(())
    }

    /// SENT -> PENDING.
    pub fn revert(&mut self) -> LiquidStakeResult<()> {
        self.transition_to(DepositState::Pending)?;
        self.sequence_id = None;
        Ok(())
    }
}

/// Aggregated user unbond requests for one unbonding bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unbonding {
    /// Host chain.
    pub chain_id: ChainId,
    /// Unbonding bucket.
    pub epoch_number: i64,
    /// Host tokens to undelegate.
    pub unbond_amount: Coin,
    /// Derivative tokens burned for this bucket.
    pub burn_amount: Coin,
    /// Lifecycle state.
    pub state: UnbondingState,
    /// Set while a remote operation is in flight.
    pub sequence_id: Option<SequenceId>,
    /// Remote unbonding completion time, unix nanoseconds.
    pub mature_time: Option<u64>,
}

impl Unbonding {
    /// Create a pending unbonding.
    pub fn new(chain_id: ChainId, epoch_number: i64, unbond_amount: Coin, burn_amount: Coin) -> Self {
        Self {
            chain_id,
            epoch_number,
            unbond_amount,
            burn_amount,
            state: UnbondingState::Pending,
            sequence_id: None,
            mature_time: None,
        }
    }

    fn transition_to(&mut self, next: UnbondingState) -> LiquidStakeResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(invalid_transition("unbonding", self.state, next));
        }
        self.state = next;
        Ok(())
    }

    /// Undelegation batch submitted.
    pub fn mark_initiated(&mut self, sequence_id: SequenceId) -> LiquidStakeResult<()> {
        self.transition_to(UnbondingState::Initiated)?;
        self.sequence_id = Some(sequence_id);
        Ok(())
    }

    /// Undelegation could not be initiated or was rejected.
    pub fn mark_failed(&mut self) -> LiquidStakeResult<()> {
        self.transition_to(UnbondingState::Failed)?;
        self.sequence_id = None;
        Ok(())
    }

    /// Undelegation confirmed; funds unlock at `mature_time`.
    pub fn record_maturity(&mut self, mature_time: u64) {
        self.mature_time = Some(mature_time);
        self.sequence_id = None;
    }

    /// Check if the unbonding period elapsed and no operation is in flight.
    pub fn is_mature(&self, block_time: u64) -> bool {
        self.state == UnbondingState::Initiated
            && self.sequence_id.is_none()
            && self.mature_time.map(|t| t <= block_time).unwrap_or(false)
    }

    /// Transfer back to the local chain submitted.
    pub fn mark_matured(&mut self, sequence_id: SequenceId) -> LiquidStakeResult<()> {
        self.transition_to(UnbondingState::Matured)?;
        self.sequence_id = Some(sequence_id);
        Ok(())
    }

    /// Transfer back failed; the maturity pass retries.
    pub fn revert_maturity(&mut self) -> LiquidStakeResult<()> {
        self.transition_to(UnbondingState::Initiated)?;
        self.sequence_id = None;
        Ok(())
    }

    /// Funds arrived locally.
    pub fn mark_claimable(&mut self) -> LiquidStakeResult<()> {
        self.transition_to(UnbondingState::Claimable)?;
        self.sequence_id = None;
        Ok(())
    }
}

/// Force-unbond of a single validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUnbonding {
    /// Host chain.
    pub chain_id: ChainId,
    /// Validator being removed.
    pub validator_address: String,
    /// Epoch the force-unbond was submitted.
    pub epoch_number: i64,
    /// Undelegated amount.
    pub amount: Coin,
    /// Remote unbonding completion time, unix nanoseconds; 0 until confirmed.
    pub mature_time: u64,
    /// Undelegation in flight.
    pub sequence_id: Option<SequenceId>,
    /// Transfer back to the deposit account in flight.
    pub transfer_sequence_id: Option<SequenceId>,
}

impl ValidatorUnbonding {
    /// Check if funds unlocked and no transfer is in flight.
    pub fn is_mature(&self, block_time: u64) -> bool {
        self.sequence_id.is_none()
            && self.transfer_sequence_id.is_none()
            && self.mature_time > 0
            && self.mature_time <= block_time
    }
}

/// One submitted redelegation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedelegateTx {
    /// Host chain.
    pub chain_id: ChainId,
    /// Sequence id of the submission; the record key.
    pub sequence_id: SequenceId,
    /// Lifecycle state.
    pub state: RedelegateTxState,
}

impl RedelegateTx {
    /// Create a sent redelegation.
    pub fn new(chain_id: ChainId, sequence_id: SequenceId) -> Self {
        Self {
            chain_id,
            sequence_id,
            state: RedelegateTxState::Sent,
        }
    }

    /// Resolve to SUCCESS or FAILED.
    pub fn resolve(&mut self, success: bool) -> LiquidStakeResult<()> {
        let next = if success {
            RedelegateTxState::Success
        } else {
            RedelegateTxState::Failed
        };
        if !self.state.can_transition_to(next) {
            return Err(invalid_transition("redelegate tx", self.state, next));
        }
        self.state = next;
        Ok(())
    }
}
