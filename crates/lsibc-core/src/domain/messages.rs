//! # Remote Messages
//!
//! Closed set of operations the protocol executes on a host chain through
//! its remote accounts, and the outcome reported back for a batch.

use super::errors::LiquidStakeResult;
use super::packets::{MsgTransfer, Packet};
use super::value_objects::Coin;
use serde::{Deserialize, Serialize};

/// Operation executed by a remote account. Tagged with its type url.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum RemoteMsg {
    /// Transfer from the host chain back to the local chain.
    #[serde(rename = "/ibc.applications.transfer.v1.MsgTransfer")]
    Transfer(MsgTransfer),

    /// Undelegate from one validator.
    #[serde(rename = "/cosmos.staking.v1beta1.MsgUndelegate")]
    Undelegate {
        /// Delegation account.
        delegator_address: String,
        /// Validator.
        validator_address: String,
        /// Amount to undelegate.
        amount: Coin,
    },

    /// Withdraw accumulated rewards from one validator.
    #[serde(rename = "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward")]
    WithdrawReward {
        /// Delegation account.
        delegator_address: String,
        /// Validator.
        validator_address: String,
    },

    /// Move stake between validators.
    #[serde(rename = "/cosmos.staking.v1beta1.MsgBeginRedelegate")]
    Redelegate {
        /// Delegation account.
        delegator_address: String,
        /// Source validator.
        validator_src_address: String,
        /// Destination validator.
        validator_dst_address: String,
        /// Amount moved.
        amount: Coin,
    },
}

impl RemoteMsg {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteMsg::Transfer(_) => "transfer",
            RemoteMsg::Undelegate { .. } => "undelegate",
            RemoteMsg::WithdrawReward { .. } => "withdraw_reward",
            RemoteMsg::Redelegate { .. } => "redelegate",
        }
    }
}

/// Hex-encoded JSON of a message batch, as carried in workflow events.
pub fn encode_messages(messages: &[RemoteMsg]) -> LiquidStakeResult<String> {
    Ok(hex::encode(serde_json::to_vec(messages)?))
}

/// Payload of a remote transaction packet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTxPacketData {
    /// Messages in execution order.
    pub messages: Vec<RemoteMsg>,
    /// Memo.
    #[serde(default)]
    pub memo: String,
}

impl RemoteTxPacketData {
    /// Wrap a message batch.
    pub fn new(messages: Vec<RemoteMsg>) -> Self {
        Self {
            messages,
            memo: String::new(),
        }
    }

    /// Encode as packet bytes.
    pub fn to_bytes(&self) -> LiquidStakeResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl Packet {
    /// Decode the payload as a remote transaction.
    pub fn remote_tx_data(&self) -> LiquidStakeResult<RemoteTxPacketData> {
        Ok(serde_json::from_slice(&self.data)?)
    }
}

/// Per-message response of a remote transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMsgResponse {
    /// Completion time of an undelegation or redelegation, unix nanoseconds.
    #[serde(default)]
    pub completion_time: Option<u64>,
}

/// Acknowledged outcome of a remote transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteTxOutcome {
    /// All messages applied.
    Success(Vec<RemoteMsgResponse>),
    /// The transaction was rejected; no message applied.
    Error(String),
}

impl RemoteTxOutcome {
    /// Check if the transaction applied.
    pub fn is_success(&self) -> bool {
        matches!(self, RemoteTxOutcome::Success(_))
    }

    /// Latest completion time across the responses.
    pub fn latest_completion_time(&self) -> Option<u64> {
        match self {
            RemoteTxOutcome::Success(responses) => {
                responses.iter().filter_map(|r| r.completion_time).max()
            }
            RemoteTxOutcome::Error(_) => None,
        }
    }
}
