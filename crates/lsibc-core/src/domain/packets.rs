//! # Transfer Packets
//!
//! Transport-level types the reconciler reads: packets, fungible token
//! packet data, acknowledgements and transfer responses. All payloads are
//! JSON encoded.

use super::errors::{LiquidStakeError, LiquidStakeResult};
use super::value_objects::{parse_amount, Amount, ChannelId, Coin, SequenceId};
use serde::{Deserialize, Serialize};

/// Packet relayed between the local chain and a host chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Sequence on the source channel.
    pub sequence: u64,
    /// Source port.
    pub source_port: String,
    /// Source channel.
    pub source_channel: ChannelId,
    /// Destination port.
    pub destination_port: String,
    /// Destination channel.
    pub destination_channel: ChannelId,
    /// Encoded payload.
    pub data: Vec<u8>,
    /// Absolute timeout, unix nanoseconds.
    pub timeout_timestamp: u64,
}

impl Packet {
    /// Sequence id of an outbound packet.
    pub fn source_sequence_id(&self) -> SequenceId {
        SequenceId::new(self.source_channel.clone(), self.sequence)
    }

    /// Decode the payload as fungible token packet data.
    pub fn transfer_data(&self) -> LiquidStakeResult<FungibleTokenPacketData> {
        Ok(serde_json::from_slice(&self.data)?)
    }
}

/// ICS-20 packet payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleTokenPacketData {
    /// Denom trace as seen by the sender.
    pub denom: String,
    /// Integer amount as a decimal string.
    pub amount: String,
    /// Sender address.
    pub sender: String,
    /// Receiver address.
    pub receiver: String,
    /// Optional memo.
    #[serde(default)]
    pub memo: String,
}

impl FungibleTokenPacketData {
    /// Parsed amount.
    pub fn parse_amount(&self) -> LiquidStakeResult<Amount> {
        parse_amount(&self.amount)
    }

    /// Encode as packet bytes.
    pub fn to_bytes(&self) -> LiquidStakeResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Channel acknowledgement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acknowledgement {
    /// Application result, base64 encoded.
    Result(String),
    /// Application error.
    Error(String),
}

impl Acknowledgement {
    /// Canonical success acknowledgement of the transfer application.
    pub fn success_ack() -> Self {
        Acknowledgement::Result("AQ==".to_string())
    }

    /// Decode acknowledgement bytes.
    pub fn decode(bytes: &[u8]) -> LiquidStakeResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode as bytes.
    pub fn to_bytes(&self) -> LiquidStakeResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Check if the acknowledgement reports success.
    pub fn success(&self) -> bool {
        matches!(self, Acknowledgement::Result(_))
    }
}

/// Single-message transfer submitted to the local transfer application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgTransfer {
    /// Source port.
    pub source_port: String,
    /// Source channel.
    pub source_channel: ChannelId,
    /// Tokens to send.
    pub token: Coin,
    /// Sender address.
    pub sender: String,
    /// Receiver address on the other chain.
    pub receiver: String,
    /// Absolute timeout, unix nanoseconds.
    pub timeout_timestamp: u64,
    /// Memo.
    #[serde(default)]
    pub memo: String,
}

/// Response of a submitted transfer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResponse {
    /// Encoded message responses, in message order.
    pub msg_responses: Vec<Vec<u8>>,
}

/// Decoded transfer message response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgTransferResponse {
    /// Packet sequence assigned to the transfer.
    pub sequence: u64,
}

impl TxResponse {
    /// Build a response carrying one transfer sequence.
    pub fn for_sequence(sequence: u64) -> LiquidStakeResult<Self> {
        Ok(Self {
            msg_responses: vec![serde_json::to_vec(&MsgTransferResponse { sequence })?],
        })
    }

    /// Packet sequence of the first message response.
    pub fn transfer_sequence(&self) -> LiquidStakeResult<u64> {
        let first = self
            .msg_responses
            .first()
            .ok_or(LiquidStakeError::MissingResponse)?;
        let response: MsgTransferResponse = serde_json::from_slice(first)?;
        Ok(response.sequence)
    }
}
