//! # Domain Value Objects
//!
//! Immutable value types for the reconciliation engine: identifiers, coins,
//! the fixed-point decimal used for rates and weights, and record states.

use super::errors::LiquidStakeError;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DeserializeFromStr, DisplayFromStr, SerializeDisplay};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Token amount in base units.
pub type Amount = u128;

/// Port id of the fungible token transfer application.
pub const TRANSFER_PORT: &str = "transfer";

/// Number of fractional digits carried by [`Dec`].
pub const DEC_PRECISION: u32 = 18;

const DEC_ONE: u128 = 1_000_000_000_000_000_000;

/// Computes `floor(a * b / c)` without intermediate overflow.
///
/// Returns `None` when `c` is zero or the result does not fit in an [`Amount`].
pub fn mul_div_floor(a: Amount, b: Amount, c: Amount) -> Option<Amount> {
    if c == 0 {
        return None;
    }
    let result = U256::from(a) * U256::from(b) / U256::from(c);
    if result > U256::from(u128::MAX) {
        return None;
    }
    Some(result.as_u128())
}

/// Parse a base-unit integer amount.
pub fn parse_amount(raw: &str) -> Result<Amount, LiquidStakeError> {
    raw.trim()
        .parse::<Amount>()
        .map_err(|_| LiquidStakeError::ParseAmount(raw.to_string()))
}

/// Host chain identifier (e.g. `cosmoshub-4`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
    /// Create a chain id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Channel identifier (e.g. `channel-0`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    /// Create a channel id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlation key between a pending record and its confirmation.
///
/// Composed of the outbound channel and the packet sequence assigned on
/// submission. Ordered by channel, then sequence.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceId {
    /// Outbound channel.
    pub channel: ChannelId,
    /// Packet sequence on that channel.
    pub sequence: u64,
}

impl SequenceId {
    /// Create a sequence id.
    pub fn new(channel: ChannelId, sequence: u64) -> Self {
        Self { channel, sequence }
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-sequence-{}", self.channel, self.sequence)
    }
}

/// Denominated amount. The amount travels as a decimal string.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination.
    pub denom: String,
    /// Amount in base units.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
}

impl Coin {
    /// Create a coin.
    pub fn new(denom: impl Into<String>, amount: Amount) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Zero coin of the given denom.
    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    /// Check if amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Add to the amount, failing on overflow.
    pub fn checked_add_amount(&mut self, amount: Amount) -> Result<(), LiquidStakeError> {
        self.amount = self
            .amount
            .checked_add(amount)
            .ok_or(LiquidStakeError::Overflow)?;
        Ok(())
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Local denom of a token that arrived over `port/channel`.
///
/// `ibc/` followed by the upper-case hex SHA-256 of the trace path.
pub fn ibc_denom(port: &str, channel: &ChannelId, base_denom: &str) -> String {
    let path = format!("{}/{}/{}", port, channel, base_denom);
    let digest = Sha256::digest(path.as_bytes());
    format!("ibc/{}", hex::encode_upper(digest))
}

/// Non-negative fixed-point decimal with 18 fractional digits.
///
/// Used for fee rates, validator weights and the exchange (C) value.
/// Serialized as its decimal string, e.g. `"0.020000000000000000"`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay,
    DeserializeFromStr,
)]
pub struct Dec(u128);

impl Dec {
    /// Zero.
    pub const ZERO: Dec = Dec(0);
    /// One.
    pub const ONE: Dec = Dec(DEC_ONE);
    /// Largest representable value.
    pub const MAX: Dec = Dec(u128::MAX);

    /// Build from raw 10^-18 units.
    pub const fn from_atto(atto: u128) -> Self {
        Self(atto)
    }

    /// Raw 10^-18 units.
    pub const fn atto(&self) -> u128 {
        self.0
    }

    /// Build from a whole percentage (`2` -> `0.02`).
    pub fn from_percent(percent: u64) -> Self {
        Self(percent as u128 * (DEC_ONE / 100))
    }

    /// `numerator / denominator`, `None` on zero denominator or overflow.
    pub fn from_ratio(numerator: Amount, denominator: Amount) -> Option<Self> {
        mul_div_floor(numerator, DEC_ONE, denominator).map(Self)
    }

    /// Check if zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    pub fn checked_add(self, other: Dec) -> Option<Dec> {
        self.0.checked_add(other.0).map(Dec)
    }

    /// Saturating subtraction.
    pub fn saturating_sub(self, other: Dec) -> Dec {
        Dec(self.0.saturating_sub(other.0))
    }

    /// `floor(amount * self)`, saturating at [`Amount::MAX`].
    pub fn mul_int_truncate(&self, amount: Amount) -> Amount {
        mul_div_floor(amount, self.0, DEC_ONE).unwrap_or(Amount::MAX)
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:018}", self.0 / DEC_ONE, self.0 % DEC_ONE)
    }
}

impl FromStr for Dec {
    type Err = LiquidStakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || LiquidStakeError::ParseDecimal(s.to_string());
        let trimmed = s.trim();
        let (int_part, frac_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if frac_part.len() > DEC_PRECISION as usize {
            return Err(err());
        }
        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(err());
        }

        let int: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| err())?
        };
        let frac: u128 = if frac_part.is_empty() {
            0
        } else {
            let scale = 10u128.pow(DEC_PRECISION - frac_part.len() as u32);
            frac_part.parse::<u128>().map_err(|_| err())? * scale
        };

        int.checked_mul(DEC_ONE)
            .and_then(|v| v.checked_add(frac))
            .map(Dec)
            .ok_or_else(err)
    }
}

/// Epoch identifiers driving the workflows.
///
/// Each identifier has its own counter maintained by the epochs module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpochIdentifier {
    /// Deposit batching and transfers.
    Delegation,
    /// Exchange value recomputation.
    #[serde(rename = "cvalue")]
    CValue,
    /// Undelegation batches and validator force-unbonds.
    Undelegation,
    /// Reward withdrawals.
    Rewards,
    /// Rebalancing redelegations.
    Redelegation,
}

impl EpochIdentifier {
    /// All identifiers.
    pub const ALL: [EpochIdentifier; 5] = [
        EpochIdentifier::Delegation,
        EpochIdentifier::CValue,
        EpochIdentifier::Undelegation,
        EpochIdentifier::Rewards,
        EpochIdentifier::Redelegation,
    ];

    /// Wire identifier used by the epochs module.
    pub fn as_str(&self) -> &'static str {
        match self {
            EpochIdentifier::Delegation => "delegation",
            EpochIdentifier::CValue => "cvalue",
            EpochIdentifier::Undelegation => "undelegation",
            EpochIdentifier::Rewards => "rewards",
            EpochIdentifier::Redelegation => "redelegation",
        }
    }
}

impl FromStr for EpochIdentifier {
    type Err = LiquidStakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EpochIdentifier::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| LiquidStakeError::UnknownEpochIdentifier(s.to_string()))
    }
}

impl fmt::Display for EpochIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deposit and LSM deposit state machine.
///
/// `Pending -> Sent -> Received`, with `Sent -> Pending` on timeout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepositState {
    /// Waiting for the next deposit workflow.
    #[default]
    Pending,
    /// Transfer submitted, awaiting acknowledgement.
    Sent,
    /// Transfer acknowledged by the host chain.
    Received,
}

impl DepositState {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: DepositState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Sent) | (Self::Sent, Self::Received) | (Self::Sent, Self::Pending)
        )
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Received)
    }
}

/// Unbonding state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnbondingState {
    /// Collecting unbond requests for the epoch bucket.
    #[default]
    Pending,
    /// Undelegation batch submitted to the host chain.
    Initiated,
    /// Unbonding period elapsed, funds being transferred back.
    Matured,
    /// Funds received, users can claim.
    Claimable,
    /// Undelegation could not be initiated.
    Failed,
}

impl UnbondingState {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: UnbondingState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Initiated)
                | (Self::Pending, Self::Failed)
                | (Self::Initiated, Self::Failed)
                | (Self::Initiated, Self::Matured)
                | (Self::Matured, Self::Initiated)
                | (Self::Matured, Self::Claimable)
        )
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Claimable | Self::Failed)
    }
}

/// Redelegation transaction state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RedelegateTxState {
    /// Submitted, awaiting acknowledgement.
    #[default]
    Sent,
    /// Applied on the host chain.
    Success,
    /// Rejected or timed out.
    Failed,
}

impl RedelegateTxState {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: RedelegateTxState) -> bool {
        matches!(
            (self, next),
            (Self::Sent, Self::Success) | (Self::Sent, Self::Failed)
        )
    }
}

/// Remote account channel state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelState {
    /// Channel handshake in progress.
    #[default]
    Creating,
    /// Channel open.
    Created,
}

/// Block the hooks execute in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    /// Block height.
    pub height: u64,
    /// Block time, unix nanoseconds.
    pub time: u64,
}

impl BlockContext {
    /// Create a block context.
    pub fn new(height: u64, time: u64) -> Self {
        Self { height, time }
    }

    /// Absolute timeout `timeout_secs` after the block time.
    pub fn timeout_after(&self, timeout_secs: u64) -> u64 {
        self.time
            .saturating_add(timeout_secs.saturating_mul(1_000_000_000))
    }
}
