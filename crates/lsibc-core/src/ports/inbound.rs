//! # Inbound Ports
//!
//! Entry points the host ledger calls: epoch ticks, transfer callbacks and
//! remote transaction callbacks.

use crate::domain::{
    Acknowledgement, BlockContext, LiquidStakeResult, Packet, RemoteTxOutcome, TransportError,
};

/// Epoch hooks - inbound port.
///
/// Identifiers that are not liquid-stake epochs are ignored.
pub trait EpochHooks {
    /// Called before epoch `number` of `identifier` starts.
    fn before_epoch_start(
        &self,
        ctx: &BlockContext,
        identifier: &str,
        number: i64,
    ) -> LiquidStakeResult<()>;

    /// Called after epoch `number` of `identifier` ended.
    fn after_epoch_end(
        &self,
        ctx: &BlockContext,
        identifier: &str,
        number: i64,
    ) -> LiquidStakeResult<()>;
}

/// Transfer application callbacks - inbound port.
pub trait TransferHooks {
    /// A transfer arrived from another chain. `ack` is the local
    /// transfer application's acknowledgement for it.
    fn on_recv_transfer_packet(
        &self,
        ctx: &BlockContext,
        packet: &Packet,
        relayer: &str,
        ack: &Acknowledgement,
    ) -> LiquidStakeResult<()>;

    /// An outbound transfer was acknowledged.
    fn on_acknowledgement_transfer_packet(
        &self,
        ctx: &BlockContext,
        packet: &Packet,
        acknowledgement: &[u8],
        relayer: &str,
        transport_error: Option<&TransportError>,
    ) -> LiquidStakeResult<()>;

    /// An outbound transfer timed out.
    fn on_timeout_transfer_packet(
        &self,
        ctx: &BlockContext,
        packet: &Packet,
        relayer: &str,
        transport_error: Option<&TransportError>,
    ) -> LiquidStakeResult<()>;
}

/// Remote account transaction callbacks - inbound port.
pub trait RemoteTxHooks {
    /// A remote transaction was acknowledged.
    fn on_remote_tx_acknowledgement(
        &self,
        ctx: &BlockContext,
        packet: &Packet,
        outcome: &RemoteTxOutcome,
    ) -> LiquidStakeResult<()>;

    /// A remote transaction timed out.
    fn on_remote_tx_timeout(&self, ctx: &BlockContext, packet: &Packet) -> LiquidStakeResult<()>;
}
