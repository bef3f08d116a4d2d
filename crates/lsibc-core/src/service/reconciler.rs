//! Cross-chain callback reconciler for transfer packets.
//!
//! Sole authority moving deposits out of SENT and settling unsolicited
//! inbound transfers from the host chains.

use super::LiquidStakeService;
use crate::domain::{
    Acknowledgement, BlockContext, ChainId, Coin, FungibleTokenPacketData, HostChain,
    LiquidStakeError, LiquidStakeResult, Packet, TransportError, UnbondingState,
};
use crate::events::LiquidStakeEvent;
use crate::metrics;
use crate::ports::inbound::TransferHooks;
use crate::ports::outbound::{
    BalanceQuerier, BankGateway, LiquidStakeStore, RemoteTxExecutor, TransferRouter,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Kind of an inbound transfer from a host chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InboundTransfer {
    /// Matured user unbondings returning to the undelegation account.
    UnbondingMatured,
    /// Force-unbonded validator stake returning to the deposit account.
    ValidatorUnbondingMatured,
    /// Withdrawn rewards to be restaked.
    Autocompound,
    /// Anything else.
    Unrelated,
}

impl InboundTransfer {
    /// Classify by sender, receiver and memo.
    pub fn classify(
        hc: &HostChain,
        data: &FungibleTokenPacketData,
        deposit_address: &str,
        undelegation_address: &str,
    ) -> Self {
        if !data.memo.is_empty() {
            return InboundTransfer::Unrelated;
        }
        let from_delegation = data.sender == hc.delegation_account.address;
        let from_rewards = hc
            .rewards_account
            .as_ref()
            .map(|account| account.address == data.sender)
            .unwrap_or(false);

        if from_delegation && data.receiver == undelegation_address {
            InboundTransfer::UnbondingMatured
        } else if from_delegation && data.receiver == deposit_address {
            InboundTransfer::ValidatorUnbondingMatured
        } else if from_rewards && data.receiver == deposit_address {
            InboundTransfer::Autocompound
        } else {
            InboundTransfer::Unrelated
        }
    }
}

impl<S, T, R, B, Q> LiquidStakeService<S, T, R, B, Q>
where
    S: LiquidStakeStore,
    T: TransferRouter,
    R: RemoteTxExecutor,
    B: BankGateway,
    Q: BalanceQuerier,
{
    fn handle_recv(&self, packet: &Packet, ack: &Acknowledgement) -> LiquidStakeResult<()> {
        info!(
            sequence = packet.sequence,
            channel = %packet.destination_channel,
            "[lsibc] Received incoming transfer"
        );
        if !ack.success() {
            return Ok(());
        }

        let data = packet.transfer_data()?;
        let Some(hc) = self.store.host_chain_by_host_denom(&data.denom) else {
            return Ok(());
        };

        let kind = InboundTransfer::classify(
            &hc,
            &data,
            &self.config.deposit_address(),
            &self.config.undelegation_address(),
        );
        debug!(chain_id = %hc.chain_id, kind = ?kind, "[lsibc] Inbound transfer classified");

        match kind {
            InboundTransfer::UnbondingMatured => {
                for mut unbonding in self
                    .store
                    .unbondings_in_state(&hc.chain_id, UnbondingState::Matured)
                {
                    unbonding.mark_claimable()?;
                    self.emit(LiquidStakeEvent::UnbondingMaturedReceived {
                        chain_id: hc.chain_id.clone(),
                        epoch: unbonding.epoch_number,
                        amount: unbonding.unbond_amount.clone(),
                    });
                    self.store.set_unbonding(unbonding);
                }
            }
            InboundTransfer::ValidatorUnbondingMatured => {
                let amount = data.parse_amount()?;
                self.credit_current_deposit(&hc, amount)?;
                self.emit(LiquidStakeEvent::ValidatorUnbondingMaturedReceived {
                    chain_id: hc.chain_id.clone(),
                    amount: Coin::new(hc.host_denom.clone(), amount),
                });
            }
            InboundTransfer::Autocompound => {
                let amount = data.parse_amount()?;
                self.settle_autocompound(&hc, amount)?;
            }
            InboundTransfer::Unrelated => {}
        }
        Ok(())
    }

    fn handle_acknowledgement(
        &self,
        packet: &Packet,
        acknowledgement: &[u8],
        transport_error: Option<&TransportError>,
    ) -> LiquidStakeResult<()> {
        if let Some(e) = transport_error {
            return Err(LiquidStakeError::Transport(e.to_string()));
        }
        let ack = Acknowledgement::decode(acknowledgement)?;
        if let Acknowledgement::Error(reason) = ack {
            return Err(LiquidStakeError::InvalidAcknowledgement(reason));
        }

        let data = packet.transfer_data()?;
        let amount = data.parse_amount()?;
        if data.sender != self.config.deposit_address() {
            return Ok(());
        }

        let sequence_id = packet.source_sequence_id();
        let deposits = self.store.deposits_with_sequence(&sequence_id);
        let lsm_deposits = self.store.lsm_deposits_with_sequence(&sequence_id);

        let mut chains: BTreeMap<ChainId, HostChain> = BTreeMap::new();
        let chain_ids = deposits
            .iter()
            .map(|d| &d.chain_id)
            .chain(lsm_deposits.iter().map(|d| &d.chain_id));
        for chain_id in chain_ids {
            if chains.contains_key(chain_id) {
                continue;
            }
            let hc = self
                .store
                .host_chain(chain_id)
                .ok_or_else(|| LiquidStakeError::HostChainNotFound(chain_id.to_string()))?;
            chains.insert(chain_id.clone(), hc);
        }

        let mut credited: Vec<ChainId> = Vec::new();
        for mut deposit in deposits {
            deposit.mark_received()?;
            if !credited.contains(&deposit.chain_id) {
                if let Some(hc) = chains.get_mut(&deposit.chain_id) {
                    hc.delegation_account.balance.checked_add_amount(amount)?;
                    self.store.set_host_chain(hc.clone());
                }
                credited.push(deposit.chain_id.clone());
            }
            info!(
                chain_id = %deposit.chain_id,
                sequence = %sequence_id,
                "[lsibc] Delegation deposit received"
            );
            self.emit(LiquidStakeEvent::StakingDepositTransferReceived {
                chain_id: deposit.chain_id.clone(),
                sequence_id: sequence_id.clone(),
            });
            self.store.set_deposit(deposit);
        }

        for mut deposit in lsm_deposits {
            deposit.mark_received()?;
            self.emit(LiquidStakeEvent::LsmDepositTransferReceived {
                chain_id: deposit.chain_id.clone(),
                sequence_id: sequence_id.clone(),
            });
            self.store.set_lsm_deposit(deposit);
        }
        Ok(())
    }

    fn handle_timeout(
        &self,
        packet: &Packet,
        transport_error: Option<&TransportError>,
    ) -> LiquidStakeResult<()> {
        if let Some(e) = transport_error {
            return Err(LiquidStakeError::Transport(e.to_string()));
        }
        let data = packet.transfer_data()?;
        if data.sender != self.config.deposit_address() {
            return Ok(());
        }

        let sequence_id = packet.source_sequence_id();
        for mut deposit in self.store.deposits_with_sequence(&sequence_id) {
            deposit.revert()?;
            self.emit(LiquidStakeEvent::StakingDepositTransferTimeout {
                chain_id: deposit.chain_id.clone(),
                sequence_id: sequence_id.clone(),
            });
            self.store.set_deposit(deposit);
        }
        for mut deposit in self.store.lsm_deposits_with_sequence(&sequence_id) {
            deposit.revert()?;
            self.emit(LiquidStakeEvent::LsmDepositTransferTimeout {
                chain_id: deposit.chain_id.clone(),
                sequence_id: sequence_id.clone(),
            });
            self.store.set_lsm_deposit(deposit);
        }

        info!(sequence = %sequence_id, "[lsibc] Deposit transfer timed out");
        Ok(())
    }
}

impl<S, T, R, B, Q> TransferHooks for LiquidStakeService<S, T, R, B, Q>
where
    S: LiquidStakeStore,
    T: TransferRouter,
    R: RemoteTxExecutor,
    B: BankGateway,
    Q: BalanceQuerier,
{
    fn on_recv_transfer_packet(
        &self,
        _ctx: &BlockContext,
        packet: &Packet,
        _relayer: &str,
        ack: &Acknowledgement,
    ) -> LiquidStakeResult<()> {
        self.handle_recv(packet, ack)
            .inspect_err(|_| metrics::record_callback_error("recv_transfer"))
    }

    fn on_acknowledgement_transfer_packet(
        &self,
        _ctx: &BlockContext,
        packet: &Packet,
        acknowledgement: &[u8],
        _relayer: &str,
        transport_error: Option<&TransportError>,
    ) -> LiquidStakeResult<()> {
        self.handle_acknowledgement(packet, acknowledgement, transport_error)
            .inspect_err(|_| metrics::record_callback_error("acknowledgement_transfer"))
    }

    fn on_timeout_transfer_packet(
        &self,
        _ctx: &BlockContext,
        packet: &Packet,
        _relayer: &str,
        transport_error: Option<&TransportError>,
    ) -> LiquidStakeResult<()> {
        self.handle_timeout(packet, transport_error)
            .inspect_err(|_| metrics::record_callback_error("timeout_transfer"))
    }
}
