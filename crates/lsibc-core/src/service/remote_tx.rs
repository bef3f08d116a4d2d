//! Remote-transaction reconciler.
//!
//! Resolves acknowledgements and timeouts of batches executed through the
//! remote accounts. A timeout is handled like a rejected transaction.

use super::LiquidStakeService;
use crate::domain::{
    BlockContext, ChainId, HostChain, LiquidStakeError, LiquidStakeResult, Packet, RedelegateTxState,
    RemoteMsg, RemoteTxOutcome, SequenceId, UnbondingState,
};
use crate::events::LiquidStakeEvent;
use crate::metrics;
use crate::ports::inbound::RemoteTxHooks;
use crate::ports::outbound::{
    BalanceQuerier, BankGateway, LiquidStakeStore, RemoteTxExecutor, TransferRouter,
};
use tracing::{debug, info, warn};

impl<S, T, R, B, Q> LiquidStakeService<S, T, R, B, Q>
where
    S: LiquidStakeStore,
    T: TransferRouter,
    R: RemoteTxExecutor,
    B: BankGateway,
    Q: BalanceQuerier,
{
    fn resolve_remote_tx(
        &self,
        ctx: &BlockContext,
        packet: &Packet,
        outcome: &RemoteTxOutcome,
    ) -> LiquidStakeResult<()> {
        let sequence_id = packet.source_sequence_id();
        let success = outcome.is_success();
        let kinds = packet
            .remote_tx_data()
            .map(|data| {
                data.messages
                    .iter()
                    .map(RemoteMsg::kind)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default();
        debug!(sequence = %sequence_id, success, messages = %kinds, "[lsibc] Resolving remote transaction");

        let mut matched = self.resolve_unbondings(ctx, packet, &sequence_id, outcome)?;
        matched |= self.resolve_validator_unbondings(ctx, &sequence_id, outcome)?;
        matched |= self.resolve_redelegations(packet, &sequence_id, success)?;

        if !matched {
            debug!(sequence = %sequence_id, "[lsibc] No record waiting on remote transaction");
        }
        Ok(())
    }

    fn resolve_unbondings(
        &self,
        ctx: &BlockContext,
        packet: &Packet,
        sequence_id: &SequenceId,
        outcome: &RemoteTxOutcome,
    ) -> LiquidStakeResult<bool> {
        let unbondings = self.store.unbondings_with_sequence(sequence_id);
        let matched = !unbondings.is_empty();

        for mut unbonding in unbondings {
            match (unbonding.state, outcome) {
                (UnbondingState::Initiated, RemoteTxOutcome::Success(_)) => {
                    let mature_time = outcome.latest_completion_time().unwrap_or(ctx.time);
                    self.reduce_delegations(&unbonding.chain_id, packet)?;
                    unbonding.record_maturity(mature_time);
                    info!(
                        chain_id = %unbonding.chain_id,
                        epoch = unbonding.epoch_number,
                        mature_time,
                        "[lsibc] Undelegation confirmed"
                    );
                }
                (UnbondingState::Initiated, RemoteTxOutcome::Error(reason)) => {
                    warn!(chain_id = %unbonding.chain_id, epoch = unbonding.epoch_number, reason = %reason, "[lsibc] Undelegation failed");
                    unbonding.mark_failed()?;
                    metrics::record_undelegation_failure(unbonding.chain_id.as_str());
                    self.emit(LiquidStakeEvent::UndelegationFailed {
                        chain_id: unbonding.chain_id.clone(),
                        epoch: unbonding.epoch_number,
                    });
                }
                (UnbondingState::Matured, RemoteTxOutcome::Error(reason)) => {
                    warn!(chain_id = %unbonding.chain_id, epoch = unbonding.epoch_number, reason = %reason, "[lsibc] Matured unbonding transfer failed");
                    unbonding.revert_maturity()?;
                }
                // matured success is settled by the inbound transfer
                _ => continue,
            }
            self.store.set_unbonding(unbonding);
        }
        Ok(matched)
    }

    /// Subtract confirmed undelegations from the validator delegations.
    fn reduce_delegations(&self, chain_id: &ChainId, packet: &Packet) -> LiquidStakeResult<()> {
        let data = packet.remote_tx_data()?;
        let mut hc = self.host_chain(chain_id)?;
        for msg in &data.messages {
            if let RemoteMsg::Undelegate {
                validator_address,
                amount,
                ..
            } = msg
            {
                if let Some(validator) = hc.validator_mut(validator_address) {
                    validator.delegated_amount =
                        validator.delegated_amount.saturating_sub(amount.amount);
                }
            }
        }
        self.store.set_host_chain(hc);
        Ok(())
    }

    fn resolve_validator_unbondings(
        &self,
        ctx: &BlockContext,
        sequence_id: &SequenceId,
        outcome: &RemoteTxOutcome,
    ) -> LiquidStakeResult<bool> {
        let mut matched = false;
        for mut unbonding in self.store.all_validator_unbondings() {
            if unbonding.sequence_id.as_ref() == Some(sequence_id) {
                matched = true;
                if outcome.is_success() {
                    let mut hc = self.host_chain(&unbonding.chain_id)?;
                    if let Some(validator) = hc.validator_mut(&unbonding.validator_address) {
                        validator.delegated_amount = validator
                            .delegated_amount
                            .saturating_sub(unbonding.amount.amount);
                    }
                    self.store.set_host_chain(hc);
                    unbonding.mature_time = outcome.latest_completion_time().unwrap_or(ctx.time);
                    unbonding.sequence_id = None;
                    info!(
                        chain_id = %unbonding.chain_id,
                        validator = %unbonding.validator_address,
                        "[lsibc] Validator undelegation confirmed"
                    );
                    self.store.set_validator_unbonding(unbonding);
                } else {
                    warn!(
                        chain_id = %unbonding.chain_id,
                        validator = %unbonding.validator_address,
                        "[lsibc] Validator undelegation failed, retrying next unbonding epoch"
                    );
                    self.store.delete_validator_unbonding(
                        &unbonding.chain_id,
                        &unbonding.validator_address,
                        unbonding.epoch_number,
                    );
                }
            } else if unbonding.transfer_sequence_id.as_ref() == Some(sequence_id) {
                matched = true;
                if outcome.is_success() {
                    self.store.delete_validator_unbonding(
                        &unbonding.chain_id,
                        &unbonding.validator_address,
                        unbonding.epoch_number,
                    );
                } else {
                    unbonding.transfer_sequence_id = None;
                    self.store.set_validator_unbonding(unbonding);
                }
            }
        }
        Ok(matched)
    }

    fn resolve_redelegations(
        &self,
        packet: &Packet,
        sequence_id: &SequenceId,
        success: bool,
    ) -> LiquidStakeResult<bool> {
        let Some(mut tx) = self
            .store
            .all_redelegate_txs()
            .into_iter()
            .find(|tx| &tx.sequence_id == sequence_id)
        else {
            return Ok(false);
        };
        if tx.state != RedelegateTxState::Sent {
            return Ok(true);
        }

        if success {
            let data = packet.remote_tx_data()?;
            let mut hc = self.host_chain(&tx.chain_id)?;
            for msg in &data.messages {
                if let RemoteMsg::Redelegate {
                    validator_src_address,
                    validator_dst_address,
                    amount,
                    ..
                } = msg
                {
                    move_delegation(&mut hc, validator_src_address, validator_dst_address, amount.amount);
                }
            }
            self.store.set_host_chain(hc);
        }

        tx.resolve(success)?;
        self.emit(LiquidStakeEvent::RedelegationResolved {
            chain_id: tx.chain_id.clone(),
            sequence_id: tx.sequence_id.clone(),
            success,
        });
        self.store.set_redelegate_tx(tx);
        Ok(true)
    }

    fn host_chain(&self, chain_id: &ChainId) -> LiquidStakeResult<HostChain> {
        self.store
            .host_chain(chain_id)
            .ok_or_else(|| LiquidStakeError::HostChainNotFound(chain_id.to_string()))
    }
}

fn move_delegation(hc: &mut HostChain, src: &str, dst: &str, amount: u128) {
    if let Some(validator) = hc.validator_mut(src) {
        validator.delegated_amount = validator.delegated_amount.saturating_sub(amount);
    }
    if let Some(validator) = hc.validator_mut(dst) {
        validator.delegated_amount = validator.delegated_amount.saturating_add(amount);
    }
}

impl<S, T, R, B, Q> RemoteTxHooks for LiquidStakeService<S, T, R, B, Q>
where
    S: LiquidStakeStore,
    T: TransferRouter,
    R: RemoteTxExecutor,
    B: BankGateway,
    Q: BalanceQuerier,
{
    fn on_remote_tx_acknowledgement(
        &self,
        ctx: &BlockContext,
        packet: &Packet,
        outcome: &RemoteTxOutcome,
    ) -> LiquidStakeResult<()> {
        self.resolve_remote_tx(ctx, packet, outcome)
            .inspect_err(|_| metrics::record_callback_error("remote_tx_acknowledgement"))
    }

    fn on_remote_tx_timeout(&self, ctx: &BlockContext, packet: &Packet) -> LiquidStakeResult<()> {
        let outcome = RemoteTxOutcome::Error("timeout".to_string());
        self.resolve_remote_tx(ctx, packet, &outcome)
            .inspect_err(|_| metrics::record_callback_error("remote_tx_timeout"))
    }
}
