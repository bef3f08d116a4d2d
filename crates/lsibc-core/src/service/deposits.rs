//! Deposit scheduler, deposit pipeline and LSM pipeline.

use super::LiquidStakeService;
use crate::domain::{
    Amount, BlockContext, Coin, Deposit, HostChain, MsgTransfer, SequenceId,
};
use crate::events::LiquidStakeEvent;
use crate::metrics;
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
    /// Open an empty deposit record for every registered chain.
    ///
    /// Existing records for the epoch are left untouched.
    pub fn create_deposits(&self, epoch: i64) {
        for hc in self.store.all_host_chains() {
            if self.store.deposit(&hc.chain_id, epoch).is_some() {
                continue;
            }
            debug!(chain_id = %hc.chain_id, epoch, "[lsibc] Creating deposit");
            self.store
                .set_deposit(Deposit::new(hc.chain_id.clone(), epoch, hc.ibc_denom()));
        }
    }

    /// Transfer every pending deposit up to `epoch` to its host chain.
    pub fn deposit_workflow(&self, ctx: &BlockContext, epoch: i64) {
        info!(epoch, "[lsibc] Running deposit workflow");

        for mut deposit in self.store.pending_deposits_up_to(epoch) {
            let Some(hc) = self.store.host_chain(&deposit.chain_id) else {
                debug!(chain_id = %deposit.chain_id, "[lsibc] Deposit for unregistered chain");
                continue;
            };

            if deposit.amount.is_zero() {
                if deposit.epoch < epoch {
                    self.store.delete_deposit(&deposit.chain_id, deposit.epoch);
                }
                continue;
            }

            if !hc.active {
                continue;
            }

            let msg = self.deposit_transfer(
                ctx,
                &hc.channel_id,
                deposit.amount.clone(),
                &hc.delegation_account.address,
            );
            let Some(sequence_id) = self.submit_transfer(&hc, &msg) else {
                continue;
            };

            if let Err(e) = deposit.mark_sent(sequence_id.clone()) {
                warn!(chain_id = %hc.chain_id, error = %e, "[lsibc] Deposit not updated");
                continue;
            }
            self.store.set_deposit(deposit.clone());
            metrics::record_deposit_sent();

            info!(
                chain_id = %hc.chain_id,
                epoch = deposit.epoch,
                amount = %deposit.amount.amount,
                sequence = %sequence_id,
                "[lsibc] Deposit sent"
            );
            self.emit(LiquidStakeEvent::DelegationWorkflow {
                chain_id: hc.chain_id.clone(),
                epoch: deposit.epoch,
                amount: Coin::new(hc.host_denom.clone(), deposit.amount.amount),
                sequence_id,
            });
        }
    }

    /// Transfer every pending LSM deposit of LSM-enabled chains, one
    /// transfer per deposit.
    pub fn lsm_workflow(&self, ctx: &BlockContext) {
        for hc in self.store.all_host_chains() {
            if !hc.active || !hc.flags.lsm {
                continue;
            }

            let mut total_shares: Amount = 0;
            for mut deposit in self.store.transferable_lsm_deposits(&hc.chain_id) {
                let msg = self.deposit_transfer(
                    ctx,
                    &hc.channel_id,
                    Coin::new(deposit.denom.clone(), deposit.shares),
                    &hc.delegation_account.address,
                );
                let Some(sequence_id) = self.submit_transfer(&hc, &msg) else {
                    continue;
                };
                if let Err(e) = deposit.mark_sent(sequence_id) {
                    warn!(chain_id = %hc.chain_id, id = deposit.id, error = %e, "[lsibc] LSM deposit not updated");
                    continue;
                }
                total_shares = total_shares.saturating_add(deposit.shares);
                self.store.set_lsm_deposit(deposit);
            }

            self.emit(LiquidStakeEvent::LsmWorkflow {
                chain_id: hc.chain_id.clone(),
                shares: total_shares,
            });
        }
    }

    /// Submit a transfer and derive its sequence id. Failures are logged.
    fn submit_transfer(&self, hc: &HostChain, msg: &MsgTransfer) -> Option<SequenceId> {
        let response = match self.transfers.transfer(msg) {
            Ok(response) => response,
            Err(e) => {
                warn!(chain_id = %hc.chain_id, error = %e, "[lsibc] Could not send transfer");
                return None;
            }
        };
        match response.transfer_sequence() {
            Ok(sequence) => Some(SequenceId::new(msg.source_channel.clone(), sequence)),
            Err(e) => {
                warn!(chain_id = %hc.chain_id, error = %e, "[lsibc] Could not decode transfer response");
                None
            }
        }
    }
}
