//! Maturity pass: brings unbonded funds back from the host chains.

use super::LiquidStakeService;
use crate::domain::{
    Amount, BlockContext, Coin, HostChain, MsgTransfer, RemoteMsg, UnbondingState, TRANSFER_PORT,
};
use crate::events::LiquidStakeEvent;
use crate::ports::outbound::{
    BalanceQuerier, BankGateway, LiquidStakeStore, RemoteTxExecutor, TransferRouter,
};
use tracing::{info, warn};

impl<S, T, R, B, Q> LiquidStakeService<S, T, R, B, Q>
where
    S: LiquidStakeStore,
    T: TransferRouter,
    R: RemoteTxExecutor,
    B: BankGateway,
    Q: BalanceQuerier,
{
    /// Transfer matured unbondings of every active chain back to the local
    /// chain.
    pub fn maturity_pass(&self, ctx: &BlockContext) {
        for hc in self.store.all_host_chains() {
            if !hc.active {
                continue;
            }
            self.transfer_matured_unbondings(ctx, &hc);
            self.transfer_matured_validator_unbondings(ctx, &hc);
        }
    }

    fn transfer_matured_unbondings(&self, ctx: &BlockContext, hc: &HostChain) {
        let matured: Vec<_> = self
            .store
            .unbondings_in_state(&hc.chain_id, UnbondingState::Initiated)
            .into_iter()
            .filter(|u| u.is_mature(ctx.time))
            .collect();
        let total = matured
            .iter()
            .fold(0 as Amount, |acc, u| acc.saturating_add(u.unbond_amount.amount));
        if total == 0 {
            return;
        }

        let amount = Coin::new(hc.host_denom.clone(), total);
        let msg = self.remote_transfer(ctx, hc, amount.clone(), self.config.undelegation_address());
        let sequence_id = match self.remote.execute(
            &hc.connection_id,
            &hc.delegation_account.owner,
            &[msg],
        ) {
            Ok(sequence_id) => sequence_id,
            Err(e) => {
                warn!(chain_id = %hc.chain_id, error = %e, "[lsibc] Matured unbonding transfer could not be submitted");
                return;
            }
        };

        for mut unbonding in matured {
            if let Err(e) = unbonding.mark_matured(sequence_id.clone()) {
                warn!(chain_id = %hc.chain_id, epoch = unbonding.epoch_number, error = %e, "[lsibc] Unbonding not updated");
                continue;
            }
            self.store.set_unbonding(unbonding);
        }

        info!(chain_id = %hc.chain_id, amount = %total, sequence = %sequence_id, "[lsibc] Matured unbondings transferred");
        self.emit(LiquidStakeEvent::UnbondingTransferSent {
            chain_id: hc.chain_id.clone(),
            amount,
            sequence_id,
        });
    }

    fn transfer_matured_validator_unbondings(&self, ctx: &BlockContext, hc: &HostChain) {
        let matured = self
            .store
            .all_validator_unbondings()
            .into_iter()
            .filter(|u| u.chain_id == hc.chain_id && u.is_mature(ctx.time));

        for mut unbonding in matured {
            let msg = self.remote_transfer(
                ctx,
                hc,
                unbonding.amount.clone(),
                self.config.deposit_address(),
            );
            let sequence_id = match self.remote.execute(
                &hc.connection_id,
                &hc.delegation_account.owner,
                &[msg],
            ) {
                Ok(sequence_id) => sequence_id,
                Err(e) => {
                    warn!(
                        chain_id = %hc.chain_id,
                        validator = %unbonding.validator_address,
                        error = %e,
                        "[lsibc] Validator unbonding transfer could not be submitted"
                    );
                    continue;
                }
            };

            unbonding.transfer_sequence_id = Some(sequence_id.clone());
            self.emit(LiquidStakeEvent::UnbondingTransferSent {
                chain_id: hc.chain_id.clone(),
                amount: unbonding.amount.clone(),
                sequence_id,
            });
            self.store.set_validator_unbonding(unbonding);
        }
    }

    /// Transfer out of the delegation account over the host side of the
    /// transfer channel.
    fn remote_transfer(
        &self,
        ctx: &BlockContext,
        hc: &HostChain,
        token: Coin,
        receiver: String,
    ) -> RemoteMsg {
        RemoteMsg::Transfer(MsgTransfer {
            source_port: TRANSFER_PORT.to_string(),
            source_channel: hc.counterparty_channel_id.clone(),
            token,
            sender: hc.delegation_account.address.clone(),
            receiver,
            timeout_timestamp: ctx.timeout_after(self.config.ibc_timeout_secs),
            memo: String::new(),
        })
    }
}
