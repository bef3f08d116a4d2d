//! Rebalance pipeline.

use super::LiquidStakeService;
use crate::algorithms::generate_redelegations;
use crate::domain::{Coin, RedelegateTx, RedelegateTxState, RemoteMsg};
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
    /// Submit redelegations bringing each active chain towards its target
    /// weights, one remote transaction per move.
    pub fn rebalance_workflow(&self, epoch: i64) {
        info!(epoch, "[lsibc] Running redelegation workflow");

        for hc in self.store.all_host_chains() {
            if !hc.active {
                continue;
            }
            if hc.is_unbonding_epoch(epoch) {
                info!(chain_id = %hc.chain_id, epoch, "[lsibc] Redelegation epoch coincides with unbonding epoch, skipping");
                continue;
            }

            let in_flight = self
                .store
                .all_redelegate_txs()
                .into_iter()
                .any(|tx| tx.chain_id == hc.chain_id && tx.state == RedelegateTxState::Sent);
            if in_flight {
                info!(chain_id = %hc.chain_id, epoch, "[lsibc] Redelegation still in flight, skipping");
                continue;
            }

            let moves =
                generate_redelegations(&hc.validators, hc.params.redelegation_acceptable_delta);
            if moves.is_empty() {
                debug!(chain_id = %hc.chain_id, "[lsibc] No redelegations needed");
                continue;
            }

            for mv in moves {
                let amount = Coin::new(hc.host_denom.clone(), mv.amount);
                let messages = [RemoteMsg::Redelegate {
                    delegator_address: hc.delegation_account.address.clone(),
                    validator_src_address: mv.src.clone(),
                    validator_dst_address: mv.dst.clone(),
                    amount: amount.clone(),
                }];
                let sequence_id = match self.remote.execute(
                    &hc.connection_id,
                    &hc.delegation_account.owner,
                    &messages,
                ) {
                    Ok(sequence_id) => sequence_id,
                    Err(e) => {
                        warn!(chain_id = %hc.chain_id, src = %mv.src, dst = %mv.dst, error = %e, "[lsibc] Redelegation could not be submitted");
                        continue;
                    }
                };

                self.store
                    .set_redelegate_tx(RedelegateTx::new(hc.chain_id.clone(), sequence_id.clone()));
                metrics::record_redelegation_submitted();
                self.emit(LiquidStakeEvent::RedelegationWorkflow {
                    chain_id: hc.chain_id.clone(),
                    epoch,
                    src: mv.src,
                    dst: mv.dst,
                    amount,
                    sequence_id,
                });
            }
        }
    }
}
