//! Rewards pipeline and autocompounding settlement.

use super::LiquidStakeService;
use crate::algorithms::split_restake_fee;
use crate::domain::{
    encode_messages, Amount, Coin, HostChain, LiquidStakeError, LiquidStakeResult, RemoteMsg,
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
    /// Withdraw validator rewards on every active chain and query the
    /// rewards balances.
    pub fn rewards_workflow(&self, epoch: i64) {
        for hc in self.store.all_host_chains() {
            if !hc.active {
                continue;
            }

            let messages: Vec<RemoteMsg> = hc
                .validators
                .iter()
                .filter(|v| v.delegated_amount > 0)
                .map(|v| RemoteMsg::WithdrawReward {
                    delegator_address: hc.delegation_account.address.clone(),
                    validator_address: v.operator_address.clone(),
                })
                .collect();

            if !messages.is_empty() {
                match self.remote.execute(
                    &hc.connection_id,
                    &hc.delegation_account.owner,
                    &messages,
                ) {
                    Ok(sequence_id) => {
                        info!(
                            chain_id = %hc.chain_id,
                            epoch,
                            sequence = %sequence_id,
                            "[lsibc] Reward withdrawal submitted"
                        );
                        self.emit(LiquidStakeEvent::RewardsWorkflow {
                            chain_id: hc.chain_id.clone(),
                            epoch,
                            messages: encode_messages(&messages).unwrap_or_default(),
                        });
                    }
                    Err(e) => {
                        warn!(chain_id = %hc.chain_id, epoch, error = %e, "[lsibc] Reward withdrawal could not be submitted");
                        continue;
                    }
                }
            }

            if !hc.rewards_account_live() {
                continue;
            }
            if hc.reward_params.is_some() {
                if let Err(e) = self.queries.query_non_compoundable_rewards_balance(&hc) {
                    warn!(chain_id = %hc.chain_id, error = %e, "[lsibc] Non-compoundable balance query failed");
                }
            }
            if let Err(e) = self.queries.query_rewards_balance(&hc) {
                warn!(chain_id = %hc.chain_id, error = %e, "[lsibc] Rewards balance query failed");
            }
        }
    }

    /// Take the restake fee from autocompounded rewards and pool the rest
    /// into the current deposit.
    pub(super) fn settle_autocompound(&self, hc: &HostChain, amount: Amount) -> LiquidStakeResult<()> {
        self.current_deposit(hc)?;

        let (fee, credited) = split_restake_fee(amount, hc.params.restake_fee);
        let fee_coin = Coin::new(hc.ibc_denom(), fee);

        if fee > 0 {
            self.bank
                .send_from_module(
                    &self.config.deposit_module,
                    &hc.params.fee_address,
                    &fee_coin,
                )
                .map_err(|e| LiquidStakeError::FeeTransfer {
                    address: hc.params.fee_address.clone(),
                    reason: e.to_string(),
                })?;
        }

        self.credit_current_deposit(hc, credited)?;
        self.update_c_value(&hc.chain_id)?;

        info!(
            chain_id = %hc.chain_id,
            amount = %amount,
            fee = %fee,
            "[lsibc] Autocompounded rewards received"
        );
        self.emit(LiquidStakeEvent::AutocompoundRewardsReceived {
            chain_id: hc.chain_id.clone(),
            transfer: Coin::new(hc.host_denom.clone(), amount),
            fee: Coin::new(hc.host_denom.clone(), fee),
        });
        Ok(())
    }
}
