//! Exchange value (C value) updates.

use super::LiquidStakeService;
use crate::algorithms::{c_value_within_limits, compute_c_value};
use crate::domain::{
    Amount, ChainId, DepositState, HostChain, LiquidStakeError, LiquidStakeResult,
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
    /// Recompute the C value of every registered chain.
    pub fn update_c_values(&self) {
        for hc in self.store.all_host_chains() {
            if let Err(e) = self.update_c_value(&hc.chain_id) {
                warn!(chain_id = %hc.chain_id, error = %e, "[lsibc] C value not updated");
            }
        }
    }

    /// Recompute one chain's C value, deactivating the chain when it falls
    /// outside the configured limits.
    pub fn update_c_value(&self, chain_id: &ChainId) -> LiquidStakeResult<()> {
        let mut hc = self
            .store
            .host_chain(chain_id)
            .ok_or_else(|| LiquidStakeError::HostChainNotFound(chain_id.to_string()))?;

        let staked = self.staked_amount(&hc);
        let minted = self.bank.total_supply(&hc.mint_denom());
        let c_value = compute_c_value(minted, staked);

        hc.last_c_value = hc.c_value;
        hc.c_value = c_value;

        let within = c_value_within_limits(
            c_value,
            self.config.lower_c_value_limit,
            self.config.upper_c_value_limit,
        );
        if within {
            self.emit(LiquidStakeEvent::CValueUpdated {
                chain_id: hc.chain_id.clone(),
                c_value,
            });
        } else if hc.active {
            hc.active = false;
            warn!(
                chain_id = %hc.chain_id,
                c_value = %c_value,
                "[lsibc] C value out of limits, disabling chain"
            );
            self.emit(LiquidStakeEvent::ChainDisabled {
                chain_id: hc.chain_id.clone(),
                c_value,
            });
        }

        info!(chain_id = %hc.chain_id, c_value = %c_value, minted = %minted, staked = %staked, "[lsibc] C value updated");
        self.store.set_host_chain(hc);
        Ok(())
    }

    fn staked_amount(&self, hc: &HostChain) -> Amount {
        let pending: Amount = self
            .store
            .all_deposits()
            .into_iter()
            .filter(|d| d.chain_id == hc.chain_id && d.state != DepositState::Received)
            .fold(0, |acc: Amount, d| acc.saturating_add(d.amount.amount));
        hc.total_delegated()
            .saturating_add(hc.delegation_account.balance.amount)
            .saturating_add(pending)
    }
}
