//! Epoch hook dispatch.

use super::LiquidStakeService;
use crate::domain::{BlockContext, EpochIdentifier, LiquidStakeResult};
use crate::ports::inbound::EpochHooks;
use crate::ports::outbound::{
    BalanceQuerier, BankGateway, LiquidStakeStore, RemoteTxExecutor, TransferRouter,
};
use tracing::{debug, info};

impl<S, T, R, B, Q> EpochHooks for LiquidStakeService<S, T, R, B, Q>
where
    S: LiquidStakeStore,
    T: TransferRouter,
    R: RemoteTxExecutor,
    B: BankGateway,
    Q: BalanceQuerier,
{
    fn before_epoch_start(
        &self,
        ctx: &BlockContext,
        identifier: &str,
        number: i64,
    ) -> LiquidStakeResult<()> {
        let Ok(epoch) = identifier.parse::<EpochIdentifier>() else {
            debug!(identifier, "[lsibc] Ignoring epoch");
            return Ok(());
        };
        self.store.set_epoch_number(epoch, number);

        match epoch {
            EpochIdentifier::Delegation => {
                self.create_deposits(number);
                self.maturity_pass(ctx);
            }
            EpochIdentifier::CValue => self.update_c_values(),
            EpochIdentifier::Undelegation
            | EpochIdentifier::Rewards
            | EpochIdentifier::Redelegation => {}
        }
        Ok(())
    }

    fn after_epoch_end(
        &self,
        ctx: &BlockContext,
        identifier: &str,
        number: i64,
    ) -> LiquidStakeResult<()> {
        let Ok(epoch) = identifier.parse::<EpochIdentifier>() else {
            debug!(identifier, "[lsibc] Ignoring epoch");
            return Ok(());
        };
        info!(epoch = %epoch, number, "[lsibc] Epoch ended");

        match epoch {
            EpochIdentifier::Delegation => {
                self.deposit_workflow(ctx, number);
                self.lsm_workflow(ctx);
            }
            EpochIdentifier::Undelegation => {
                self.validator_undelegation_workflow(number);
                self.undelegation_workflow(number);
            }
            EpochIdentifier::Rewards => self.rewards_workflow(number),
            EpochIdentifier::Redelegation => self.rebalance_workflow(number),
            EpochIdentifier::CValue => {}
        }
        Ok(())
    }
}
