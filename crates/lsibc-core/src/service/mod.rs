//! # Liquid-Stake Service
//!
//! Epoch workflows and the callback reconciler, wired to the outbound
//! ports. One instance serves every registered host chain.
//!
//! Workflows are scoped per chain or per record: a failing iteration is
//! logged and the loop moves on. Callback handlers are scoped to one packet
//! and propagate genuine errors.

mod c_value;
mod deposits;
mod hooks;
mod maturity;
mod rebalance;
mod reconciler;
mod remote_tx;
mod rewards;
mod undelegation;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::config::LiquidStakeConfig;
use crate::domain::{
    Amount, BlockContext, ChannelId, Coin, Deposit, EpochIdentifier, HostChain, LiquidStakeError,
    LiquidStakeResult, MsgTransfer, TRANSFER_PORT,
};
use crate::events::{EventManager, LiquidStakeEvent};
use crate::ports::outbound::{
    BalanceQuerier, BankGateway, LiquidStakeStore, RemoteTxExecutor, TransferRouter,
};
use std::sync::Arc;

pub use reconciler::InboundTransfer;

/// Liquid-stake reconciliation engine.
pub struct LiquidStakeService<S, T, R, B, Q>
where
    S: LiquidStakeStore,
    T: TransferRouter,
    R: RemoteTxExecutor,
    B: BankGateway,
    Q: BalanceQuerier,
{
    config: LiquidStakeConfig,
    store: Arc<S>,
    transfers: Arc<T>,
    remote: Arc<R>,
    bank: Arc<B>,
    queries: Arc<Q>,
    events: EventManager,
}

impl<S, T, R, B, Q> LiquidStakeService<S, T, R, B, Q>
where
    S: LiquidStakeStore,
    T: TransferRouter,
    R: RemoteTxExecutor,
    B: BankGateway,
    Q: BalanceQuerier,
{
    /// Create a new service.
    pub fn new(
        config: LiquidStakeConfig,
        store: Arc<S>,
        transfers: Arc<T>,
        remote: Arc<R>,
        bank: Arc<B>,
        queries: Arc<Q>,
    ) -> Self {
        Self {
            config,
            store,
            transfers,
            remote,
            bank,
            queries,
            events: EventManager::new(),
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &LiquidStakeConfig {
        &self.config
    }

    /// State store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Events emitted so far.
    pub fn events(&self) -> Vec<LiquidStakeEvent> {
        self.events.events()
    }

    /// Drain emitted events.
    pub fn take_events(&self) -> Vec<LiquidStakeEvent> {
        self.events.take_events()
    }

    fn emit(&self, event: LiquidStakeEvent) {
        self.events.emit(event);
    }

    /// Outbound transfer from the deposit module, timing out after the
    /// configured duration.
    fn deposit_transfer(
        &self,
        ctx: &BlockContext,
        channel: &ChannelId,
        token: Coin,
        receiver: &str,
    ) -> MsgTransfer {
        MsgTransfer {
            source_port: TRANSFER_PORT.to_string(),
            source_channel: channel.clone(),
            token,
            sender: self.config.deposit_address(),
            receiver: receiver.to_string(),
            timeout_timestamp: ctx.timeout_after(self.config.ibc_timeout_secs),
            memo: String::new(),
        }
    }

    /// Add `amount` to the deposit of the current delegation epoch.
    fn credit_current_deposit(&self, hc: &HostChain, amount: Amount) -> LiquidStakeResult<Deposit> {
        let mut deposit = self.current_deposit(hc)?;
        deposit.amount.checked_add_amount(amount)?;
        self.store.set_deposit(deposit.clone());
        tracing::debug!(
            chain_id = %hc.chain_id,
            epoch = deposit.epoch,
            amount = %amount,
            "[lsibc] Deposit credited"
        );
        Ok(deposit)
    }

    fn current_deposit(&self, hc: &HostChain) -> LiquidStakeResult<Deposit> {
        let epoch = self.store.epoch_number(EpochIdentifier::Delegation);
        self.store
            .deposit(&hc.chain_id, epoch)
            .ok_or_else(|| LiquidStakeError::DepositNotFound {
                chain_id: hc.chain_id.to_string(),
                epoch,
            })
    }
}
