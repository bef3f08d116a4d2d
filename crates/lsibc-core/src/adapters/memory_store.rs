//! In-Memory Store Adapter
//!
//! Implements the `LiquidStakeStore` port over ordered maps.

use crate::domain::{
    ChainId, Deposit, EpochIdentifier, HostChain, LsmDeposit, RedelegateTx, SequenceId, Unbonding,
    ValidatorUnbonding,
};
use crate::ports::outbound::LiquidStakeStore;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// In-memory protocol state.
///
/// Maps are ordered by record key so listings are deterministic.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<StoreData>,
}

#[derive(Default)]
struct StoreData {
    host_chains: BTreeMap<ChainId, HostChain>,
    epochs: HashMap<EpochIdentifier, i64>,
    deposits: BTreeMap<(ChainId, i64), Deposit>,
    lsm_deposits: BTreeMap<u64, LsmDeposit>,
    unbondings: BTreeMap<(ChainId, i64), Unbonding>,
    validator_unbondings: BTreeMap<(ChainId, String, i64), ValidatorUnbonding>,
    redelegate_txs: BTreeMap<(ChainId, SequenceId), RedelegateTx>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LiquidStakeStore for InMemoryStore {
    fn host_chain(&self, chain_id: &ChainId) -> Option<HostChain> {
        self.inner.read().host_chains.get(chain_id).cloned()
    }

    fn all_host_chains(&self) -> Vec<HostChain> {
        self.inner.read().host_chains.values().cloned().collect()
    }

    fn set_host_chain(&self, host_chain: HostChain) {
        self.inner
            .write()
            .host_chains
            .insert(host_chain.chain_id.clone(), host_chain);
    }

    fn epoch_number(&self, identifier: EpochIdentifier) -> i64 {
        self.inner
            .read()
            .epochs
            .get(&identifier)
            .copied()
            .unwrap_or(0)
    }

    fn set_epoch_number(&self, identifier: EpochIdentifier, number: i64) {
        self.inner.write().epochs.insert(identifier, number);
    }

    fn deposit(&self, chain_id: &ChainId, epoch: i64) -> Option<Deposit> {
        self.inner
            .read()
            .deposits
            .get(&(chain_id.clone(), epoch))
            .cloned()
    }

    fn all_deposits(&self) -> Vec<Deposit> {
        self.inner.read().deposits.values().cloned().collect()
    }

    fn set_deposit(&self, deposit: Deposit) {
        self.inner
            .write()
            .deposits
            .insert((deposit.chain_id.clone(), deposit.epoch), deposit);
    }

    fn delete_deposit(&self, chain_id: &ChainId, epoch: i64) {
        debug!(chain_id = %chain_id, epoch, "[lsibc] Deleting deposit");
        self.inner
            .write()
            .deposits
            .remove(&(chain_id.clone(), epoch));
    }

    fn all_lsm_deposits(&self) -> Vec<LsmDeposit> {
        self.inner.read().lsm_deposits.values().cloned().collect()
    }

    fn set_lsm_deposit(&self, deposit: LsmDeposit) {
        self.inner.write().lsm_deposits.insert(deposit.id, deposit);
    }

    fn unbonding(&self, chain_id: &ChainId, epoch: i64) -> Option<Unbonding> {
        self.inner
            .read()
            .unbondings
            .get(&(chain_id.clone(), epoch))
            .cloned()
    }

    fn all_unbondings(&self) -> Vec<Unbonding> {
        self.inner.read().unbondings.values().cloned().collect()
    }

    fn set_unbonding(&self, unbonding: Unbonding) {
        self.inner.write().unbondings.insert(
            (unbonding.chain_id.clone(), unbonding.epoch_number),
            unbonding,
        );
    }

    fn all_validator_unbondings(&self) -> Vec<ValidatorUnbonding> {
        self.inner
            .read()
            .validator_unbondings
            .values()
            .cloned()
            .collect()
    }

    fn set_validator_unbonding(&self, unbonding: ValidatorUnbonding) {
        let key = (
            unbonding.chain_id.clone(),
            unbonding.validator_address.clone(),
            unbonding.epoch_number,
        );
        self.inner.write().validator_unbondings.insert(key, unbonding);
    }

    fn delete_validator_unbonding(&self, chain_id: &ChainId, validator_address: &str, epoch: i64) {
        self.inner.write().validator_unbondings.remove(&(
            chain_id.clone(),
            validator_address.to_string(),
            epoch,
        ));
    }

    fn redelegate_tx(&self, chain_id: &ChainId, sequence_id: &SequenceId) -> Option<RedelegateTx> {
        self.inner
            .read()
            .redelegate_txs
            .get(&(chain_id.clone(), sequence_id.clone()))
            .cloned()
    }

    fn all_redelegate_txs(&self) -> Vec<RedelegateTx> {
        self.inner.read().redelegate_txs.values().cloned().collect()
    }

    fn set_redelegate_tx(&self, tx: RedelegateTx) {
        self.inner
            .write()
            .redelegate_txs
            .insert((tx.chain_id.clone(), tx.sequence_id.clone()), tx);
    }
}
