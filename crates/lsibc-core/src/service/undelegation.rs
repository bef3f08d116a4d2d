//! Undelegation pipeline and validator lifecycle manager.

use super::LiquidStakeService;
use crate::algorithms::{allocate_undelegation, redistribute_weight};
use crate::domain::{
    encode_messages, Coin, HostChain, LiquidStakeResult, RemoteMsg, SequenceId, Unbonding,
    UnbondingState, ValidatorUnbonding,
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
    /// Submit the aggregated unbonding of the current bucket for every
    /// active chain whose unbonding epoch this is.
    pub fn undelegation_workflow(&self, epoch: i64) {
        for hc in self.store.all_host_chains() {
            if !hc.active || !hc.is_unbonding_epoch(epoch) {
                continue;
            }

            let bucket = hc.current_unbonding_epoch(epoch);
            let Some(mut unbonding) = self.store.unbonding(&hc.chain_id, bucket) else {
                debug!(chain_id = %hc.chain_id, epoch = bucket, "[lsibc] No unbonding for epoch");
                continue;
            };
            if unbonding.state != UnbondingState::Pending || unbonding.unbond_amount.is_zero() {
                continue;
            }

            match self.submit_undelegation(&hc, &unbonding) {
                Ok((messages, sequence_id)) => {
                    if let Err(e) = unbonding.mark_initiated(sequence_id.clone()) {
                        warn!(chain_id = %hc.chain_id, error = %e, "[lsibc] Unbonding not updated");
                        continue;
                    }
                    let encoded = encode_messages(&messages).unwrap_or_default();
                    info!(
                        chain_id = %hc.chain_id,
                        epoch = bucket,
                        amount = %unbonding.unbond_amount.amount,
                        sequence = %sequence_id,
                        "[lsibc] Undelegation initiated"
                    );
                    self.emit(LiquidStakeEvent::UndelegationWorkflow {
                        chain_id: hc.chain_id.clone(),
                        epoch: bucket,
                        unbond_amount: unbonding.unbond_amount.clone(),
                        burn_amount: unbonding.burn_amount.clone(),
                        messages: encoded,
                        sequence_id,
                    });
                    self.store.set_unbonding(unbonding);
                }
                Err(e) => {
                    warn!(chain_id = %hc.chain_id, epoch = bucket, error = %e, "[lsibc] Undelegation could not be initiated");
                    if let Err(e) = unbonding.mark_failed() {
                        warn!(chain_id = %hc.chain_id, error = %e, "[lsibc] Unbonding not updated");
                        continue;
                    }
                    self.store.set_unbonding(unbonding);
                    metrics::record_undelegation_failure(hc.chain_id.as_str());
                    self.emit(LiquidStakeEvent::UnsuccessfulUndelegationInitiation {
                        chain_id: hc.chain_id.clone(),
                        epoch: bucket,
                    });
                }
            }
        }
    }

    fn submit_undelegation(
        &self,
        hc: &HostChain,
        unbonding: &Unbonding,
    ) -> LiquidStakeResult<(Vec<RemoteMsg>, SequenceId)> {
        // Force-unbonds still awaiting their ack have not reduced the
        // confirmed delegations yet.
        let mut validators = hc.validators.clone();
        for pending in self
            .store
            .all_validator_unbondings()
            .into_iter()
            .filter(|u| u.chain_id == hc.chain_id && u.sequence_id.is_some())
        {
            if let Some(v) = validators
                .iter_mut()
                .find(|v| v.operator_address == pending.validator_address)
            {
                v.delegated_amount = v.delegated_amount.saturating_sub(pending.amount.amount);
            }
        }

        let allocation = allocate_undelegation(&validators, unbonding.unbond_amount.amount)?;
        let messages: Vec<RemoteMsg> = allocation
            .into_iter()
            .map(|(validator, amount)| RemoteMsg::Undelegate {
                delegator_address: hc.delegation_account.address.clone(),
                validator_address: validator,
                amount: Coin::new(hc.host_denom.clone(), amount),
            })
            .collect();
        let sequence_id = self.remote.execute(
            &hc.connection_id,
            &hc.delegation_account.owner,
            &messages,
        )?;
        Ok((messages, sequence_id))
    }

    /// Force-unbond validators that have been unbonding for longer than the
    /// configured epoch limit.
    pub fn validator_undelegation_workflow(&self, epoch: i64) {
        let limit = self.config.unbonding_state_epoch_limit;

        for mut hc in self.store.all_host_chains() {
            if !hc.active || !hc.is_unbonding_epoch(epoch) {
                continue;
            }

            let in_flight: Vec<String> = self
                .store
                .all_validator_unbondings()
                .into_iter()
                .filter(|u| u.chain_id == hc.chain_id)
                .map(|u| u.validator_address)
                .collect();

            let candidates: Vec<(String, u128)> = hc
                .validators
                .iter()
                .filter(|v| v.is_unbonding() && v.unbonding_epoch + limit <= epoch)
                .filter(|v| v.delegated_amount > 0)
                .filter(|v| !in_flight.contains(&v.operator_address))
                .map(|v| (v.operator_address.clone(), v.delegated_amount))
                .collect();

            let mut changed = false;
            for (validator, amount) in candidates {
                let coin = Coin::new(hc.host_denom.clone(), amount);
                let messages = vec![RemoteMsg::Undelegate {
                    delegator_address: hc.delegation_account.address.clone(),
                    validator_address: validator.clone(),
                    amount: coin.clone(),
                }];
                let sequence_id = match self.remote.execute(
                    &hc.connection_id,
                    &hc.delegation_account.owner,
                    &messages,
                ) {
                    Ok(sequence_id) => sequence_id,
                    Err(e) => {
                        warn!(
                            chain_id = %hc.chain_id,
                            validator = %validator,
                            error = %e,
                            "[lsibc] Validator undelegation could not be submitted"
                        );
                        continue;
                    }
                };

                self.store.set_validator_unbonding(ValidatorUnbonding {
                    chain_id: hc.chain_id.clone(),
                    validator_address: validator.clone(),
                    epoch_number: epoch,
                    amount: coin.clone(),
                    mature_time: 0,
                    sequence_id: Some(sequence_id.clone()),
                    transfer_sequence_id: None,
                });
                if !redistribute_weight(&mut hc.validators, &validator) {
                    debug!(chain_id = %hc.chain_id, validator = %validator, "[lsibc] No weight to redistribute");
                }
                changed = true;
                metrics::record_validator_unbonding(hc.chain_id.as_str());

                info!(
                    chain_id = %hc.chain_id,
                    validator = %validator,
                    amount = %amount,
                    sequence = %sequence_id,
                    "[lsibc] Validator undelegation submitted"
                );
                self.emit(LiquidStakeEvent::ValidatorUndelegationWorkflow {
                    chain_id: hc.chain_id.clone(),
                    epoch,
                    validator_address: validator,
                    amount: coin,
                    sequence_id,
                });
            }

            if changed {
                self.store.set_host_chain(hc);
            }
        }
    }
}
