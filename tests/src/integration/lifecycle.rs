//! # Multi-Epoch Lifecycles
//!
//! Flows that span several epochs and both callback paths:
//! - User unbonding: PENDING -> INITIATED -> MATURED -> CLAIMABLE
//! - Validator force-unbond: submit, confirm, transfer back, pool
//! - Redelegation: submit, acknowledge, move delegations

#[cfg(test)]
mod tests {
    use crate::harness::{cosmos, ctx, ctx_after, Harness};
    use lsibc_core::domain::RemoteMsgResponse;
    use lsibc_core::{
        Acknowledgement, Coin, Dec, EpochHooks, LiquidStakeEvent, LiquidStakeStore,
        RedelegateTxState, RemoteMsg, RemoteTxHooks, RemoteTxOutcome, TransferHooks, Unbonding,
        UnbondingState,
    };

    const DAY_SECS: u64 = 24 * 60 * 60;

    fn completes_at(time: u64) -> RemoteTxOutcome {
        RemoteTxOutcome::Success(vec![RemoteMsgResponse {
            completion_time: Some(time),
        }])
    }

    fn queue_unbonding(h: &Harness, epoch: i64, amount: u128) {
        let hc = cosmos();
        h.store.set_unbonding(Unbonding::new(
            hc.chain_id.clone(),
            epoch,
            Coin::new(hc.host_denom.clone(), amount),
            Coin::new(hc.mint_denom(), amount),
        ));
    }

    // =============================================================================
    // USER UNBONDING
    // =============================================================================

    #[test]
    fn test_unbonding_reaches_claimable() {
        let h = Harness::with_chains(vec![cosmos()]);
        let hc = cosmos();
        queue_unbonding(&h, 4, 100);

        // undelegate across both validators
        h.engine.after_epoch_end(&ctx(), "undelegation", 4).unwrap();
        let batch = &h.remote.executed()[0];
        assert_eq!(batch.owner, hc.delegation_account.owner);
        let amounts: Vec<u128> = batch
            .messages
            .iter()
            .filter_map(|m| match m {
                RemoteMsg::Undelegate { amount, .. } => Some(amount.amount),
                _ => None,
            })
            .collect();
        assert_eq!(amounts, vec![60, 40]);
        assert_eq!(
            h.store.unbonding(&hc.chain_id, 4).unwrap().state,
            UnbondingState::Initiated
        );

        // host confirms, completion in 21 days
        let mature_at = ctx_after(21 * DAY_SECS).time;
        h.engine
            .on_remote_tx_acknowledgement(&ctx(), &h.executed_packet(0), &completes_at(mature_at))
            .unwrap();
        let stored = h.store.host_chain(&hc.chain_id).unwrap();
        assert_eq!(stored.validator("val1").unwrap().delegated_amount, 540);
        assert_eq!(stored.validator("val2").unwrap().delegated_amount, 360);
        let unbonding = h.store.unbonding(&hc.chain_id, 4).unwrap();
        assert_eq!(unbonding.mature_time, Some(mature_at));
        assert!(unbonding.sequence_id.is_none());

        // too early: nothing moves
        h.engine
            .before_epoch_start(&ctx_after(DAY_SECS), "delegation", 7)
            .unwrap();
        assert_eq!(h.remote.executed().len(), 1);

        // mature: funds sent back to the undelegation account
        let later = ctx_after(22 * DAY_SECS);
        h.engine
            .before_epoch_start(&later, "delegation", 8)
            .unwrap();
        let transfer = &h.remote.executed()[1];
        match &transfer.messages[0] {
            RemoteMsg::Transfer(msg) => {
                assert_eq!(msg.receiver, h.engine.config().undelegation_address());
                assert_eq!(msg.token, Coin::new(hc.host_denom.clone(), 100));
                assert_eq!(msg.source_channel, hc.counterparty_channel_id);
            }
            other => panic!("unexpected message {:?}", other),
        }
        assert_eq!(
            h.store.unbonding(&hc.chain_id, 4).unwrap().state,
            UnbondingState::Matured
        );

        // host confirms the transfer, then the funds arrive
        h.engine
            .on_remote_tx_acknowledgement(&later, &h.executed_packet(1), &completes_at(0))
            .unwrap();
        let packet = h.inbound_packet(
            &hc,
            &hc.delegation_account.address,
            h.engine.config().undelegation_address(),
            100,
        );
        h.engine
            .on_recv_transfer_packet(&later, &packet, "relayer", &Acknowledgement::success_ack())
            .unwrap();

        let unbonding = h.store.unbonding(&hc.chain_id, 4).unwrap();
        assert_eq!(unbonding.state, UnbondingState::Claimable);
        assert!(unbonding.sequence_id.is_none());
    }

    #[test]
    fn test_failed_undelegation_is_marked_failed() {
        let h = Harness::with_chains(vec![cosmos()]);
        let hc = cosmos();
        queue_unbonding(&h, 4, 100);
        h.engine.after_epoch_end(&ctx(), "undelegation", 4).unwrap();

        h.engine
            .on_remote_tx_timeout(&ctx(), &h.executed_packet(0))
            .unwrap();

        assert_eq!(
            h.store.unbonding(&hc.chain_id, 4).unwrap().state,
            UnbondingState::Failed
        );
        let stored = h.store.host_chain(&hc.chain_id).unwrap();
        assert_eq!(stored.total_delegated(), 1000);
        assert!(h
            .engine
            .events()
            .iter()
            .any(|e| matches!(e, LiquidStakeEvent::UndelegationFailed { epoch: 4, .. })));
    }

    #[test]
    fn test_failed_maturity_transfer_is_retried() {
        let h = Harness::with_chains(vec![cosmos()]);
        let hc = cosmos();
        queue_unbonding(&h, 4, 100);
        h.engine.after_epoch_end(&ctx(), "undelegation", 4).unwrap();
        h.engine
            .on_remote_tx_acknowledgement(&ctx(), &h.executed_packet(0), &completes_at(1))
            .unwrap();
        h.engine
            .before_epoch_start(&ctx(), "delegation", 7)
            .unwrap();

        h.engine
            .on_remote_tx_acknowledgement(
                &ctx(),
                &h.executed_packet(1),
                &RemoteTxOutcome::Error("insufficient funds".to_string()),
            )
            .unwrap();
        assert_eq!(
            h.store.unbonding(&hc.chain_id, 4).unwrap().state,
            UnbondingState::Initiated
        );

        h.engine
            .before_epoch_start(&ctx(), "delegation", 8)
            .unwrap();
        assert_eq!(h.remote.executed().len(), 3);
        assert_eq!(
            h.store.unbonding(&hc.chain_id, 4).unwrap().state,
            UnbondingState::Matured
        );
    }

    // =============================================================================
    // VALIDATOR FORCE-UNBOND
    // =============================================================================

    #[test]
    fn test_validator_force_unbond_returns_to_deposits() {
        let mut hc = cosmos();
        hc.validators[1].unbonding_epoch = 1;
        let h = Harness::with_chains(vec![hc.clone()]);

        h.engine.after_epoch_end(&ctx(), "undelegation", 8).unwrap();
        let batch = &h.remote.executed()[0];
        assert_eq!(
            batch.messages,
            vec![RemoteMsg::Undelegate {
                delegator_address: hc.delegation_account.address.clone(),
                validator_address: "val2".to_string(),
                amount: Coin::new(hc.host_denom.clone(), 400),
            }]
        );
        let stored = h.store.host_chain(&hc.chain_id).unwrap();
        assert_eq!(stored.validator("val1").unwrap().weight, Dec::ONE);
        assert_eq!(stored.validator("val2").unwrap().weight, Dec::ZERO);

        // second unbonding epoch: already in flight
        h.engine.after_epoch_end(&ctx(), "undelegation", 12).unwrap();
        assert_eq!(h.remote.executed().len(), 1);

        h.engine
            .on_remote_tx_acknowledgement(&ctx(), &h.executed_packet(0), &completes_at(1))
            .unwrap();
        let stored = h.store.host_chain(&hc.chain_id).unwrap();
        assert_eq!(stored.validator("val2").unwrap().delegated_amount, 0);

        h.engine
            .before_epoch_start(&ctx(), "delegation", 9)
            .unwrap();
        match &h.remote.executed()[1].messages[0] {
            RemoteMsg::Transfer(msg) => {
                assert_eq!(msg.receiver, h.engine.config().deposit_address());
                assert_eq!(msg.token.amount, 400);
            }
            other => panic!("unexpected message {:?}", other),
        }

        h.engine
            .on_remote_tx_acknowledgement(&ctx(), &h.executed_packet(1), &completes_at(0))
            .unwrap();
        assert!(h.store.all_validator_unbondings().is_empty());

        let packet = h.inbound_packet(
            &hc,
            &hc.delegation_account.address,
            h.engine.config().deposit_address(),
            400,
        );
        h.engine
            .on_recv_transfer_packet(&ctx(), &packet, "relayer", &Acknowledgement::success_ack())
            .unwrap();
        assert_eq!(h.store.deposit(&hc.chain_id, 9).unwrap().amount.amount, 400);
    }

    #[test]
    fn test_force_unbond_and_user_batch_share_epoch() {
        let mut hc = cosmos();
        hc.validators[0].unbonding_epoch = 1;
        let h = Harness::with_chains(vec![hc.clone()]);
        queue_unbonding(&h, 8, 300);

        h.engine.after_epoch_end(&ctx(), "undelegation", 8).unwrap();

        let mut undelegated = 0u128;
        for tx in h.remote.executed() {
            for msg in tx.messages {
                if let RemoteMsg::Undelegate {
                    validator_address,
                    amount,
                    ..
                } = msg
                {
                    if validator_address == "val1" {
                        undelegated += amount.amount;
                    }
                }
            }
        }
        assert_eq!(undelegated, 600);
        assert_eq!(
            h.store.unbonding(&hc.chain_id, 8).unwrap().state,
            UnbondingState::Initiated
        );
    }

    // =============================================================================
    // REDELEGATION
    // =============================================================================

    #[test]
    fn test_redelegation_moves_stake_on_ack() {
        let h = Harness::with_chains(vec![cosmos()]);
        let hc = cosmos();

        h.engine.after_epoch_end(&ctx(), "redelegation", 3).unwrap();
        let batch = &h.remote.executed()[0];
        assert_eq!(
            batch.messages,
            vec![RemoteMsg::Redelegate {
                delegator_address: hc.delegation_account.address.clone(),
                validator_src_address: "val1".to_string(),
                validator_dst_address: "val2".to_string(),
                amount: Coin::new(hc.host_denom.clone(), 100),
            }]
        );

        h.engine
            .on_remote_tx_acknowledgement(&ctx(), &h.executed_packet(0), &completes_at(5))
            .unwrap();

        let stored = h.store.host_chain(&hc.chain_id).unwrap();
        assert_eq!(stored.validator("val1").unwrap().delegated_amount, 500);
        assert_eq!(stored.validator("val2").unwrap().delegated_amount, 500);
        let tx = h
            .store
            .redelegate_tx(&hc.chain_id, &batch.sequence_id)
            .unwrap();
        assert_eq!(tx.state, RedelegateTxState::Success);

        // balanced now
        h.engine.after_epoch_end(&ctx(), "redelegation", 5).unwrap();
        assert_eq!(h.remote.executed().len(), 1);
    }

    #[test]
    fn test_redelegation_waits_for_in_flight_move() {
        let h = Harness::with_chains(vec![cosmos()]);
        let hc = cosmos();

        h.engine.after_epoch_end(&ctx(), "redelegation", 3).unwrap();
        h.engine.after_epoch_end(&ctx(), "redelegation", 5).unwrap();
        assert_eq!(h.remote.executed().len(), 1);

        h.engine
            .on_remote_tx_acknowledgement(&ctx(), &h.executed_packet(0), &completes_at(5))
            .unwrap();
        h.engine.after_epoch_end(&ctx(), "redelegation", 7).unwrap();

        let stored = h.store.host_chain(&hc.chain_id).unwrap();
        assert_eq!(stored.validator("val1").unwrap().delegated_amount, 500);
        assert_eq!(stored.validator("val2").unwrap().delegated_amount, 500);
        assert_eq!(h.remote.executed().len(), 1);
    }

    #[test]
    fn test_redelegation_skipped_on_unbonding_epoch() {
        let h = Harness::with_chains(vec![cosmos()]);
        h.engine.after_epoch_end(&ctx(), "redelegation", 4).unwrap();
        assert_eq!(h.remote.calls(), 0);
    }
}
