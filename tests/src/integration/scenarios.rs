//! # Deposit and Autocompound Round Trips
//!
//! 1. **Deposit sent**: the delegation epoch ends and the pooled deposit
//!    leaves on the transfer channel
//! 2. **Ack**: the host chain accepts it and the delegation balance grows
//! 3. **Timeout**: the transfer expires and the deposit is retried later
//! 4. **Autocompound**: withdrawn rewards come back, a fee is taken and the
//!    rest is pooled into the current deposit

#[cfg(test)]
mod tests {
    use crate::harness::{cosmos, ctx, success_ack, Harness};
    use lsibc_core::{
        Coin, DepositState, EpochHooks, LiquidStakeEvent, LiquidStakeStore, TransferHooks,
        Acknowledgement,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Start delegation epoch 5 and pool 1000 into it.
    fn funded_epoch() -> Harness {
        let h = Harness::with_chains(vec![cosmos()]);
        h.engine
            .before_epoch_start(&ctx(), "delegation", 5)
            .unwrap();
        h.fund(&cosmos().chain_id, 5, 1000);
        h
    }

    /// Scenario 1 plus the transfer packet it produced.
    fn sent_epoch() -> (Harness, lsibc_core::Packet) {
        let h = funded_epoch();
        h.engine.after_epoch_end(&ctx(), "delegation", 5).unwrap();
        let packet = h.sent_transfer_packet(0);
        (h, packet)
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    #[test]
    fn test_deposit_workflow_sends_pooled_deposit() {
        let (h, packet) = sent_epoch();
        let hc = cosmos();

        let sent = h.transfers.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].token, Coin::new(hc.ibc_denom(), 1000));
        assert_eq!(sent[0].receiver, hc.delegation_account.address);
        assert_eq!(sent[0].source_channel, hc.channel_id);

        let deposit = h.store.deposit(&hc.chain_id, 5).unwrap();
        assert_eq!(deposit.state, DepositState::Sent);
        assert_eq!(deposit.sequence_id, Some(packet.source_sequence_id()));

        assert!(h.engine.events().iter().any(|e| matches!(
            e,
            LiquidStakeEvent::DelegationWorkflow { epoch: 5, amount, .. }
                if amount.amount == 1000 && amount.denom == hc.host_denom
        )));
    }

    #[test]
    fn test_ack_credits_delegation_balance() {
        let (h, packet) = sent_epoch();
        let chain_id = cosmos().chain_id;

        h.engine
            .on_acknowledgement_transfer_packet(&ctx(), &packet, &success_ack(), "relayer", None)
            .unwrap();

        let deposit = h.store.deposit(&chain_id, 5).unwrap();
        assert_eq!(deposit.state, DepositState::Received);
        assert!(deposit.sequence_id.is_none());
        let hc = h.store.host_chain(&chain_id).unwrap();
        assert_eq!(hc.delegation_account.balance.amount, 1000);
    }

    #[test]
    fn test_timeout_returns_deposit_to_pending() {
        let (h, packet) = sent_epoch();
        let chain_id = cosmos().chain_id;

        h.engine
            .on_timeout_transfer_packet(&ctx(), &packet, "relayer", None)
            .unwrap();

        let deposit = h.store.deposit(&chain_id, 5).unwrap();
        assert_eq!(deposit.state, DepositState::Pending);
        assert!(deposit.sequence_id.is_none());
        let hc = h.store.host_chain(&chain_id).unwrap();
        assert_eq!(hc.delegation_account.balance.amount, 0);

        // the next delegation epoch picks it up again
        h.engine
            .before_epoch_start(&ctx(), "delegation", 6)
            .unwrap();
        h.engine.after_epoch_end(&ctx(), "delegation", 6).unwrap();
        assert_eq!(h.transfers.sent().len(), 2);
        assert_eq!(
            h.store.deposit(&chain_id, 5).unwrap().state,
            DepositState::Sent
        );
    }

    #[test]
    fn test_autocompound_takes_fee_and_pools_rest() {
        let h = Harness::with_chains(vec![cosmos()]);
        let hc = cosmos();
        h.engine
            .before_epoch_start(&ctx(), "delegation", 6)
            .unwrap();
        h.bank.set_supply(&hc.mint_denom(), 1490);
        let queries_before = h.bank.supply_queries();

        let rewards = hc.rewards_account.clone().unwrap().address;
        let packet = h.inbound_packet(&hc, &rewards, h.engine.config().deposit_address(), 500);
        h.engine
            .on_recv_transfer_packet(&ctx(), &packet, "relayer", &Acknowledgement::success_ack())
            .unwrap();

        let sends = h.bank.sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].0, h.engine.config().deposit_module);
        assert_eq!(sends[0].1, hc.params.fee_address);
        assert_eq!(sends[0].2, Coin::new(hc.ibc_denom(), 10));
        assert_eq!(h.store.deposit(&hc.chain_id, 6).unwrap().amount.amount, 490);
        assert_eq!(h.bank.supply_queries() - queries_before, 1);
        assert_eq!(
            h.engine
                .events()
                .iter()
                .filter(|e| matches!(e, LiquidStakeEvent::CValueUpdated { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_failed_local_ack_ignores_inbound() {
        let h = Harness::with_chains(vec![cosmos()]);
        let hc = cosmos();
        h.engine
            .before_epoch_start(&ctx(), "delegation", 6)
            .unwrap();
        let rewards = hc.rewards_account.clone().unwrap().address;
        let packet = h.inbound_packet(&hc, &rewards, h.engine.config().deposit_address(), 500);

        h.engine
            .on_recv_transfer_packet(
                &ctx(),
                &packet,
                "relayer",
                &Acknowledgement::Error("receive failed".to_string()),
            )
            .unwrap();

        assert!(h.bank.sends().is_empty());
        assert_eq!(h.store.deposit(&hc.chain_id, 6).unwrap().amount.amount, 0);
    }
}
