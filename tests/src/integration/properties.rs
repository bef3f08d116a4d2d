//! # Engine Properties
//!
//! Invariants checked over seeded random inputs.

#[cfg(test)]
mod tests {
    use crate::harness::{ctx, host_chain, success_ack, Harness};
    use lsibc_core::domain::{
        invariant_allocation_within_delegation, invariant_fee_split,
        invariant_inactive_is_silent, invariant_sequence_only_in_flight,
    };
    use lsibc_core::{
        allocate_undelegation, split_restake_fee, Coin, Dec, DepositState, EpochHooks,
        HostChain, LiquidStakeError, LiquidStakeStore, LsmDeposit, TransferHooks, Unbonding,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const CASES: usize = 200;

    fn random_chain(rng: &mut StdRng, id: &str, channel: &str) -> HostChain {
        let count = rng.gen_range(1..=6);
        let names: Vec<String> = (0..count).map(|i| format!("val{}", i)).collect();
        let delegations: Vec<(&str, u128)> = names
            .iter()
            .map(|name| (name.as_str(), rng.gen_range(0..1_000_000u128)))
            .collect();
        host_chain(id, channel, &delegations)
    }

    #[test]
    fn test_allocation_sums_and_respects_delegations() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..CASES {
            let hc = random_chain(&mut rng, "cosmoshub-4", "channel-0");
            let available = hc.total_delegated();
            let total = rng.gen_range(0..=available);

            let allocation = allocate_undelegation(&hc.validators, total).unwrap();
            assert!(invariant_allocation_within_delegation(&hc, &allocation, total));
            assert!(allocation.iter().all(|(_, amount)| *amount > 0));

            if available < u128::MAX {
                assert!(matches!(
                    allocate_undelegation(&hc.validators, available + 1),
                    Err(LiquidStakeError::InsufficientDelegation { .. })
                ));
            }
        }
    }

    #[test]
    fn test_fee_split_adds_up() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..CASES {
            let amount = rng.gen_range(0..10_000_000_000u128);
            let percent = rng.gen_range(0..=100u64);
            let (fee, credited) = split_restake_fee(amount, Dec::from_percent(percent));
            assert!(invariant_fee_split(amount, fee, credited));
            assert_eq!(fee, amount * percent as u128 / 100);
        }
    }

    #[test]
    fn test_inactive_chains_are_silent() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut hc = random_chain(&mut rng, "osmosis-1", "channel-3");
        hc.active = false;
        hc.flags.lsm = true;
        for validator in hc.validators.iter_mut() {
            validator.unbonding_epoch = 1;
        }
        let h = Harness::with_chains(vec![hc.clone()]);

        h.fund(&hc.chain_id, 1, 5000);
        h.store.set_lsm_deposit(LsmDeposit {
            id: 1,
            chain_id: hc.chain_id.clone(),
            delegator_address: "lsibc1user".to_string(),
            denom: "ibc/SHARE".to_string(),
            shares: 10,
            state: DepositState::Pending,
            sequence_id: None,
        });
        h.store.set_unbonding(Unbonding::new(
            hc.chain_id.clone(),
            8,
            Coin::new(hc.host_denom.clone(), 1),
            Coin::new(hc.mint_denom(), 1),
        ));

        for epoch in 1..=16 {
            for identifier in ["delegation", "undelegation", "rewards", "redelegation", "cvalue"] {
                h.engine.before_epoch_start(&ctx(), identifier, epoch).unwrap();
                h.engine.after_epoch_end(&ctx(), identifier, epoch).unwrap();
            }
        }

        let sent = h.transfers.sent().len() + h.remote.calls();
        assert!(invariant_inactive_is_silent(&hc, sent));
        assert_eq!(sent, 0);
    }

    #[test]
    fn test_settlement_credits_exact_amount_and_replay_is_noop() {
        let mut rng = StdRng::seed_from_u64(17);
        let chains = vec![
            random_chain(&mut rng, "cosmoshub-4", "channel-0"),
            random_chain(&mut rng, "osmosis-1", "channel-1"),
        ];
        let h = Harness::with_chains(chains.clone());
        h.engine.before_epoch_start(&ctx(), "delegation", 3).unwrap();

        let amounts: Vec<u128> = chains.iter().map(|_| rng.gen_range(1..1_000_000)).collect();
        for (hc, amount) in chains.iter().zip(&amounts) {
            h.fund(&hc.chain_id, 3, *amount);
        }
        h.engine.after_epoch_end(&ctx(), "delegation", 3).unwrap();
        assert_eq!(h.transfers.sent().len(), chains.len());

        for index in 0..chains.len() {
            let packet = h.sent_transfer_packet(index);
            for _ in 0..2 {
                h.engine
                    .on_acknowledgement_transfer_packet(&ctx(), &packet, &success_ack(), "r", None)
                    .unwrap();
            }
            // a late timeout for the settled sequence matches nothing
            h.engine
                .on_timeout_transfer_packet(&ctx(), &packet, "r", None)
                .unwrap();
        }

        for (hc, amount) in chains.iter().zip(&amounts) {
            let stored = h.store.host_chain(&hc.chain_id).unwrap();
            assert_eq!(stored.delegation_account.balance.amount, *amount);
            let deposit = h.store.deposit(&hc.chain_id, 3).unwrap();
            assert_eq!(deposit.state, DepositState::Received);
            assert!(invariant_sequence_only_in_flight(&deposit));
        }
    }

    #[test]
    fn test_deposit_states_follow_lifecycle() {
        let mut rng = StdRng::seed_from_u64(19);
        let hc = host_chain("cosmoshub-4", "channel-0", &[("val1", 100)]);
        let h = Harness::with_chains(vec![hc.clone()]);

        for epoch in 1..=40 {
            h.engine.before_epoch_start(&ctx(), "delegation", epoch).unwrap();
            h.fund(&hc.chain_id, epoch, rng.gen_range(1..1000));
            h.engine.after_epoch_end(&ctx(), "delegation", epoch).unwrap();

            let packet = h.sent_transfer_packet(h.transfers.sent().len() - 1);
            let sequence_id = packet.source_sequence_id();
            let current = h
                .store
                .all_deposits()
                .into_iter()
                .find(|d| d.sequence_id.as_ref() == Some(&sequence_id))
                .unwrap();
            assert_eq!(current.state, DepositState::Sent);
            assert!(invariant_sequence_only_in_flight(&current));

            if rng.gen_bool(0.5) {
                h.engine
                    .on_acknowledgement_transfer_packet(&ctx(), &packet, &success_ack(), "r", None)
                    .unwrap();
            } else {
                h.engine
                    .on_timeout_transfer_packet(&ctx(), &packet, "r", None)
                    .unwrap();
            }
            let settled = h.store.deposit(&current.chain_id, current.epoch).unwrap();
            assert!(DepositState::Sent.can_transition_to(settled.state));
            assert!(invariant_sequence_only_in_flight(&settled));
        }

        for deposit in h.store.all_deposits() {
            assert!(invariant_sequence_only_in_flight(&deposit));
        }
    }
}
