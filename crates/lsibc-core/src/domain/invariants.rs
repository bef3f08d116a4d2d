//! # Domain Invariants
//!
//! Business rules checked by the workflows and by tests.

use super::entities::{Deposit, HostChain};
use super::value_objects::{Amount, DepositState};

/// Invariant: a deposit carries a sequence id exactly while it is SENT.
pub fn invariant_sequence_only_in_flight(deposit: &Deposit) -> bool {
    (deposit.state == DepositState::Sent) == deposit.sequence_id.is_some()
}

/// Invariant: an allocation sums to the requested total and no entry
/// exceeds the matching validator's delegation.
pub fn invariant_allocation_within_delegation(
    host_chain: &HostChain,
    allocation: &[(String, Amount)],
    requested: Amount,
) -> bool {
    let mut sum: Amount = 0;
    for (address, amount) in allocation {
        let Some(validator) = host_chain.validator(address) else {
            return false;
        };
        if *amount > validator.delegated_amount {
            return false;
        }
        sum = match sum.checked_add(*amount) {
            Some(s) => s,
            None => return false,
        };
    }
    sum == requested
}

/// Invariant: autocompound fee and credit add back up to the inbound amount.
pub fn invariant_fee_split(inbound: Amount, fee: Amount, credited: Amount) -> bool {
    fee <= inbound && fee.checked_add(credited) == Some(inbound)
}

/// Invariant: inactive chains never produce remote messages.
pub fn invariant_inactive_is_silent(host_chain: &HostChain, messages_sent: usize) -> bool {
    host_chain.active || messages_sent == 0
}
