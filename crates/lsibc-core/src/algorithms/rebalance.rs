//! # Rebalance Moves
//!
//! Computes redelegations that bring validator delegations towards their
//! target weights.

use crate::domain::{mul_div_floor, Amount, Validator};
use std::cmp::Ordering;

/// Single redelegation from an over-weighted to an under-weighted validator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedelegationMove {
    /// Source validator.
    pub src: String,
    /// Destination validator.
    pub dst: String,
    /// Amount moved.
    pub amount: Amount,
}

/// Generate redelegation moves for a validator set.
///
/// Validators carrying an unbonding marker are left out. Targets are
/// `floor(D * w_i / W)` over the remaining set; validators whose distance
/// to target is at most `acceptable_delta` are considered balanced. The
/// largest surplus is matched against the largest deficit until one side
/// is exhausted.
pub fn generate_redelegations(
    validators: &[Validator],
    acceptable_delta: Amount,
) -> Vec<RedelegationMove> {
    let eligible: Vec<&Validator> = validators.iter().filter(|v| !v.is_unbonding()).collect();

    let total_delegated = eligible
        .iter()
        .fold(0 as Amount, |acc, v| acc.saturating_add(v.delegated_amount));
    let total_weight = eligible
        .iter()
        .fold(0u128, |acc, v| acc.saturating_add(v.weight.atto()));
    if total_delegated == 0 || total_weight == 0 {
        return Vec::new();
    }

    let mut surplus: Vec<(&str, Amount)> = Vec::new();
    let mut deficit: Vec<(&str, Amount)> = Vec::new();
    for validator in &eligible {
        let Some(target) = mul_div_floor(total_delegated, validator.weight.atto(), total_weight)
        else {
            continue;
        };
        let address = validator.operator_address.as_str();
        match validator.delegated_amount.cmp(&target) {
            Ordering::Greater => {
                let diff = validator.delegated_amount - target;
                if diff > acceptable_delta {
                    surplus.push((address, diff));
                }
            }
            Ordering::Less => {
                let diff = target - validator.delegated_amount;
                if diff > acceptable_delta {
                    deficit.push((address, diff));
                }
            }
            Ordering::Equal => {}
        }
    }

    let by_amount_desc =
        |a: &(&str, Amount), b: &(&str, Amount)| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0));
    surplus.sort_by(by_amount_desc);
    deficit.sort_by(by_amount_desc);

    let mut moves = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < surplus.len() && j < deficit.len() {
        let amount = surplus[i].1.min(deficit[j].1);
        moves.push(RedelegationMove {
            src: surplus[i].0.to_string(),
            dst: deficit[j].0.to_string(),
            amount,
        });
        surplus[i].1 -= amount;
        deficit[j].1 -= amount;
        if surplus[i].1 == 0 {
            i += 1;
        }
        if deficit[j].1 == 0 {
            j += 1;
        }
    }
    moves
}
