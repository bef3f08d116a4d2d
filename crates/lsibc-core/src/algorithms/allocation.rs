//! # Undelegation Allocation
//!
//! Splits an aggregate unbond amount across validators proportionally to
//! their current delegation.

use crate::domain::{mul_div_floor, Amount, LiquidStakeError, LiquidStakeResult, Validator};

/// Allocate `total` across `validators` proportionally to delegation.
///
/// Each validator first gets `floor(total * d_i / D)`. The rounding
/// remainder goes to the validators with the most spare delegation, so the
/// result sums to exactly `total` and no entry exceeds its delegation.
/// Zero allocations are omitted; order follows the validator list.
pub fn allocate_undelegation(
    validators: &[Validator],
    total: Amount,
) -> LiquidStakeResult<Vec<(String, Amount)>> {
    let available = validators
        .iter()
        .try_fold(0 as Amount, |acc, v| acc.checked_add(v.delegated_amount))
        .ok_or(LiquidStakeError::Overflow)?;

    if total > available {
        return Err(LiquidStakeError::InsufficientDelegation {
            requested: total,
            available,
        });
    }
    if total == 0 {
        return Ok(Vec::new());
    }

    let mut shares = Vec::with_capacity(validators.len());
    let mut allocated: Amount = 0;
    for validator in validators {
        let share = mul_div_floor(total, validator.delegated_amount, available)
            .ok_or(LiquidStakeError::Overflow)?;
        allocated += share;
        shares.push(share);
    }

    let mut remainder = total - allocated;
    if remainder > 0 {
        let mut by_spare: Vec<usize> = (0..validators.len()).collect();
        by_spare.sort_by(|&a, &b| {
            let spare_a = validators[a].delegated_amount - shares[a];
            let spare_b = validators[b].delegated_amount - shares[b];
            spare_b
                .cmp(&spare_a)
                .then_with(|| validators[a].operator_address.cmp(&validators[b].operator_address))
        });
        for idx in by_spare {
            if remainder == 0 {
                break;
            }
            let spare = validators[idx].delegated_amount - shares[idx];
            let extra = spare.min(remainder);
            shares[idx] += extra;
            remainder -= extra;
        }
    }

    Ok(validators
        .iter()
        .zip(shares)
        .filter(|(_, share)| *share > 0)
        .map(|(v, share)| (v.operator_address.clone(), share))
        .collect())
}
