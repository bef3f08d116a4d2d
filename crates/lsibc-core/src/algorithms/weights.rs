//! # Weight Redistribution

use crate::domain::{mul_div_floor, Dec, Validator};

/// Zero the weight of `removed` and hand it to the other weighted validators.
///
/// Each remaining validator gains in proportion to its current weight;
/// rounding dust goes to the heaviest one so total weight is preserved.
/// Returns `false` when `removed` is unknown or nobody can take the weight.
pub fn redistribute_weight(validators: &mut [Validator], removed: &str) -> bool {
    let Some(idx) = validators
        .iter()
        .position(|v| v.operator_address == removed)
    else {
        return false;
    };
    let freed = validators[idx].weight.atto();
    validators[idx].weight = Dec::ZERO;

    let remaining_total = validators
        .iter()
        .fold(0u128, |acc, v| acc.saturating_add(v.weight.atto()));
    if remaining_total == 0 {
        return false;
    }

    // first maximum wins ties
    let heaviest = validators
        .iter()
        .enumerate()
        .fold(0, |best, (i, v)| {
            if v.weight > validators[best].weight {
                i
            } else {
                best
            }
        });

    let mut handed_out = 0u128;
    for validator in validators.iter_mut() {
        let weight = validator.weight.atto();
        if weight == 0 {
            continue;
        }
        let gain = mul_div_floor(freed, weight, remaining_total).unwrap_or(0);
        validator.weight = Dec::from_atto(weight.saturating_add(gain));
        handed_out += gain;
    }

    let dust = freed - handed_out;
    let weight = validators[heaviest].weight.atto();
    validators[heaviest].weight = Dec::from_atto(weight.saturating_add(dust));
    true
}
