//! # Fees and Exchange Value

use crate::domain::{Amount, Dec};

/// Split an autocompounded amount into `(fee, credited)`.
///
/// `fee = floor(amount * rate)`, capped at `amount`.
pub fn split_restake_fee(amount: Amount, rate: Dec) -> (Amount, Amount) {
    let fee = rate.mul_int_truncate(amount).min(amount);
    (fee, amount - fee)
}

/// Exchange value `minted / staked`, one while nothing is staked.
pub fn compute_c_value(minted: Amount, staked: Amount) -> Dec {
    if staked == 0 {
        return Dec::ONE;
    }
    Dec::from_ratio(minted, staked).unwrap_or(Dec::MAX)
}

/// Check if a C value lies within `[lower, upper]`.
pub fn c_value_within_limits(c_value: Dec, lower: Dec, upper: Dec) -> bool {
    c_value >= lower && c_value <= upper
}
