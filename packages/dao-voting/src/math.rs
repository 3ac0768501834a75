use std::convert::TryFrom;

use cosmwasm_std::{StdError, StdResult, Uint128};

/// Fixed-point scale for all percentages: 10_000 = 100.00%
pub const PERTENMILL: u64 = 10_000;

/// Floor of `amount * fraction / PERTENMILL`
pub fn apply_pertenmill(amount: Uint128, fraction: u64) -> Uint128 {
    amount.multiply_ratio(fraction, PERTENMILL)
}

/// Floor of `part * PERTENMILL / whole`, expressed as a pertenmill fraction.
/// Errors when `whole` is zero or the result doesn't fit a `u64`.
pub fn to_pertenmill(part: Uint128, whole: Uint128) -> StdResult<u64> {
    if whole.is_zero() {
        return Err(StdError::generic_err("Cannot compute a fraction of zero weight"));
    }
    let fraction = part.multiply_ratio(PERTENMILL, whole);

    u64::try_from(fraction.u128())
        .map_err(|_| StdError::generic_err(format!("Fraction out of range: {}", fraction)))
}

/// Returns true if `fraction` lies in [0, PERTENMILL]
pub fn is_valid_pertenmill(fraction: u64) -> bool {
    fraction <= PERTENMILL
}
