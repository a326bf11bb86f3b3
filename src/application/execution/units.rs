//! Human amount to token base-unit conversion.

use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::error::ExecutionError;

/// Convert a human-readable amount into base units, truncating toward zero.
///
/// `1.5` with 6 decimals becomes `1_500_000`; digits below the token's
/// precision are dropped.
///
/// # Errors
///
/// Returns `ExecutionError::InvalidAmount` for negative amounts or when the
/// result does not fit in a `U256`.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256, ExecutionError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ExecutionError::InvalidAmount(format!(
            "amount must be non-negative, got {amount}"
        )));
    }

    // amount == mantissa / 10^scale, so base = mantissa * 10^(decimals - scale)
    let mantissa = U256::from(amount.mantissa().unsigned_abs());
    let scale = amount.scale();
    let decimals = u32::from(decimals);

    let overflow = || ExecutionError::InvalidAmount(format!("{amount} overflows base units"));
    if decimals >= scale {
        let factor = pow10(decimals - scale).ok_or_else(overflow)?;
        mantissa.checked_mul(factor).ok_or_else(overflow)
    } else {
        let divisor = pow10(scale - decimals).ok_or_else(overflow)?;
        Ok(mantissa / divisor)
    }
}

fn pow10(exp: u32) -> Option<U256> {
    U256::from(10u8).checked_pow(U256::from(exp))
}
