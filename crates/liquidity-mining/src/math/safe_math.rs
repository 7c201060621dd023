//! # Safe Math Operations
//!
//! Overflow-checked arithmetic for liquidity-time integrals and reward shares.

use ethnum::U256;

use crate::errors::{MiningError, MiningResult};
use crate::math::LiquiditySeconds;
use crate::types::Timestamp;

/// Macro to generate safe arithmetic functions
macro_rules! safe_arith {
    // Binary operations with checked methods
    ($fn_name:ident, $type:ty, $checked_method:ident, $error:expr) => {
        /// Checked binary operation, failing instead of wrapping
        pub fn $fn_name(a: $type, b: $type) -> MiningResult<$type> {
            a.$checked_method(b).ok_or($error)
        }
    };
}

safe_arith!(safe_add_u128, u128, checked_add, MiningError::MathOverflow);

/// Liquidity held for `seconds`, as a liquidity-seconds product
pub fn liquidity_seconds(liquidity: u128, seconds: Timestamp) -> LiquiditySeconds {
    LiquiditySeconds::of(liquidity, seconds)
}

/// `amount * part / total` rounded down, narrowed to u128 only at the end.
///
/// Rounding down keeps every pro-rata share at or below its exact value, so
/// the sum of shares never exceeds the budget being divided. When the 256-bit
/// product would overflow, both integrals are halved with `total` rounded up,
/// which can only lower the share.
pub fn mul_div_floor(part: LiquiditySeconds, amount: u128, total: LiquiditySeconds) -> MiningResult<u128> {
    if total.is_zero() {
        return Err(MiningError::DivisionByZero);
    }
    let amount = U256::new(amount);
    let mut part = part.as_u256();
    let mut total = total.as_u256();
    let product = loop {
        match part.checked_mul(amount) {
            Some(product) => break product,
            None => {
                part >>= 1u32;
                total = (total >> 1u32) + U256::ONE;
            }
        }
    };
    let quotient = product / total;
    if quotient > U256::new(u128::MAX) {
        return Err(MiningError::MathOverflow);
    }
    Ok(quotient.as_u128())
}
