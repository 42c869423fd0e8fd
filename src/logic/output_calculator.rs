use crate::logic::pools::{Pool, Side};
use crate::utils::constants::{BPS_DENOMINATOR, SANITY_MIN_PERCENT_OF_LINEAR};
use alloy_primitives::U256;

/// Result of pricing one swap against one pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputQuote {
    pub amount_out: U256,
    pub amount_in_after_fee: U256,
    /// `amount_in_after_fee * reserve_out / reserve_in`, the no-slippage price.
    pub linear_estimate: U256,
    /// The constant-product result is implausibly small next to the linear estimate,
    /// which usually means the reserves were oriented against the wrong token.
    pub sanity_warning: bool,
}

/// Constant-product output with a proportional fee, floored at every division.
///
/// Any degenerate input (empty reserve, zero amount, overflow) prices as zero output.
pub fn constant_product_out(amount_in: U256, reserve_in: U256, reserve_out: U256, fee_bps: u16) -> OutputQuote {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return OutputQuote::default();
    }

    let fee_bps = fee_bps.min(BPS_DENOMINATOR);
    let denominator_bps = U256::from(BPS_DENOMINATOR);
    let Some(scaled_in) = amount_in.checked_mul(U256::from(BPS_DENOMINATOR - fee_bps)) else {
        return OutputQuote::default();
    };
    let amount_in_after_fee = scaled_in / denominator_bps;

    // x * y = k
    let Some(numerator) = amount_in_after_fee.checked_mul(reserve_out) else {
        return OutputQuote::default();
    };
    let denominator = reserve_in.saturating_add(amount_in_after_fee);
    if denominator.is_zero() {
        return OutputQuote::default();
    }
    let amount_out = numerator / denominator;
    let linear_estimate = numerator / reserve_in;

    let sanity_warning = !amount_out.is_zero()
        && !linear_estimate.is_zero()
        && amount_out.saturating_mul(U256::from(100u64)) < linear_estimate.saturating_mul(U256::from(SANITY_MIN_PERCENT_OF_LINEAR));

    OutputQuote { amount_out, amount_in_after_fee, linear_estimate, sanity_warning }
}

/// Price `amount_in` paid into `input_side` of `pool`.
pub fn quote_output(pool: &Pool, input_side: Side, amount_in: U256) -> OutputQuote {
    let (reserve_in, reserve_out) = pool.oriented_reserves(input_side);
    constant_product_out(amount_in, reserve_in, reserve_out, pool.fee_bps)
}

pub fn compute_output(pool: &Pool, input_side: Side, amount_in: U256) -> U256 {
    quote_output(pool, input_side, amount_in).amount_out
}
