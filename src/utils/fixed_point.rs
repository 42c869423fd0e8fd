//! Scaled-integer arithmetic for prices and USD values.
//!
//! USD amounts are carried as [`U256`] with [`USD_DECIMALS`] decimals. Prices
//! are "USD per one whole token" in the same scale. Floating point is only
//! produced by [`to_display_f64`] at the presentation boundary.

use crate::errors::{RouteError, RouteResult};
use alloy_primitives::U256;
use alloy_primitives::utils::{format_units, parse_units};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const USD_DECIMALS: u8 = 18;

/// `10^18`
pub const USD_SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000u64, 0, 0, 0]);

pub fn pow10(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

/// USD per whole `other` token implied by a stable/other reserve pair.
///
/// `None` when either reserve is zero or the intermediate product overflows.
pub fn implied_price_usd(stable_reserve: U256, stable_decimals: u8, other_reserve: U256, other_decimals: u8) -> Option<U256> {
    if stable_reserve.is_zero() || other_reserve.is_zero() {
        return None;
    }
    let numerator = stable_reserve.checked_mul(pow10(other_decimals))?.checked_mul(USD_SCALE)?;
    let denominator = other_reserve.checked_mul(pow10(stable_decimals))?;
    Some(numerator / denominator)
}

/// USD value of `amount` smallest units at `price_usd` per whole token.
pub fn value_usd(amount: U256, decimals: u8, price_usd: U256) -> Option<U256> {
    Some(amount.checked_mul(price_usd)? / pow10(decimals))
}

/// USD value of an amount of the stable reference asset (1 unit == $1).
pub fn stable_value_usd(amount: U256, stable_decimals: u8) -> Option<U256> {
    Some(amount.checked_mul(USD_SCALE)? / pow10(stable_decimals))
}

/// Smallest units of a token worth `usd` at `price_usd` per whole token.
pub fn usd_to_token_units(usd: U256, price_usd: U256, decimals: u8) -> Option<U256> {
    if price_usd.is_zero() {
        return None;
    }
    Some(usd.checked_mul(pow10(decimals))? / price_usd)
}

/// Smallest units of the stable reference asset worth `usd`.
pub fn usd_to_stable_units(usd: U256, stable_decimals: u8) -> Option<U256> {
    Some(usd.checked_mul(pow10(stable_decimals))? / USD_SCALE)
}

pub fn to_display_f64(value: U256, decimals: u8) -> f64 {
    format_units(value, decimals).ok().and_then(|s| s.parse::<f64>().ok()).unwrap_or(0.0)
}

/// Non-negative USD amount in 18-decimal fixed point, configured as a decimal string.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UsdAmount(U256);

impl UsdAmount {
    pub const ZERO: UsdAmount = UsdAmount(U256::ZERO);

    pub fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> U256 {
        self.0
    }
}

impl FromStr for UsdAmount {
    type Err = RouteError;

    fn from_str(s: &str) -> RouteResult<Self> {
        let trimmed = s.trim().trim_start_matches('$');
        if trimmed.starts_with('-') {
            return Err(RouteError::invalid_config(format!("USD amount must not be negative: {s}")));
        }
        let parsed = parse_units(trimmed, USD_DECIMALS)
            .map_err(|e| RouteError::invalid_config(format!("invalid USD amount {s:?}: {e}")))?;
        Ok(Self(parsed.get_absolute()))
    }
}

impl TryFrom<String> for UsdAmount {
    type Error = RouteError;

    fn try_from(value: String) -> RouteResult<Self> {
        value.parse()
    }
}

impl From<UsdAmount> for String {
    fn from(value: UsdAmount) -> Self {
        value.to_string()
    }
}

impl Display for UsdAmount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match format_units(self.0, USD_DECIMALS) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{}e-{}", self.0, USD_DECIMALS),
        }
    }
}
