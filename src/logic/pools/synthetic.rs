use super::{Pool, SourceId};
use crate::utils::constants::{
    DEFAULT_ASSET_DECIMALS, DEFAULT_FEE_BPS, DEFAULT_STABLE_DECIMALS, SYNTHETIC_ASSET_UNITS, SYNTHETIC_STABLE_UNITS,
};
use crate::utils::fixed_point::{implied_price_usd, pow10, stable_value_usd, value_usd};
use alloy_primitives::{Address, U256, keccak256};

/// Placeholder depth substituted for a source (or one of its pools) that could not be read
/// or reported no reserves at all.
///
/// Side A is always the asset, side B the stable asset. Missing addresses are derived
/// deterministically from the source id so repeated fallbacks produce identical pools.
#[derive(Clone, Debug)]
pub struct SyntheticPool {
    pub source_id: SourceId,
    pub pool_address: Option<Address>,
    pub asset_token: Option<Address>,
    pub stable_token: Option<Address>,
    pub asset_decimals: u8,
    pub stable_decimals: u8,
    pub fee_bps: u16,
}

impl SyntheticPool {
    pub fn new(source_id: SourceId) -> Self {
        Self {
            source_id,
            pool_address: None,
            asset_token: None,
            stable_token: None,
            asset_decimals: DEFAULT_ASSET_DECIMALS,
            stable_decimals: DEFAULT_STABLE_DECIMALS,
            fee_bps: DEFAULT_FEE_BPS,
        }
    }

    pub fn with_pool_address(mut self, address: Address) -> Self {
        self.pool_address = Some(address);
        self
    }

    pub fn with_tokens(mut self, asset_token: Option<Address>, stable_token: Option<Address>) -> Self {
        self.asset_token = asset_token;
        self.stable_token = stable_token;
        self
    }

    pub fn with_decimals(mut self, asset_decimals: u8, stable_decimals: u8) -> Self {
        self.asset_decimals = asset_decimals;
        self.stable_decimals = stable_decimals;
        self
    }

    pub fn with_fee_bps(mut self, fee_bps: u16) -> Self {
        self.fee_bps = fee_bps;
        self
    }

    pub fn placeholder_address(source_id: &SourceId, label: &str) -> Address {
        Address::from_word(keccak256(format!("synthetic:{source_id}:{label}")))
    }

    pub fn build(self, now: u64) -> Pool {
        let reserve_a = U256::from(SYNTHETIC_ASSET_UNITS) * pow10(self.asset_decimals);
        let reserve_b = U256::from(SYNTHETIC_STABLE_UNITS) * pow10(self.stable_decimals);

        let stable_usd = stable_value_usd(reserve_b, self.stable_decimals).unwrap_or_default();
        let asset_usd = implied_price_usd(reserve_b, self.stable_decimals, reserve_a, self.asset_decimals)
            .and_then(|price| value_usd(reserve_a, self.asset_decimals, price))
            .unwrap_or_default();

        Pool {
            pool_address: self.pool_address.unwrap_or_else(|| Self::placeholder_address(&self.source_id, "pool")),
            token_a: self.asset_token.unwrap_or_else(|| Self::placeholder_address(&self.source_id, "asset")),
            token_b: self.stable_token.unwrap_or_else(|| Self::placeholder_address(&self.source_id, "stable")),
            source_id: self.source_id,
            reserve_a,
            reserve_b,
            decimals_a: self.asset_decimals,
            decimals_b: self.stable_decimals,
            fee_bps: self.fee_bps,
            total_supply: U256::ZERO,
            tvl_usd: stable_usd + asset_usd,
            last_update: now,
            is_synthetic_fallback: true,
            is_aggregated_vault: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fixed_point::USD_SCALE;

    #[test]
    fn test_synthetic_pool_is_flagged_and_nonzero() {
        let pool = SyntheticPool::new(SourceId::from("polygon")).build(42);
        assert!(pool.is_synthetic_fallback);
        assert!(pool.has_liquidity());
        assert_eq!(pool.last_update, 42);
        assert_eq!(pool.reserve_b, U256::from(SYNTHETIC_STABLE_UNITS) * pow10(DEFAULT_STABLE_DECIMALS));
        // stable side plus the asset side valued at the pool's own price
        assert_eq!(pool.tvl_usd, U256::from(2 * SYNTHETIC_STABLE_UNITS) * USD_SCALE);
    }

    #[test]
    fn test_placeholders_are_deterministic() {
        let first = SyntheticPool::new(SourceId::from("polygon")).build(1);
        let second = SyntheticPool::new(SourceId::from("polygon")).build(2);
        assert!(first.same_state(&second));

        let other = SyntheticPool::new(SourceId::from("base")).build(1);
        assert_ne!(first.token_a, other.token_a);
        assert_ne!(first.token_a, first.token_b);
    }

    #[test]
    fn test_configured_addresses_win() {
        let pool = SyntheticPool::new(SourceId::from("base"))
            .with_pool_address(Address::repeat_byte(0xaa))
            .with_tokens(Some(Address::repeat_byte(0x01)), None)
            .with_fee_bps(5)
            .build(0);
        assert_eq!(pool.pool_address, Address::repeat_byte(0xaa));
        assert_eq!(pool.token_a, Address::repeat_byte(0x01));
        assert_eq!(pool.token_b, SyntheticPool::placeholder_address(&SourceId::from("base"), "stable"));
        assert_eq!(pool.fee_bps, 5);
    }
}
