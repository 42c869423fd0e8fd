use crate::logic::enumerator::MatchedPool;
use crate::logic::types::{PairSymbols, RouteWarning};
use crate::utils::constants::DEFAULT_STABLE_DECIMALS;
use crate::utils::fixed_point::{UsdAmount, implied_price_usd, usd_to_stable_units, usd_to_token_units};
use alloy_primitives::U256;
use std::sync::Arc;
use tracing::warn;

/// A USD cost expressed in output-token units.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CostQuote {
    pub cost_usd: U256,
    pub amount: U256,
    /// USD per whole output token used for the conversion; `None` for the stable asset
    /// or when no price was available.
    pub price_usd: Option<U256>,
    pub warning: Option<RouteWarning>,
}

/// Flat execution and bridging costs, converted into output-token units.
///
/// Costs do not depend on trade size. A local-only route pays the local execution
/// charge. A route touching remote sources pays the bridging charge once per remote
/// source instead, which already covers settling on the execution source.
#[derive(Clone, Debug)]
pub struct CostModel {
    pub local_execution_cost_usd: UsdAmount,
    pub remote_source_cost_usd: UsdAmount,
    stable_symbol: String,
    stable_decimals: u8,
}

impl CostModel {
    pub fn new(local_execution_cost_usd: UsdAmount, remote_source_cost_usd: UsdAmount, stable_symbol: &str) -> Self {
        Self {
            local_execution_cost_usd,
            remote_source_cost_usd,
            stable_symbol: stable_symbol.trim().to_ascii_uppercase(),
            stable_decimals: DEFAULT_STABLE_DECIMALS,
        }
    }

    /// Decimals of the stable asset on the execution source.
    pub fn with_stable_decimals(mut self, stable_decimals: u8) -> Self {
        self.stable_decimals = stable_decimals;
        self
    }

    pub fn is_stable(&self, symbol: Option<&str>) -> bool {
        symbol.is_some_and(|s| s.eq_ignore_ascii_case(&self.stable_symbol))
    }

    /// Total USD cost of a route touching `remote_sources` remote sources.
    pub fn cost_usd_for(&self, remote_sources: usize) -> U256 {
        if remote_sources == 0 {
            return self.local_execution_cost_usd.raw();
        }
        self.remote_source_cost_usd.raw().saturating_mul(U256::from(remote_sources))
    }

    /// Convert `cost_usd` into output-token units.
    ///
    /// The stable asset converts directly. Any other output is priced by averaging the
    /// implied price of every candidate pool whose input side is the stable asset. With
    /// no usable price the cost is zero and a warning is attached.
    pub fn cost_in_output_token(&self, cost_usd: U256, symbols: &PairSymbols, pools: &[Arc<MatchedPool>]) -> CostQuote {
        if self.is_stable(symbols.token_out.as_deref()) {
            let decimals = pools.first().map(|p| p.decimals_out()).unwrap_or(self.stable_decimals);
            return CostQuote {
                cost_usd,
                amount: usd_to_stable_units(cost_usd, decimals).unwrap_or(U256::MAX),
                price_usd: None,
                warning: None,
            };
        }

        let mut price_sum = U256::ZERO;
        let mut priced = 0u64;
        if self.is_stable(symbols.token_in.as_deref()) {
            for matched in pools {
                let price = implied_price_usd(matched.reserve_in, matched.decimals_in(), matched.reserve_out, matched.decimals_out());
                if let Some(price) = price.filter(|p| !p.is_zero()) {
                    price_sum = price_sum.saturating_add(price);
                    priced += 1;
                }
            }
        }

        let converted = (priced > 0)
            .then(|| price_sum / U256::from(priced))
            .and_then(|price| {
                let decimals = pools.first().map(|p| p.decimals_out())?;
                Some((price, usd_to_token_units(cost_usd, price, decimals)?))
            });

        match converted {
            Some((price, amount)) => CostQuote { cost_usd, amount, price_usd: Some(price), warning: None },
            None => {
                warn!("No pool prices {}, counting execution cost as zero", symbols.display_out);
                CostQuote {
                    cost_usd,
                    amount: U256::ZERO,
                    price_usd: None,
                    warning: Some(RouteWarning::CostPriceUnavailable { token: symbols.display_out.clone() }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::enumerator::MatchConfidence;
    use crate::logic::pools::{Pool, Side, SourceId};
    use crate::utils::fixed_point::{USD_SCALE, pow10};
    use alloy_primitives::Address;

    fn model() -> CostModel {
        CostModel::new("0.0002".parse().unwrap(), "0.10".parse().unwrap(), "usdc")
    }

    fn symbols(token_in: &str, token_out: &str) -> PairSymbols {
        PairSymbols {
            token_in: Some(token_in.to_string()),
            token_out: Some(token_out.to_string()),
            display_in: token_in.to_string(),
            display_out: token_out.to_string(),
        }
    }

    /// Stable on side A, asset on side B, bought with the stable asset.
    fn stable_in_pool(stable_whole: u64, asset_whole: u64) -> Arc<MatchedPool> {
        let pool = Pool {
            source_id: SourceId::from("base"),
            pool_address: Address::repeat_byte(0x10),
            token_a: Address::repeat_byte(0x02),
            token_b: Address::repeat_byte(0x01),
            reserve_a: U256::from(stable_whole) * pow10(6),
            reserve_b: U256::from(asset_whole) * pow10(18),
            decimals_a: 6,
            decimals_b: 18,
            fee_bps: 30,
            total_supply: U256::ZERO,
            tvl_usd: U256::ZERO,
            last_update: 0,
            is_synthetic_fallback: false,
            is_aggregated_vault: false,
        };
        Arc::new(MatchedPool::new(pool, Side::A, MatchConfidence::Verified, false))
    }

    #[test]
    fn test_cost_usd_for() {
        let model = model();
        assert_eq!(model.cost_usd_for(0), U256::from(2u64) * USD_SCALE / U256::from(10_000u64));
        // Bridging replaces the local charge: one remote source adds $0.0998
        assert_eq!(model.cost_usd_for(1) - model.cost_usd_for(0), U256::from(998u64) * USD_SCALE / U256::from(10_000u64));
        assert_eq!(model.cost_usd_for(2), U256::from(2u64) * USD_SCALE / U256::from(10u64));
    }

    #[test]
    fn test_stable_output_converts_directly() {
        let model = model();
        let quote = model.cost_in_output_token(model.cost_usd_for(1), &symbols("FLOW", "USDC"), &[]);
        // $0.10 in 6-decimal units
        assert_eq!(quote.amount, U256::from(100_000u64));
        assert!(quote.warning.is_none());
    }

    #[test]
    fn test_non_stable_output_uses_average_implied_price() {
        let model = model();
        // $0.001 and $0.003 per token average to $0.002
        let pools = vec![stable_in_pool(1, 1_000), stable_in_pool(3, 1_000)];
        let quote = model.cost_in_output_token(USD_SCALE / U256::from(10u64), &symbols("USDC", "FLOW"), &pools);
        assert_eq!(quote.price_usd, Some(USD_SCALE / U256::from(500u64)));
        // $0.10 at $0.002 = 50 tokens
        assert_eq!(quote.amount, U256::from(50u64) * pow10(18));
    }

    #[test]
    fn test_unpriceable_output_costs_zero_with_warning() {
        let model = model();
        let pools = vec![stable_in_pool(1, 1_000)];
        let quote = model.cost_in_output_token(USD_SCALE, &symbols("FLOW", "WETH"), &pools);
        assert!(quote.amount.is_zero());
        assert_eq!(quote.warning, Some(RouteWarning::CostPriceUnavailable { token: "WETH".to_string() }));

        let empty = vec![stable_in_pool(0, 1_000)];
        let quote = model.cost_in_output_token(USD_SCALE, &symbols("USDC", "FLOW"), &empty);
        assert!(quote.warning.is_some());
    }
}
