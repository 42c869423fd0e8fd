use crate::data_sync::SourceConfig;
use crate::logic::pools::{Pool, Side, SourceId};
use alloy_primitives::Address;
use std::collections::HashMap;

/// How confidently a pool side was mapped to a logical symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenResolution {
    /// Found in the per-source address table.
    Resolved(String),
    /// Guessed from the vault layout convention (A = asset, B = stable).
    InferredFromConvention(String),
    Unresolved,
}

impl TokenResolution {
    pub fn symbol(&self) -> Option<&str> {
        match self {
            TokenResolution::Resolved(symbol) | TokenResolution::InferredFromConvention(symbol) => Some(symbol),
            TokenResolution::Unresolved => None,
        }
    }

    pub fn is_inferred(&self) -> bool {
        matches!(self, TokenResolution::InferredFromConvention(_))
    }
}

/// Maps chain-local token addresses to chain-agnostic symbols and back.
///
/// Lookups never fail loudly: an unknown source or symbol simply resolves to `None`.
/// Symbols compare case-insensitively.
#[derive(Clone, Debug, Default)]
pub struct LogicalTokenResolver {
    by_symbol: HashMap<SourceId, HashMap<String, Address>>,
    by_address: HashMap<SourceId, HashMap<Address, String>>,
    stable_symbol: String,
    asset_symbol: String,
}

fn normalize(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

impl LogicalTokenResolver {
    pub fn new(stable_symbol: &str, asset_symbol: &str) -> Self {
        Self {
            stable_symbol: normalize(stable_symbol),
            asset_symbol: normalize(asset_symbol),
            ..Self::default()
        }
    }

    pub fn from_sources(sources: &[SourceConfig], stable_symbol: &str, asset_symbol: &str) -> Self {
        let mut resolver = Self::new(stable_symbol, asset_symbol);
        for source in sources {
            for (symbol, address) in &source.tokens {
                resolver.insert(source.id.clone(), symbol, *address);
            }
        }
        resolver
    }

    pub fn insert(&mut self, source_id: SourceId, symbol: &str, address: Address) {
        let symbol = normalize(symbol);
        self.by_address.entry(source_id.clone()).or_default().insert(address, symbol.clone());
        self.by_symbol.entry(source_id).or_default().insert(symbol, address);
    }

    pub fn with_token(mut self, source_id: &str, symbol: &str, address: Address) -> Self {
        self.insert(SourceId::from(source_id), symbol, address);
        self
    }

    pub fn stable_symbol(&self) -> &str {
        &self.stable_symbol
    }

    pub fn asset_symbol(&self) -> &str {
        &self.asset_symbol
    }

    pub fn is_stable(&self, symbol: &str) -> bool {
        normalize(symbol) == self.stable_symbol
    }

    pub fn resolve_symbol(&self, address: Address, source_id: &SourceId) -> Option<&str> {
        self.by_address.get(source_id)?.get(&address).map(String::as_str)
    }

    pub fn resolve_address(&self, symbol: &str, source_id: &SourceId) -> Option<Address> {
        self.by_symbol.get(source_id)?.get(&normalize(symbol)).copied()
    }

    /// Logical symbol of one side of `pool`.
    ///
    /// Falls back to the vault convention only for aggregated vaults, and says so.
    pub fn resolve_side(&self, pool: &Pool, side: Side) -> TokenResolution {
        if let Some(symbol) = self.resolve_symbol(pool.token(side), &pool.source_id) {
            return TokenResolution::Resolved(symbol.to_string());
        }
        if pool.is_aggregated_vault {
            let symbol = match side {
                Side::A => &self.asset_symbol,
                Side::B => &self.stable_symbol,
            };
            return TokenResolution::InferredFromConvention(symbol.clone());
        }
        TokenResolution::Unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::pools::SyntheticPool;

    fn resolver() -> LogicalTokenResolver {
        LogicalTokenResolver::new("usdc", "FLOW")
            .with_token("base", "FLOW", Address::repeat_byte(0x01))
            .with_token("base", "usdc", Address::repeat_byte(0x02))
            .with_token("polygon", "FLOW", Address::repeat_byte(0x11))
    }

    #[test]
    fn test_bidirectional_lookup() {
        let resolver = resolver();
        let base = SourceId::from("base");
        assert_eq!(resolver.resolve_symbol(Address::repeat_byte(0x02), &base), Some("USDC"));
        assert_eq!(resolver.resolve_address("Usdc", &base), Some(Address::repeat_byte(0x02)));
        assert_eq!(resolver.resolve_address("FLOW", &SourceId::from("polygon")), Some(Address::repeat_byte(0x11)));
        assert!(resolver.is_stable("USDC"));
    }

    #[test]
    fn test_unknown_lookups_return_none() {
        let resolver = resolver();
        assert_eq!(resolver.resolve_symbol(Address::repeat_byte(0x11), &SourceId::from("base")), None);
        assert_eq!(resolver.resolve_address("USDC", &SourceId::from("polygon")), None);
        assert_eq!(resolver.resolve_address("FLOW", &SourceId::from("solana")), None);
    }

    #[test]
    fn test_vault_convention_is_flagged() {
        let resolver = resolver();
        let mut vault = SyntheticPool::new(SourceId::from("arbitrum")).build(0);
        assert_eq!(resolver.resolve_side(&vault, Side::A), TokenResolution::Unresolved);

        vault.is_aggregated_vault = true;
        let side_a = resolver.resolve_side(&vault, Side::A);
        assert_eq!(side_a, TokenResolution::InferredFromConvention("FLOW".to_string()));
        assert!(side_a.is_inferred());
        assert_eq!(resolver.resolve_side(&vault, Side::B).symbol(), Some("USDC"));
    }

    #[test]
    fn test_table_wins_over_convention() {
        let resolver = resolver();
        let mut vault = SyntheticPool::new(SourceId::from("base"))
            .with_tokens(Some(Address::repeat_byte(0x02)), Some(Address::repeat_byte(0x01)))
            .build(0);
        vault.is_aggregated_vault = true;
        assert_eq!(resolver.resolve_side(&vault, Side::A), TokenResolution::Resolved("USDC".to_string()));
    }
}
