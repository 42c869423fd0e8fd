use crate::errors::{RouteError, RouteResult};
use crate::logic::pools::SourceId;
use crate::utils::constants::{BPS_DENOMINATOR, DEFAULT_ASSET_DECIMALS, DEFAULT_FEE_BPS, DEFAULT_STABLE_DECIMALS, MAX_TOKEN_DECIMALS};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use strum_macros::{Display, EnumString, VariantNames};
use url::Url;

/// Which read-only interface a pool contract exposes.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, EnumString, VariantNames, Default, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReserveShape {
    /// `getTokens` / `getReserves` / `totalSupply` / `swapFeeBps`
    #[default]
    Paired,
    /// `projectToken` / `usdc` / `totalProjectToken` / `totalUSDC`
    Vault,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEndpoint {
    pub address: Address,
    #[serde(default)]
    pub shape: ReserveShape,
}

impl PoolEndpoint {
    pub fn paired(address: Address) -> Self {
        Self { address, shape: ReserveShape::Paired }
    }

    pub fn vault(address: Address) -> Self {
        Self { address, shape: ReserveShape::Vault }
    }
}

/// One configured source. Validated once at startup; call sites never default silently.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: SourceId,
    #[serde(default)]
    pub display_name: String,
    pub rpc_url: String,
    #[serde(default = "default_stable_decimals")]
    pub stable_decimals: u8,
    #[serde(default = "default_asset_decimals")]
    pub asset_decimals: u8,
    #[serde(default = "default_fee_bps")]
    pub fee_default_bps: u16,
    /// Logical symbol -> chain-local address.
    #[serde(default)]
    pub tokens: BTreeMap<String, Address>,
    #[serde(default)]
    pub pools: Vec<PoolEndpoint>,
}

fn default_stable_decimals() -> u8 {
    DEFAULT_STABLE_DECIMALS
}

fn default_asset_decimals() -> u8 {
    DEFAULT_ASSET_DECIMALS
}

fn default_fee_bps() -> u16 {
    DEFAULT_FEE_BPS
}

impl SourceConfig {
    pub fn new(id: impl Into<SourceId>, rpc_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: String::new(),
            rpc_url: rpc_url.into(),
            stable_decimals: DEFAULT_STABLE_DECIMALS,
            asset_decimals: DEFAULT_ASSET_DECIMALS,
            fee_default_bps: DEFAULT_FEE_BPS,
            tokens: BTreeMap::new(),
            pools: Vec::new(),
        }
    }

    pub fn with_token(mut self, symbol: &str, address: Address) -> Self {
        self.tokens.insert(symbol.trim().to_ascii_uppercase(), address);
        self
    }

    pub fn with_pool(mut self, endpoint: PoolEndpoint) -> Self {
        self.pools.push(endpoint);
        self
    }

    pub fn with_decimals(mut self, asset_decimals: u8, stable_decimals: u8) -> Self {
        self.asset_decimals = asset_decimals;
        self.stable_decimals = stable_decimals;
        self
    }

    pub fn display_name(&self) -> &str {
        if self.display_name.is_empty() { self.id.as_str() } else { &self.display_name }
    }

    pub fn token_address(&self, symbol: &str) -> Option<Address> {
        self.tokens.get(&symbol.trim().to_ascii_uppercase()).copied()
    }

    pub fn validate(&self) -> RouteResult<()> {
        if self.id.is_empty() {
            return Err(RouteError::invalid_config("source id must not be empty"));
        }
        Url::parse(&self.rpc_url)
            .map_err(|e| RouteError::invalid_config(format!("source {}: invalid rpc_url {:?}: {e}", self.id, self.rpc_url)))?;
        if self.fee_default_bps > BPS_DENOMINATOR {
            return Err(RouteError::invalid_config(format!(
                "source {}: fee_default_bps {} exceeds {}",
                self.id, self.fee_default_bps, BPS_DENOMINATOR
            )));
        }
        for (name, decimals) in [("stable_decimals", self.stable_decimals), ("asset_decimals", self.asset_decimals)] {
            if decimals > MAX_TOKEN_DECIMALS {
                return Err(RouteError::invalid_config(format!("source {}: {name} {decimals} is out of range", self.id)));
            }
        }

        let mut seen_addresses = HashSet::new();
        for (symbol, address) in &self.tokens {
            if symbol.trim().is_empty() {
                return Err(RouteError::invalid_config(format!("source {}: empty token symbol", self.id)));
            }
            if !seen_addresses.insert(*address) {
                return Err(RouteError::invalid_config(format!(
                    "source {}: address {address} is mapped to more than one symbol",
                    self.id
                )));
            }
        }

        let mut seen_pools = HashSet::new();
        for pool in &self.pools {
            if !seen_pools.insert(pool.address) {
                return Err(RouteError::invalid_config(format!("source {}: pool {} listed twice", self.id, pool.address)));
            }
        }
        Ok(())
    }
}
