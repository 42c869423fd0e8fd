use crate::errors::{RouteError, RouteResult};
use crate::execution::CrossChainTransfer;
use crate::logic::enumerator::{MatchedPool, TokenRef};
use crate::logic::pools::SourceId;
use crate::utils::constants::{DEFAULT_MAX_REMOTE_POOLS, DEFAULT_STABLE_SYMBOL, DEFAULT_UTILIZATION_CAP_BPS, MAX_REMOTE_POOLS_LIMIT};
use crate::utils::fixed_point::{USD_DECIMALS, UsdAmount, to_display_f64};
use crate::utils::Token;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Write};
use std::sync::Arc;

/// Route optimizer settings (`[router]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Source that executes the swap and receives every bridged leg
    pub execution_source: SourceId,
    /// Logical symbol of the stable reference asset (1 unit == $1)
    #[serde(default = "default_stable_symbol")]
    pub stable_symbol: String,
    /// Logical symbol of the non-stable side, used for the vault layout convention
    pub asset_symbol: String,
    /// Flat cost of executing on the execution source
    #[serde(default = "default_local_execution_cost")]
    pub local_execution_cost_usd: UsdAmount,
    /// Flat bridging cost per remote source involved in a route
    #[serde(default = "default_remote_source_cost")]
    pub remote_source_cost_usd: UsdAmount,
    /// Maximum share of a pool's input-side reserve one route may use
    #[serde(default = "default_utilization_cap_bps")]
    pub utilization_cap_bps: u16,
    /// Remote pools kept for enumeration, deepest first
    #[serde(default = "default_max_remote_pools")]
    pub max_remote_pools: usize,
}

fn default_stable_symbol() -> String {
    DEFAULT_STABLE_SYMBOL.to_string()
}

fn default_local_execution_cost() -> UsdAmount {
    // $0.0002
    UsdAmount::from_raw(U256::from(200_000_000_000_000u64))
}

fn default_remote_source_cost() -> UsdAmount {
    // $0.10
    UsdAmount::from_raw(U256::from(100_000_000_000_000_000u64))
}

fn default_utilization_cap_bps() -> u16 {
    DEFAULT_UTILIZATION_CAP_BPS
}

fn default_max_remote_pools() -> usize {
    DEFAULT_MAX_REMOTE_POOLS
}

impl RouterConfig {
    pub fn new(execution_source: impl Into<SourceId>, asset_symbol: &str) -> Self {
        Self {
            execution_source: execution_source.into(),
            stable_symbol: default_stable_symbol(),
            asset_symbol: asset_symbol.to_string(),
            local_execution_cost_usd: default_local_execution_cost(),
            remote_source_cost_usd: default_remote_source_cost(),
            utilization_cap_bps: DEFAULT_UTILIZATION_CAP_BPS,
            max_remote_pools: DEFAULT_MAX_REMOTE_POOLS,
        }
    }

    pub fn validate(&self) -> RouteResult<()> {
        if self.execution_source.is_empty() {
            return Err(RouteError::invalid_config("router.execution_source must not be empty"));
        }
        if self.stable_symbol.trim().is_empty() || self.asset_symbol.trim().is_empty() {
            return Err(RouteError::invalid_config("router.stable_symbol and router.asset_symbol are required"));
        }
        if self.stable_symbol.trim().eq_ignore_ascii_case(self.asset_symbol.trim()) {
            return Err(RouteError::invalid_config("router.stable_symbol and router.asset_symbol must differ"));
        }
        if self.utilization_cap_bps == 0 || self.utilization_cap_bps > DEFAULT_UTILIZATION_CAP_BPS {
            return Err(RouteError::invalid_config(format!(
                "router.utilization_cap_bps must be within 1..={DEFAULT_UTILIZATION_CAP_BPS}, got {}",
                self.utilization_cap_bps
            )));
        }
        if self.max_remote_pools > MAX_REMOTE_POOLS_LIMIT {
            return Err(RouteError::invalid_config(format!(
                "router.max_remote_pools {} exceeds {MAX_REMOTE_POOLS_LIMIT}",
                self.max_remote_pools
            )));
        }
        Ok(())
    }
}

/// Non-fatal anomaly attached to a candidate or to the final allocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum RouteWarning {
    /// The token has no logical symbol on the execution source; only local pools were matched by address.
    UnresolvedLogicalToken { token: String, source_id: SourceId },
    PriceSanity { source_id: SourceId, pool: Address, amount_out: U256, linear_estimate: U256 },
    PartialFill { unfilled: U256 },
    /// No pool priced the output token, so its cost was counted as zero.
    CostPriceUnavailable { token: String },
    SyntheticLiquidity { source_id: SourceId, pool: Address },
    InferredTokenMapping { source_id: SourceId, pool: Address },
    RemotePoolsCapped { kept: usize, dropped: usize },
}

impl Display for RouteWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteWarning::UnresolvedLogicalToken { token, source_id } => {
                write!(f, "{token} has no logical mapping on {source_id}, matching local pools by address only")
            }
            RouteWarning::PriceSanity { source_id, pool, amount_out, linear_estimate } => write!(
                f,
                "pool {pool} on {source_id} quoted {amount_out}, under 1% of linear estimate {linear_estimate}; reserves may be misoriented"
            ),
            RouteWarning::PartialFill { unfilled } => write!(f, "{unfilled} of the input could not be allocated"),
            RouteWarning::CostPriceUnavailable { token } => {
                write!(f, "no pool prices {token}, execution cost counted as zero")
            }
            RouteWarning::SyntheticLiquidity { source_id, pool } => {
                write!(f, "pool {pool} on {source_id} is synthetic fallback depth")
            }
            RouteWarning::InferredTokenMapping { source_id, pool } => {
                write!(f, "token sides of vault {pool} on {source_id} inferred from convention")
            }
            RouteWarning::RemotePoolsCapped { kept, dropped } => {
                write!(f, "kept the {kept} deepest remote pools, dropped {dropped}")
            }
        }
    }
}

/// Logical view of the requested pair, as resolved on the execution source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PairSymbols {
    pub token_in: Option<String>,
    pub token_out: Option<String>,
    /// Symbol, or address if unresolved
    pub display_in: String,
    pub display_out: String,
}

/// A hypothetical execution plan under evaluation.
#[derive(Clone, Debug)]
pub struct RouteCandidate {
    pub label: String,
    /// Local pools first, then remote pools in enumeration order
    pub pools: Vec<Arc<MatchedPool>>,
    pub sources_used: BTreeSet<SourceId>,
    pub remote_sources_used: BTreeSet<SourceId>,
    pub gross_output: U256,
    pub cost_usd: U256,
    pub cost_in_output_token: U256,
    pub net_output: U256,
    pub filled_input: U256,
    pub unfilled_input: U256,
    pub entries: Vec<AllocationEntry>,
    pub warnings: Vec<RouteWarning>,
}

impl RouteCandidate {
    pub fn new(label: String, pools: Vec<Arc<MatchedPool>>) -> Self {
        let sources_used: BTreeSet<SourceId> = pools.iter().map(|p| p.pool.source_id.clone()).collect();
        let remote_sources_used = pools.iter().filter(|p| !p.is_local).map(|p| p.pool.source_id.clone()).collect();
        Self {
            label,
            pools,
            sources_used,
            remote_sources_used,
            gross_output: U256::ZERO,
            cost_usd: U256::ZERO,
            cost_in_output_token: U256::ZERO,
            net_output: U256::ZERO,
            filled_input: U256::ZERO,
            unfilled_input: U256::ZERO,
            entries: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_multi_source(&self) -> bool {
        !self.remote_sources_used.is_empty()
    }
}

/// One pool's share of a route.
#[derive(Clone, Debug)]
pub struct AllocationEntry {
    pub pool: Arc<MatchedPool>,
    pub amount_allocated: U256,
    pub expected_output: U256,
    pub price_sanity_warning: bool,
}

impl AllocationEntry {
    pub fn source_id(&self) -> &SourceId {
        &self.pool.pool.source_id
    }
}

/// A route request. Tokens are logical symbols or addresses on the execution source.
#[derive(Clone, Debug)]
pub struct RouteRequest {
    pub token_in: TokenRef,
    pub token_out: TokenRef,
    pub amount_in: U256,
    /// Overrides the configured execution source
    pub execution_source: Option<SourceId>,
}

impl RouteRequest {
    pub fn new(token_in: TokenRef, token_out: TokenRef, amount_in: U256) -> Self {
        Self { token_in, token_out, amount_in, execution_source: None }
    }

    pub fn on_source(mut self, source_id: impl Into<SourceId>) -> Self {
        self.execution_source = Some(source_id.into());
        self
    }
}

/// The selected plan, plus everything evaluated on the way to it.
#[derive(Clone, Debug)]
pub struct RouteAllocation {
    pub execution_source: SourceId,
    pub token_in: Token,
    pub token_out: Token,
    pub requires_multi_source: bool,
    pub total_input: U256,
    pub filled_input: U256,
    pub unfilled_input: U256,
    pub gross_output: U256,
    pub cost_usd: U256,
    pub cost_in_output_token: U256,
    pub net_output: U256,
    pub label: String,
    pub entries: Vec<AllocationEntry>,
    pub transfers: Vec<CrossChainTransfer>,
    /// Every evaluated candidate, best first
    pub ranked: Vec<RouteCandidate>,
    pub warnings: Vec<RouteWarning>,
}

impl RouteAllocation {
    pub fn is_fully_filled(&self) -> bool {
        self.unfilled_input.is_zero()
    }

    pub fn winner(&self) -> Option<&RouteCandidate> {
        self.ranked.first()
    }

    pub fn has_synthetic_liquidity(&self) -> bool {
        self.entries.iter().any(|e| e.pool.pool.is_synthetic_fallback)
    }

    /// Human-readable rendering. Floating point appears here and nowhere else.
    pub fn summary(&self) -> String {
        let symbol_in = self.token_in.get_symbol();
        let symbol_out = self.token_out.get_symbol();
        let mut out = String::new();

        let _ = writeln!(
            out,
            "{} {} -> {} {} via {} on {}",
            self.token_in.to_float(self.total_input),
            symbol_in,
            self.token_out.to_float(self.net_output),
            symbol_out,
            self.label,
            self.execution_source
        );
        let _ = writeln!(
            out,
            "  gross {} {}, cost ${} ({} {})",
            self.token_out.to_float(self.gross_output),
            symbol_out,
            to_display_f64(self.cost_usd, USD_DECIMALS),
            self.token_out.to_float(self.cost_in_output_token),
            symbol_out
        );
        for entry in &self.entries {
            let _ = writeln!(
                out,
                "  {}: {} {} -> {} {}",
                entry.pool.pool,
                self.token_in.to_float(entry.amount_allocated),
                symbol_in,
                self.token_out.to_float(entry.expected_output),
                symbol_out
            );
        }
        if !self.is_fully_filled() {
            let _ = writeln!(out, "  unfilled: {} {}", self.token_in.to_float(self.unfilled_input), symbol_in);
        }
        for warning in &self.warnings {
            let _ = writeln!(out, "  warning: {warning}");
        }
        out
    }
}
