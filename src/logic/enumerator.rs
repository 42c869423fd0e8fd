use crate::data_sync::DepthSnapshot;
use crate::errors::{RouteError, RouteResult};
use crate::logic::pools::{Pool, Side, SourceId};
use crate::logic::resolver::LogicalTokenResolver;
use crate::logic::types::{PairSymbols, RouteCandidate, RouteWarning};
use crate::utils::constants::DEFAULT_MAX_REMOTE_POOLS;
use alloy_primitives::{Address, U256};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// A token as named by the caller: a logical symbol or an address on the execution source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenRef {
    Symbol(String),
    Address(Address),
}

impl FromStr for TokenRef {
    type Err = RouteError;

    fn from_str(s: &str) -> RouteResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(RouteError::invalid_config("empty token reference"));
        }
        if trimmed.starts_with("0x") {
            let address = trimmed
                .parse::<Address>()
                .map_err(|e| RouteError::invalid_config(format!("invalid token address {trimmed}: {e}")))?;
            return Ok(TokenRef::Address(address));
        }
        Ok(TokenRef::Symbol(trimmed.to_ascii_uppercase()))
    }
}

impl Display for TokenRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenRef::Symbol(symbol) => f.write_str(symbol),
            TokenRef::Address(address) => write!(f, "{address}"),
        }
    }
}

/// How a pool was recognized as serving the requested pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MatchConfidence {
    /// Both sides found in the logical token table
    Verified,
    /// Local pool matched on raw addresses
    AddressEquality,
    /// Vault sides taken from the layout convention
    InferredFromConvention,
}

/// A pool serving the requested pair, oriented for the requested direction.
#[derive(Clone, Debug)]
pub struct MatchedPool {
    pub pool: Pool,
    pub input_side: Side,
    pub reserve_in: U256,
    pub reserve_out: U256,
    pub confidence: MatchConfidence,
    pub is_local: bool,
}

impl MatchedPool {
    pub fn new(pool: Pool, input_side: Side, confidence: MatchConfidence, is_local: bool) -> Self {
        let (reserve_in, reserve_out) = pool.oriented_reserves(input_side);
        Self { pool, input_side, reserve_in, reserve_out, confidence, is_local }
    }

    pub fn token_in(&self) -> Address {
        self.pool.token(self.input_side)
    }

    pub fn token_out(&self) -> Address {
        self.pool.token(self.input_side.opposite())
    }

    pub fn decimals_in(&self) -> u8 {
        self.pool.decimals(self.input_side)
    }

    pub fn decimals_out(&self) -> u8 {
        self.pool.decimals(self.input_side.opposite())
    }
}

#[derive(Clone, Debug)]
pub struct EnumerationResult {
    pub candidates: Vec<RouteCandidate>,
    pub symbols: PairSymbols,
    pub amount_in: U256,
    pub local_pools: Vec<Arc<MatchedPool>>,
    pub remote_pools: Vec<Arc<MatchedPool>>,
    pub warnings: Vec<RouteWarning>,
}

/// Resolved form of one side of the request.
struct RequestedToken {
    symbol: Option<String>,
    local_address: Option<Address>,
    display: String,
}

/// Finds every pool serving a pair across all sources and combines them into candidates.
pub struct RouteEnumerator<'a> {
    resolver: &'a LogicalTokenResolver,
    max_remote_pools: usize,
}

impl<'a> RouteEnumerator<'a> {
    pub fn new(resolver: &'a LogicalTokenResolver) -> Self {
        Self { resolver, max_remote_pools: DEFAULT_MAX_REMOTE_POOLS }
    }

    pub fn with_max_remote_pools(mut self, max_remote_pools: usize) -> Self {
        self.max_remote_pools = max_remote_pools;
        self
    }

    pub fn enumerate(
        &self,
        snapshot: &DepthSnapshot,
        token_in: &TokenRef,
        token_out: &TokenRef,
        amount_in: U256,
        execution_source: &SourceId,
    ) -> RouteResult<EnumerationResult> {
        let mut warnings = Vec::new();
        let requested_in = self.resolve_requested(token_in, execution_source, &mut warnings);
        let requested_out = self.resolve_requested(token_out, execution_source, &mut warnings);

        let mut local_pools = Vec::new();
        let mut remote_pools = Vec::new();
        for (source_id, pools) in snapshot {
            let is_local = source_id == execution_source;
            for pool in pools.iter() {
                let Some((input_side, confidence)) = self.match_pool(pool, &requested_in, &requested_out, is_local) else {
                    continue;
                };
                if confidence == MatchConfidence::InferredFromConvention {
                    warnings.push(RouteWarning::InferredTokenMapping {
                        source_id: source_id.clone(),
                        pool: pool.pool_address,
                    });
                }
                let matched = Arc::new(MatchedPool::new(pool.clone(), input_side, confidence, is_local));
                if is_local {
                    local_pools.push(matched);
                } else {
                    remote_pools.push(matched);
                }
            }
        }

        if local_pools.is_empty() && remote_pools.is_empty() {
            return Err(RouteError::NoLiquidity { token_in: requested_in.display, token_out: requested_out.display });
        }

        if remote_pools.len() > self.max_remote_pools {
            let dropped = remote_pools.len() - self.max_remote_pools;
            warn!("Capping remote pools at {} (dropping {} shallowest)", self.max_remote_pools, dropped);
            remote_pools = keep_deepest(remote_pools, self.max_remote_pools);
            warnings.push(RouteWarning::RemotePoolsCapped { kept: self.max_remote_pools, dropped });
        }

        let candidates = build_candidates(&local_pools, &remote_pools);
        debug!(
            "Enumerated {} candidates from {} local and {} remote pools",
            candidates.len(),
            local_pools.len(),
            remote_pools.len()
        );

        Ok(EnumerationResult {
            candidates,
            symbols: PairSymbols {
                token_in: requested_in.symbol,
                token_out: requested_out.symbol,
                display_in: requested_in.display,
                display_out: requested_out.display,
            },
            amount_in,
            local_pools,
            remote_pools,
            warnings,
        })
    }

    fn resolve_requested(&self, token: &TokenRef, execution_source: &SourceId, warnings: &mut Vec<RouteWarning>) -> RequestedToken {
        match token {
            TokenRef::Symbol(symbol) => {
                let symbol = symbol.to_ascii_uppercase();
                let local_address = self.resolver.resolve_address(&symbol, execution_source);
                if local_address.is_none() {
                    warnings.push(RouteWarning::UnresolvedLogicalToken {
                        token: symbol.clone(),
                        source_id: execution_source.clone(),
                    });
                }
                RequestedToken { symbol: Some(symbol.clone()), local_address, display: symbol }
            }
            TokenRef::Address(address) => {
                let symbol = self.resolver.resolve_symbol(*address, execution_source).map(str::to_string);
                if symbol.is_none() {
                    warnings.push(RouteWarning::UnresolvedLogicalToken {
                        token: address.to_string(),
                        source_id: execution_source.clone(),
                    });
                }
                RequestedToken {
                    display: symbol.clone().unwrap_or_else(|| address.to_string()),
                    symbol,
                    local_address: Some(*address),
                }
            }
        }
    }

    /// Input side and match confidence, or `None` if the pool does not serve the pair.
    fn match_pool(
        &self,
        pool: &Pool,
        token_in: &RequestedToken,
        token_out: &RequestedToken,
        is_local: bool,
    ) -> Option<(Side, MatchConfidence)> {
        if let (Some(symbol_in), Some(symbol_out)) = (&token_in.symbol, &token_out.symbol) {
            let side_a = self.resolver.resolve_side(pool, Side::A);
            let side_b = self.resolver.resolve_side(pool, Side::B);
            if let (Some(a), Some(b)) = (side_a.symbol(), side_b.symbol()) {
                let confidence = if side_a.is_inferred() || side_b.is_inferred() {
                    MatchConfidence::InferredFromConvention
                } else {
                    MatchConfidence::Verified
                };
                if a == symbol_in && b == symbol_out {
                    return Some((Side::A, confidence));
                }
                if b == symbol_in && a == symbol_out {
                    return Some((Side::B, confidence));
                }
                // Both sides are known and belong to some other pair
                return None;
            }
        }

        // Unresolved remote pools are never trusted; local ones may still match on addresses.
        if !is_local {
            return None;
        }
        let (address_in, address_out) = (token_in.local_address?, token_out.local_address?);
        let input_side = pool.side_of(address_in)?;
        let output_side = pool.side_of(address_out)?;
        (input_side != output_side).then_some((input_side, MatchConfidence::AddressEquality))
    }
}

/// Keep the `limit` pools with the deepest input-side reserve, preserving enumeration order.
fn keep_deepest(pools: Vec<Arc<MatchedPool>>, limit: usize) -> Vec<Arc<MatchedPool>> {
    let mut by_depth: Vec<usize> = (0..pools.len()).collect();
    by_depth.sort_by(|&a, &b| pools[b].reserve_in.cmp(&pools[a].reserve_in));
    let mut kept: Vec<usize> = by_depth.into_iter().take(limit).collect();
    kept.sort_unstable();
    kept.into_iter().map(|i| pools[i].clone()).collect()
}

/// "Local only" first, then every k-combination of remote pools (k = 1..=n) joined with all local pools.
fn build_candidates(local: &[Arc<MatchedPool>], remote: &[Arc<MatchedPool>]) -> Vec<RouteCandidate> {
    let mut candidates = Vec::new();

    if !local.is_empty() {
        candidates.push(RouteCandidate::new("Local only".to_string(), local.to_vec()));
    }

    for k in 1..=remote.len() {
        for combination in combinations(remote.len(), k) {
            let mut pools = local.to_vec();
            pools.extend(combination.iter().map(|&i| remote[i].clone()));
            candidates.push(RouteCandidate::new(label_for(!local.is_empty(), &combination, remote), pools));
        }
    }
    candidates
}

fn label_for(has_local: bool, combination: &[usize], remote: &[Arc<MatchedPool>]) -> String {
    let mut sources: Vec<&str> = Vec::with_capacity(combination.len());
    for &i in combination {
        let source = remote[i].pool.source_id.as_str();
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    let joined = sources.join(", ");
    if has_local { format!("Local + {joined}") } else { joined }
}

/// Index combinations of size `k` out of `n`, in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k == 0 || k > n {
        return Vec::new();
    }
    let mut result = Vec::new();
    let mut indices: Vec<usize> = (0..k).collect();
    loop {
        result.push(indices.clone());

        // Rightmost index that can still move
        let Some(i) = (0..k).rev().find(|&i| indices[i] < n - k + i) else {
            return result;
        };
        indices[i] += 1;
        for j in i + 1..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}
