use crate::data_sync::config::DepthTrackerConfig;
use crate::data_sync::depth_store::{DepthSnapshot, DepthStore, SourceStatus};
use crate::data_sync::reserve_reader::{RawReserves, ReserveReader};
use crate::data_sync::source::{PoolEndpoint, ReserveShape, SourceConfig};
use crate::errors::{RouteError, RouteResult};
use crate::logic::pools::{Pool, Side, SourceId, SyntheticPool};
use crate::utils::constants::{BPS_DENOMINATOR, DEFAULT_STABLE_SYMBOL};
use crate::utils::fixed_point::{implied_price_usd, stable_value_usd, value_usd};
use crate::utils::unix_timestamp;
use alloy_primitives::{Address, U256};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Outcome of one source within a refresh cycle.
#[derive(Clone, Debug)]
pub struct SourceRefresh {
    pub source_id: SourceId,
    pub status: SourceStatus,
    pub pool_count: usize,
    pub synthetic_count: usize,
}

/// Outcome of one full refresh cycle, forwarded by the refresh service.
#[derive(Clone, Debug)]
pub struct RefreshReport {
    pub generation: u64,
    pub duration: Duration,
    pub sources: Vec<SourceRefresh>,
}

impl RefreshReport {
    pub fn live_count(&self) -> usize {
        self.sources.iter().filter(|s| s.status.is_live()).count()
    }

    pub fn is_fully_live(&self) -> bool {
        self.live_count() == self.sources.len()
    }

    pub fn source(&self, source_id: &SourceId) -> Option<&SourceRefresh> {
        self.sources.iter().find(|s| &s.source_id == source_id)
    }
}

/// Liquidity depth tracker.
///
/// Polls every configured source concurrently, normalizes the answers into [`Pool`]
/// records and publishes them per source into its [`DepthStore`]. A source that fails,
/// hangs past the fetch timeout or reports empty reserves gets synthetic depth instead
/// (unless disabled in [`DepthTrackerConfig`]), so it never disappears from the snapshot.
pub struct DepthTracker {
    sources: Vec<SourceConfig>,
    reader: Arc<dyn ReserveReader>,
    store: Arc<DepthStore>,
    config: DepthTrackerConfig,
    stable_symbol: String,
    asset_symbol: Option<String>,
    // Serializes the cold-start refresh so concurrent first reads share one fetch
    cold_start: Mutex<()>,
}

impl DepthTracker {
    pub fn new(sources: Vec<SourceConfig>, reader: Arc<dyn ReserveReader>, config: DepthTrackerConfig) -> RouteResult<Self> {
        config.validate()?;
        let mut seen = HashSet::new();
        for source in &sources {
            source.validate()?;
            if !seen.insert(source.id.clone()) {
                return Err(RouteError::invalid_config(format!("duplicate source id {}", source.id)));
            }
        }

        Ok(Self {
            sources,
            reader,
            store: Arc::new(DepthStore::new()),
            config,
            stable_symbol: DEFAULT_STABLE_SYMBOL.to_string(),
            asset_symbol: None,
            cold_start: Mutex::new(()),
        })
    }

    /// Symbols used to orient pools (stable side) and to address synthetic depth.
    pub fn with_symbols(mut self, stable_symbol: &str, asset_symbol: &str) -> Self {
        self.stable_symbol = stable_symbol.trim().to_ascii_uppercase();
        self.asset_symbol = Some(asset_symbol.trim().to_ascii_uppercase());
        self
    }

    pub fn with_store(mut self, store: Arc<DepthStore>) -> Self {
        self.store = store;
        self
    }

    pub fn store(&self) -> &Arc<DepthStore> {
        &self.store
    }

    pub fn sources(&self) -> &[SourceConfig] {
        &self.sources
    }

    pub fn config(&self) -> &DepthTrackerConfig {
        &self.config
    }

    /// Poll every source concurrently and replace each source's stored entry.
    ///
    /// Never fails: per-source problems end up in the report and, with fallback enabled,
    /// as synthetic pools in the store.
    pub async fn refresh(&self) -> RefreshReport {
        let start = Instant::now();
        let now = unix_timestamp();

        let outcomes = join_all(self.sources.iter().map(|source| self.fetch_source_with_timeout(source, now))).await;

        let generation = self.store.begin_refresh();
        let mut sources = Vec::with_capacity(outcomes.len());
        for (source, (pools, status)) in self.sources.iter().zip(outcomes) {
            let synthetic_count = pools.iter().filter(|p| p.is_synthetic_fallback).count();
            sources.push(SourceRefresh {
                source_id: source.id.clone(),
                status: status.clone(),
                pool_count: pools.len(),
                synthetic_count,
            });
            self.store.replace_at(source.id.clone(), pools, status, generation);
        }
        self.store.finish_refresh(generation);

        let report = RefreshReport { generation, duration: start.elapsed(), sources };
        info!(
            "Depth refresh #{} completed in {:?} - {}/{} sources live",
            report.generation,
            report.duration,
            report.live_count(),
            report.sources.len()
        );
        report
    }

    /// Latest snapshot of every source, refreshing first on cold start.
    pub async fn get_all(&self) -> DepthSnapshot {
        if !self.store.is_populated() {
            let _guard = self.cold_start.lock().await;
            if !self.store.is_populated() {
                info!("Depth store empty, running initial refresh");
                self.refresh().await;
            }
        }
        self.store.snapshot()
    }

    /// Pools of one source, fetched on demand if the source has never been stored.
    pub async fn get_for_source(&self, source_id: &SourceId) -> RouteResult<Arc<[Pool]>> {
        let source = self
            .sources
            .iter()
            .find(|s| &s.id == source_id)
            .ok_or_else(|| RouteError::UnknownSource(source_id.clone()))?;

        if let Some(pools) = self.store.pools(source_id) {
            return Ok(pools);
        }

        let (pools, status) = self.fetch_source_with_timeout(source, unix_timestamp()).await;
        let pools: Arc<[Pool]> = pools.into();
        self.store.replace(source_id.clone(), pools.clone(), status);
        Ok(pools)
    }

    async fn fetch_source_with_timeout(&self, source: &SourceConfig, now: u64) -> (Vec<Pool>, SourceStatus) {
        let timeout = self.config.fetch_timeout();
        match tokio::time::timeout(timeout, self.fetch_source(source, now)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let err = RouteError::Timeout { source_id: source.id.clone(), timeout };
                warn!(source = %source.id, "{}", err);
                self.source_fallback(source, err.to_string(), now)
            }
        }
    }

    async fn fetch_source(&self, source: &SourceConfig, now: u64) -> (Vec<Pool>, SourceStatus) {
        if source.pools.is_empty() {
            return self.source_fallback(source, "no pools configured".to_string(), now);
        }

        let results = join_all(source.pools.iter().map(|endpoint| self.fetch_pool(source, endpoint, now))).await;

        let mut pools = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (endpoint, result) in source.pools.iter().zip(results) {
            let reason = match result {
                Ok(pool) if !pool.is_empty() => {
                    pools.push(pool);
                    continue;
                }
                Ok(_) => "zero reserves on both sides".to_string(),
                Err(e) => e.to_string(),
            };
            warn!(source = %source.id, pool = %endpoint.address, "Pool unusable: {}", reason);
            if self.config.synthetic_fallback {
                pools.push(self.synthetic_pool(source, Some(endpoint), now));
            }
            failures.push(reason);
        }

        let status = match failures.len() {
            0 => SourceStatus::Live,
            n if n == source.pools.len() => {
                let reason = failures.swap_remove(0);
                if self.config.synthetic_fallback {
                    SourceStatus::SyntheticFallback { reason }
                } else {
                    SourceStatus::Unavailable { reason }
                }
            }
            n => SourceStatus::Degraded { failed_pools: n },
        };
        (pools, status)
    }

    async fn fetch_pool(&self, source: &SourceConfig, endpoint: &PoolEndpoint, now: u64) -> RouteResult<Pool> {
        let raw = self.reader.read_reserves(source, endpoint).await?;
        let stable_side = self.stable_side(source, &raw);

        let default_for = |side: Side| {
            if stable_side == Some(side) { source.stable_decimals } else { source.asset_decimals }
        };
        let (decimals_a, decimals_b) = tokio::join!(
            self.decimals_or_default(source, raw.token_a, default_for(Side::A)),
            self.decimals_or_default(source, raw.token_b, default_for(Side::B)),
        );

        let fee_bps = raw.fee_bps.unwrap_or(source.fee_default_bps).min(BPS_DENOMINATOR);
        let mut pool = Pool {
            source_id: source.id.clone(),
            pool_address: endpoint.address,
            token_a: raw.token_a,
            token_b: raw.token_b,
            reserve_a: raw.reserve_a,
            reserve_b: raw.reserve_b,
            decimals_a,
            decimals_b,
            fee_bps,
            total_supply: raw.total_supply,
            tvl_usd: U256::ZERO,
            last_update: now,
            is_synthetic_fallback: false,
            is_aggregated_vault: raw.is_vault,
        };
        pool.tvl_usd = stable_side.map(|side| tvl_usd(&pool, side)).unwrap_or_default();

        debug!(
            source = %source.id,
            pool = %endpoint.address,
            "reserves {} / {} (decimals {}/{}, fee {}bps)",
            pool.reserve_a, pool.reserve_b, decimals_a, decimals_b, fee_bps
        );
        Ok(pool)
    }

    async fn decimals_or_default(&self, source: &SourceConfig, token: Address, default: u8) -> u8 {
        match self.reader.read_decimals(source, token).await {
            Ok(decimals) => decimals,
            Err(e) => {
                debug!(source = %source.id, token = %token, "decimals() failed, assuming {}: {}", default, e);
                default
            }
        }
    }

    /// Side holding the stable reference asset. Vaults put it on B by convention.
    fn stable_side(&self, source: &SourceConfig, raw: &RawReserves) -> Option<Side> {
        match source.token_address(&self.stable_symbol) {
            Some(stable) if stable == raw.token_a => Some(Side::A),
            Some(stable) if stable == raw.token_b => Some(Side::B),
            _ if raw.is_vault => Some(Side::B),
            _ => None,
        }
    }

    fn source_fallback(&self, source: &SourceConfig, reason: String, now: u64) -> (Vec<Pool>, SourceStatus) {
        if !self.config.synthetic_fallback {
            return (Vec::new(), SourceStatus::Unavailable { reason });
        }
        warn!(source = %source.id, "Substituting synthetic depth: {}", reason);
        let pools = if source.pools.is_empty() {
            vec![self.synthetic_pool(source, None, now)]
        } else {
            source.pools.iter().map(|endpoint| self.synthetic_pool(source, Some(endpoint), now)).collect()
        };
        (pools, SourceStatus::SyntheticFallback { reason })
    }

    fn synthetic_pool(&self, source: &SourceConfig, endpoint: Option<&PoolEndpoint>, now: u64) -> Pool {
        let asset_token = self.asset_symbol.as_deref().and_then(|symbol| source.token_address(symbol));
        let mut builder = SyntheticPool::new(source.id.clone())
            .with_tokens(asset_token, source.token_address(&self.stable_symbol))
            .with_decimals(source.asset_decimals, source.stable_decimals)
            .with_fee_bps(source.fee_default_bps);
        if let Some(endpoint) = endpoint {
            builder = builder.with_pool_address(endpoint.address);
        }
        let mut pool = builder.build(now);
        pool.is_aggregated_vault = endpoint.is_some_and(|e| e.shape == ReserveShape::Vault);
        pool
    }
}

/// Stable reserve plus the other reserve valued at the pool's own implied price.
fn tvl_usd(pool: &Pool, stable_side: Side) -> U256 {
    let other_side = stable_side.opposite();
    let (stable_reserve, stable_decimals) = (pool.reserve(stable_side), pool.decimals(stable_side));
    let (other_reserve, other_decimals) = (pool.reserve(other_side), pool.decimals(other_side));

    let stable_usd = stable_value_usd(stable_reserve, stable_decimals).unwrap_or_default();
    let other_usd = implied_price_usd(stable_reserve, stable_decimals, other_reserve, other_decimals)
        .and_then(|price| value_usd(other_reserve, other_decimals, price))
        .unwrap_or_default();
    stable_usd.saturating_add(other_usd)
}
