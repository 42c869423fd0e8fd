use crate::data_sync::{DepthSnapshot, DepthTracker, ReserveReader};
use crate::errors::{RouteError, RouteResult};
use crate::execution::derive_transfers;
use crate::logic::cost_model::CostModel;
use crate::logic::enumerator::{RouteEnumerator, TokenRef};
use crate::logic::pools::SourceId;
use crate::logic::resolver::LogicalTokenResolver;
use crate::logic::selector::RouteSelector;
use crate::logic::types::{RouteAllocation, RouteCandidate, RouteRequest, RouterConfig};
use crate::utils::{AppConfig, Token};
use alloy_primitives::{Address, U256};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Answers "get route" requests against the depth tracker's latest snapshot.
///
/// A request never triggers an on-chain fetch, except the one-time refresh on cold
/// start. Everything after reading the snapshot is a pure computation.
pub struct RouteOptimizer {
    tracker: Arc<DepthTracker>,
    resolver: LogicalTokenResolver,
    cost_model: CostModel,
    config: RouterConfig,
}

impl RouteOptimizer {
    pub fn new(tracker: Arc<DepthTracker>, config: RouterConfig) -> RouteResult<Self> {
        config.validate()?;
        let execution_source = tracker
            .sources()
            .iter()
            .find(|s| s.id == config.execution_source)
            .ok_or_else(|| RouteError::UnknownSource(config.execution_source.clone()))?;

        let resolver = LogicalTokenResolver::from_sources(tracker.sources(), &config.stable_symbol, &config.asset_symbol);
        let cost_model = CostModel::new(config.local_execution_cost_usd, config.remote_source_cost_usd, &config.stable_symbol)
            .with_stable_decimals(execution_source.stable_decimals);

        Ok(Self { tracker, resolver, cost_model, config })
    }

    /// Build the tracker and the optimizer from one configuration document.
    pub fn from_config(config: AppConfig, reader: Arc<dyn ReserveReader>) -> RouteResult<Self> {
        config.validate()?;
        let AppConfig { tracker, router, sources } = config;
        let tracker = DepthTracker::new(sources, reader, tracker)?.with_symbols(&router.stable_symbol, &router.asset_symbol);
        Self::new(Arc::new(tracker), router)
    }

    pub fn tracker(&self) -> &Arc<DepthTracker> {
        &self.tracker
    }

    pub fn resolver(&self) -> &LogicalTokenResolver {
        &self.resolver
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub async fn get_route(&self, request: &RouteRequest) -> RouteResult<RouteAllocation> {
        if request.amount_in.is_zero() {
            return Err(RouteError::ZeroAmount);
        }
        let snapshot = self.tracker.get_all().await;
        self.route_on_snapshot(&snapshot, request)
    }

    /// Route a request against an explicit snapshot.
    pub fn route_on_snapshot(&self, snapshot: &DepthSnapshot, request: &RouteRequest) -> RouteResult<RouteAllocation> {
        let start = Instant::now();
        if request.amount_in.is_zero() {
            return Err(RouteError::ZeroAmount);
        }
        let execution_source = request.execution_source.clone().unwrap_or_else(|| self.config.execution_source.clone());
        if !self.tracker.sources().iter().any(|s| s.id == execution_source) {
            return Err(RouteError::UnknownSource(execution_source));
        }

        let enumeration = RouteEnumerator::new(&self.resolver)
            .with_max_remote_pools(self.config.max_remote_pools)
            .enumerate(snapshot, &request.token_in, &request.token_out, request.amount_in, &execution_source)?;

        let selector = RouteSelector::new(&self.cost_model).with_utilization_cap_bps(self.config.utilization_cap_bps);
        let ranked = selector.select(enumeration.candidates, request.amount_in, &enumeration.symbols);
        let winner = ranked.first().ok_or_else(|| RouteError::NoLiquidity {
            token_in: enumeration.symbols.display_in.clone(),
            token_out: enumeration.symbols.display_out.clone(),
        })?;

        let mut warnings = enumeration.warnings;
        warnings.extend(winner.warnings.iter().cloned());

        let (token_in, token_out) = self.request_tokens(request, &execution_source, winner);
        let transfers = derive_transfers(&execution_source, &winner.entries, &enumeration.symbols);

        let allocation = RouteAllocation {
            execution_source,
            token_in,
            token_out,
            requires_multi_source: winner.is_multi_source(),
            total_input: request.amount_in,
            filled_input: winner.filled_input,
            unfilled_input: winner.unfilled_input,
            gross_output: winner.gross_output,
            cost_usd: winner.cost_usd,
            cost_in_output_token: winner.cost_in_output_token,
            net_output: winner.net_output,
            label: winner.label.clone(),
            entries: winner.entries.clone(),
            transfers,
            warnings,
            ranked,
        };

        info!(
            "Route {} -> {}: {} of {} candidates won, net {} (multi-source: {})",
            allocation.token_in.get_symbol(),
            allocation.token_out.get_symbol(),
            allocation.label,
            allocation.ranked.len(),
            allocation.net_output,
            allocation.requires_multi_source
        );
        if allocation.has_synthetic_liquidity() {
            warn!("Route {} draws on synthetic fallback depth", allocation.label);
        }
        debug!("Routing took {:?}", start.elapsed());
        Ok(allocation)
    }

    /// Presentation tokens for the request, as seen from the execution source.
    fn request_tokens(&self, request: &RouteRequest, execution_source: &SourceId, winner: &RouteCandidate) -> (Token, Token) {
        let first = winner.pools.first();
        let token_in = self.local_token(
            &request.token_in,
            execution_source,
            first.map(|p| (p.token_in(), p.decimals_in())),
        );
        let token_out = self.local_token(
            &request.token_out,
            execution_source,
            first.map(|p| (p.token_out(), p.decimals_out())),
        );
        (token_in, token_out)
    }

    fn local_token(&self, token: &TokenRef, execution_source: &SourceId, matched: Option<(Address, u8)>) -> Token {
        let (address, symbol) = match token {
            TokenRef::Address(address) => {
                (Some(*address), self.resolver.resolve_symbol(*address, execution_source).map(str::to_string))
            }
            TokenRef::Symbol(symbol) => (self.resolver.resolve_address(symbol, execution_source), Some(symbol.clone())),
        };
        let address = address.or(matched.map(|(address, _)| address)).unwrap_or_default();
        Token::new_with_data(execution_source.clone(), address, symbol, matched.map(|(_, decimals)| decimals))
    }

    /// Net output of the best single-source route, if one was ranked.
    pub fn local_only_output(allocation: &RouteAllocation) -> Option<U256> {
        allocation.ranked.iter().find(|c| !c.is_multi_source()).map(|c| c.net_output)
    }
}
