use crate::logic::cost_model::CostModel;
use crate::logic::output_calculator::constant_product_out;
use crate::logic::types::{AllocationEntry, PairSymbols, RouteCandidate, RouteWarning};
use crate::utils::constants::{BPS_DENOMINATOR, DEFAULT_UTILIZATION_CAP_BPS};
use alloy_primitives::U256;
use tracing::{debug, warn};

/// Prices candidates and ranks them by net output.
pub struct RouteSelector<'a> {
    cost_model: &'a CostModel,
    utilization_cap_bps: u16,
}

impl<'a> RouteSelector<'a> {
    pub fn new(cost_model: &'a CostModel) -> Self {
        Self { cost_model, utilization_cap_bps: DEFAULT_UTILIZATION_CAP_BPS }
    }

    /// Clamped to `1..=5000`: a single pool never gives up more than half its input reserve.
    pub fn with_utilization_cap_bps(mut self, utilization_cap_bps: u16) -> Self {
        self.utilization_cap_bps = utilization_cap_bps.clamp(1, DEFAULT_UTILIZATION_CAP_BPS);
        self
    }

    /// Most input a single pool may take: `reserve_in * cap / 10000`.
    pub fn pool_capacity(&self, reserve_in: U256) -> U256 {
        reserve_in.saturating_mul(U256::from(self.utilization_cap_bps)) / U256::from(BPS_DENOMINATOR)
    }

    /// Allocate `amount_in` across the candidate's pools and price the result.
    ///
    /// Pools are filled in order (local before remote), each up to its utilization cap,
    /// with whatever is left carried to the next pool.
    pub fn evaluate(&self, mut candidate: RouteCandidate, amount_in: U256, symbols: &PairSymbols) -> RouteCandidate {
        let mut remaining = amount_in;
        let mut gross_output = U256::ZERO;
        let mut entries = Vec::with_capacity(candidate.pools.len());
        let mut warnings = Vec::new();

        let ordered = candidate.pools.iter().filter(|p| p.is_local).chain(candidate.pools.iter().filter(|p| !p.is_local));
        for matched in ordered {
            if remaining.is_zero() {
                break;
            }
            if matched.reserve_out.is_zero() {
                continue;
            }
            let chunk = remaining.min(self.pool_capacity(matched.reserve_in));
            if chunk.is_zero() {
                continue;
            }

            let quote = constant_product_out(chunk, matched.reserve_in, matched.reserve_out, matched.pool.fee_bps);
            if quote.sanity_warning {
                warnings.push(RouteWarning::PriceSanity {
                    source_id: matched.pool.source_id.clone(),
                    pool: matched.pool.pool_address,
                    amount_out: quote.amount_out,
                    linear_estimate: quote.linear_estimate,
                });
            }
            if matched.pool.is_synthetic_fallback {
                warnings.push(RouteWarning::SyntheticLiquidity {
                    source_id: matched.pool.source_id.clone(),
                    pool: matched.pool.pool_address,
                });
            }

            remaining -= chunk;
            gross_output = gross_output.saturating_add(quote.amount_out);
            entries.push(AllocationEntry {
                pool: matched.clone(),
                amount_allocated: chunk,
                expected_output: quote.amount_out,
                price_sanity_warning: quote.sanity_warning,
            });
        }

        if !remaining.is_zero() {
            warnings.push(RouteWarning::PartialFill { unfilled: remaining });
        }

        let cost_usd = self.cost_model.cost_usd_for(candidate.remote_sources_used.len());
        let cost = self.cost_model.cost_in_output_token(cost_usd, symbols, &candidate.pools);
        if let Some(warning) = cost.warning {
            warnings.push(warning);
        }

        candidate.gross_output = gross_output;
        candidate.cost_usd = cost_usd;
        candidate.cost_in_output_token = cost.amount;
        candidate.net_output = gross_output.saturating_sub(cost.amount);
        candidate.filled_input = amount_in - remaining;
        candidate.unfilled_input = remaining;
        candidate.entries = entries;
        candidate.warnings = warnings;

        debug!(
            "{}: gross {} - cost {} = net {} (unfilled {})",
            candidate.label, candidate.gross_output, candidate.cost_in_output_token, candidate.net_output, remaining
        );
        candidate
    }

    /// Evaluate every candidate and rank by net output, best first.
    ///
    /// Ties keep enumeration order. The head of the returned list is the winner.
    pub fn select(&self, candidates: Vec<RouteCandidate>, amount_in: U256, symbols: &PairSymbols) -> Vec<RouteCandidate> {
        let mut ranked: Vec<RouteCandidate> =
            candidates.into_iter().map(|candidate| self.evaluate(candidate, amount_in, symbols)).collect();
        ranked.sort_by(|a, b| b.net_output.cmp(&a.net_output));

        if let Some(winner) = ranked.first() {
            if !winner.unfilled_input.is_zero() {
                warn!("Best route {} leaves {} of the input unfilled", winner.label, winner.unfilled_input);
            }
        }
        ranked
    }
}
