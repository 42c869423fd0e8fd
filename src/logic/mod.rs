//! Logic layer.
//!
//! Pure routing over a depth snapshot: resolve logical tokens, enumerate candidate
//! pool sets, allocate input under the utilization cap, price each candidate net of
//! execution cost and rank. Nothing in here performs I/O.

pub mod cost_model;
pub mod engine;
pub mod enumerator;
pub mod output_calculator;
pub mod pools;
pub mod resolver;
pub mod selector;
pub mod types;

pub use cost_model::{CostModel, CostQuote};
pub use engine::RouteOptimizer;
pub use enumerator::{EnumerationResult, MatchConfidence, MatchedPool, RouteEnumerator, TokenRef};
pub use output_calculator::{OutputQuote, compute_output, constant_product_out, quote_output};
pub use pools::{Pool, Side, SourceId, SyntheticPool};
pub use resolver::{LogicalTokenResolver, TokenResolution};
pub use selector::RouteSelector;
pub use types::{AllocationEntry, PairSymbols, RouteAllocation, RouteCandidate, RouteRequest, RouteWarning, RouterConfig};
