// Three-Layer Architecture
pub mod data_sync; // Data Layer: reserve polling, depth snapshots
pub mod execution; // Execution Layer: cross-source transfer plans
pub mod logic; // Logic Layer: enumeration, allocation, ranking

// Common utilities and types
pub mod errors;
pub mod utils;

// Re-export key components from each layer
pub use data_sync::{
    DepthRefreshService, DepthSnapshot, DepthStore, DepthTracker, DepthTrackerConfig, RefreshReport, ReserveReader,
    RpcReserveReader, SourceConfig, SourceStatus, StaticReserveReader,
};
pub use errors::{RouteError, RouteResult};
pub use execution::{CrossChainTransfer, TransferDirection, derive_transfers};
pub use logic::{
    CostModel, LogicalTokenResolver, Pool, RouteAllocation, RouteCandidate, RouteEnumerator, RouteOptimizer, RouteRequest,
    RouteSelector, RouteWarning, RouterConfig, Side, SourceId, TokenRef, compute_output,
};
pub use utils::{AppConfig, Token, UsdAmount};
