//! Data layer.
//!
//! Reads reserve state from every configured source, normalizes it into
//! [`Pool`](crate::logic::pools::Pool) records and keeps the latest snapshot per
//! source in a [`DepthStore`]. A supervised background task refreshes the store on a
//! fixed interval; route requests only ever read it.

pub mod config;
pub mod depth_store;
pub mod reserve_reader;
pub mod service;
pub mod source;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use config::DepthTrackerConfig;
pub use depth_store::{DepthSnapshot, DepthStore, SourceStatus};
pub use reserve_reader::{RawReserves, ReserveReader, RpcReserveReader, ScriptedResponse, StaticReserveReader};
pub use service::DepthRefreshService;
pub use source::{PoolEndpoint, ReserveShape, SourceConfig};
pub use tracker::{DepthTracker, RefreshReport, SourceRefresh};
