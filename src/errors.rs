use crate::logic::pools::SourceId;
use std::time::Duration;

/// Errors surfaced by the depth tracker and the route optimizer.
///
/// Only [`RouteError::NoLiquidity`] is fatal to a route request. Source-level
/// failures (`SourceUnreachable`, `Timeout`, `Rpc`, `Abi`, `Http`) are absorbed by
/// the depth tracker and replaced with synthetic fallback depth.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("no pool on any configured source serves {token_in} -> {token_out}")]
    NoLiquidity { token_in: String, token_out: String },
    #[error("source {source_id} unreachable: {reason}")]
    SourceUnreachable { source_id: SourceId, reason: String },
    #[error("source {source_id} did not answer within {timeout:?}")]
    Timeout { source_id: SourceId, timeout: Duration },
    #[error("unknown source: {0}")]
    UnknownSource(SourceId),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("input amount must be greater than zero")]
    ZeroAmount,
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error(transparent)]
    Abi(#[from] alloy_sol_types::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl RouteError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether the error came from talking to a source rather than from the request itself.
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            Self::SourceUnreachable { .. } | Self::Timeout { .. } | Self::Rpc(_) | Self::Abi(_) | Self::Http(_)
        )
    }
}

pub type RouteResult<T> = Result<T, RouteError>;
