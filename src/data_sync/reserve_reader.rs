use crate::data_sync::source::{PoolEndpoint, ReserveShape, SourceConfig};
use crate::errors::{RouteError, RouteResult};
use crate::logic::pools::SourceId;
use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, sol};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

sol! {
    /// Two-sided pool exposing its token pair and reserves directly
    interface IPairedPool {
        function getTokens() external view returns (address tokenA, address tokenB);
        function getReserves() external view returns (uint256 reserveA, uint256 reserveB);
        function totalSupply() external view returns (uint256);
        function swapFeeBps() external view returns (uint256);
    }

    /// Vault holding project token and stable balances as aggregate totals
    interface IReserveVault {
        function projectToken() external view returns (address);
        function usdc() external view returns (address);
        function totalProjectToken() external view returns (uint256);
        function totalUSDC() external view returns (uint256);
    }

    interface IERC20Metadata {
        function decimals() external view returns (uint8);
    }
}

/// Reserve state exactly as read from a pool contract, before normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawReserves {
    pub token_a: Address,
    pub token_b: Address,
    pub reserve_a: U256,
    pub reserve_b: U256,
    pub total_supply: U256,
    /// `None` when the contract has no fee accessor; the source default applies.
    pub fee_bps: Option<u16>,
    pub is_vault: bool,
}

impl RawReserves {
    pub fn paired(token_a: Address, token_b: Address, reserve_a: U256, reserve_b: U256) -> Self {
        Self { token_a, token_b, reserve_a, reserve_b, total_supply: U256::ZERO, fee_bps: None, is_vault: false }
    }

    pub fn vault(project_token: Address, stable_token: Address, total_project: U256, total_stable: U256) -> Self {
        Self {
            token_a: project_token,
            token_b: stable_token,
            reserve_a: total_project,
            reserve_b: total_stable,
            total_supply: U256::ZERO,
            fee_bps: None,
            is_vault: true,
        }
    }

    pub fn with_fee_bps(mut self, fee_bps: u16) -> Self {
        self.fee_bps = Some(fee_bps);
        self
    }

    pub fn with_total_supply(mut self, total_supply: U256) -> Self {
        self.total_supply = total_supply;
        self
    }
}

/// Read-only access to the reserve interface of one source.
#[async_trait]
pub trait ReserveReader: Send + Sync {
    async fn read_reserves(&self, source: &SourceConfig, endpoint: &PoolEndpoint) -> RouteResult<RawReserves>;

    async fn read_decimals(&self, source: &SourceConfig, token: Address) -> RouteResult<u8>;
}

/// `eth_call` over JSON-RPC, one HTTP request per contract call.
#[derive(Debug, Clone)]
pub struct RpcReserveReader {
    http_client: reqwest::Client,
}

impl RpcReserveReader {
    pub fn new(timeout: Duration) -> RouteResult<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client })
    }

    async fn call<C: SolCall>(&self, rpc_url: &str, to: Address, call: C) -> RouteResult<C::Return> {
        let data = call.abi_encode();
        let request_body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [
                {
                    "to": format!("{:#x}", to),
                    "data": format!("0x{}", hex::encode(&data))
                },
                "latest"
            ],
            "id": 1
        });

        let response = self.http_client.post(rpc_url).json(&request_body).send().await?;
        let response_json: Value = response.json().await?;

        if let Some(error) = response_json.get("error") {
            return Err(RouteError::Rpc(format!("{} reverted: {}", C::SIGNATURE, error)));
        }

        let result = response_json
            .get("result")
            .and_then(|r| r.as_str())
            .ok_or_else(|| RouteError::Rpc(format!("missing result for {}", C::SIGNATURE)))?;

        let bytes = hex::decode(result.trim_start_matches("0x"))
            .map_err(|e| RouteError::Rpc(format!("invalid hex in {} result: {e}", C::SIGNATURE)))?;
        Ok(C::abi_decode_returns(&bytes)?)
    }

    async fn read_paired(&self, rpc_url: &str, pool: Address) -> RouteResult<RawReserves> {
        let (tokens, reserves, total_supply) = tokio::try_join!(
            self.call(rpc_url, pool, IPairedPool::getTokensCall {}),
            self.call(rpc_url, pool, IPairedPool::getReservesCall {}),
            self.call(rpc_url, pool, IPairedPool::totalSupplyCall {}),
        )?;

        // Older deployments have no fee accessor.
        let fee_bps = match self.call(rpc_url, pool, IPairedPool::swapFeeBpsCall {}).await {
            Ok(fee) => Some(u16::try_from(fee).unwrap_or(u16::MAX)),
            Err(e) => {
                debug!(pool = %pool, error = %e, "swapFeeBps unavailable");
                None
            }
        };

        Ok(RawReserves {
            token_a: tokens.tokenA,
            token_b: tokens.tokenB,
            reserve_a: reserves.reserveA,
            reserve_b: reserves.reserveB,
            total_supply,
            fee_bps,
            is_vault: false,
        })
    }

    async fn read_vault(&self, rpc_url: &str, vault: Address) -> RouteResult<RawReserves> {
        let (project_token, stable_token, total_project, total_stable) = tokio::try_join!(
            self.call(rpc_url, vault, IReserveVault::projectTokenCall {}),
            self.call(rpc_url, vault, IReserveVault::usdcCall {}),
            self.call(rpc_url, vault, IReserveVault::totalProjectTokenCall {}),
            self.call(rpc_url, vault, IReserveVault::totalUSDCCall {}),
        )?;
        Ok(RawReserves::vault(project_token, stable_token, total_project, total_stable))
    }
}

#[async_trait]
impl ReserveReader for RpcReserveReader {
    async fn read_reserves(&self, source: &SourceConfig, endpoint: &PoolEndpoint) -> RouteResult<RawReserves> {
        match endpoint.shape {
            ReserveShape::Paired => self.read_paired(&source.rpc_url, endpoint.address).await,
            ReserveShape::Vault => self.read_vault(&source.rpc_url, endpoint.address).await,
        }
    }

    async fn read_decimals(&self, source: &SourceConfig, token: Address) -> RouteResult<u8> {
        self.call(&source.rpc_url, token, IERC20Metadata::decimalsCall {}).await
    }
}

/// Scripted answer for one pool of a [`StaticReserveReader`].
#[derive(Clone, Debug)]
pub enum ScriptedResponse {
    Reserves(RawReserves),
    Fail(String),
    /// Never answers; exercises the per-source timeout.
    Hang,
}

/// In-memory [`ReserveReader`] for tests, benchmarks and offline demos.
#[derive(Debug, Default)]
pub struct StaticReserveReader {
    responses: DashMap<(SourceId, Address), ScriptedResponse>,
    decimals: DashMap<Address, u8>,
    calls: AtomicUsize,
}

impl StaticReserveReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reserves(self, source_id: &str, pool: Address, reserves: RawReserves) -> Self {
        self.set_response(source_id, pool, ScriptedResponse::Reserves(reserves));
        self
    }

    pub fn with_failure(self, source_id: &str, pool: Address, reason: &str) -> Self {
        self.set_response(source_id, pool, ScriptedResponse::Fail(reason.to_string()));
        self
    }

    pub fn with_hang(self, source_id: &str, pool: Address) -> Self {
        self.set_response(source_id, pool, ScriptedResponse::Hang);
        self
    }

    pub fn with_decimals(self, token: Address, decimals: u8) -> Self {
        self.decimals.insert(token, decimals);
        self
    }

    pub fn set_response(&self, source_id: &str, pool: Address, response: ScriptedResponse) {
        self.responses.insert((SourceId::from(source_id), pool), response);
    }

    /// Number of `read_reserves` calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReserveReader for StaticReserveReader {
    async fn read_reserves(&self, source: &SourceConfig, endpoint: &PoolEndpoint) -> RouteResult<RawReserves> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Clone out of the map so no shard lock is held across an await.
        let response = self.responses.get(&(source.id.clone(), endpoint.address)).map(|r| r.value().clone());
        match response {
            Some(ScriptedResponse::Reserves(reserves)) => Ok(reserves),
            Some(ScriptedResponse::Fail(reason)) => {
                Err(RouteError::SourceUnreachable { source_id: source.id.clone(), reason })
            }
            Some(ScriptedResponse::Hang) => std::future::pending().await,
            None => Err(RouteError::SourceUnreachable {
                source_id: source.id.clone(),
                reason: format!("no scripted response for pool {}", endpoint.address),
            }),
        }
    }

    async fn read_decimals(&self, source: &SourceConfig, token: Address) -> RouteResult<u8> {
        self.decimals
            .get(&token)
            .map(|d| *d.value())
            .ok_or_else(|| RouteError::Rpc(format!("decimals() reverted for {token} on {}", source.id)))
    }
}
