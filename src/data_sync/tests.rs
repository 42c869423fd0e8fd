/// Integration tests for the data layer
///
/// These drive the depth tracker and the refresh service against a scripted
/// reserve reader, so no network access is needed.

#[cfg(test)]
mod integration_tests {
    use super::super::*;
    use crate::errors::RouteError;
    use crate::logic::pools::SourceId;
    use crate::utils::fixed_point::pow10;
    use alloy_primitives::{Address, U256};
    use std::sync::Arc;
    use tokio::time::Duration;

    const BASE_POOL: Address = Address::repeat_byte(0xb0);
    const BASE_POOL_2: Address = Address::repeat_byte(0xb1);
    const POLYGON_POOL: Address = Address::repeat_byte(0xc0);
    const VAULT: Address = Address::repeat_byte(0xd0);

    const FLOW_BASE: Address = Address::repeat_byte(0x01);
    const USDC_BASE: Address = Address::repeat_byte(0x02);
    const FLOW_POLYGON: Address = Address::repeat_byte(0x11);
    const USDC_POLYGON: Address = Address::repeat_byte(0x12);

    fn base_source() -> SourceConfig {
        SourceConfig::new("base", "https://base.example")
            .with_token("FLOW", FLOW_BASE)
            .with_token("USDC", USDC_BASE)
            .with_pool(PoolEndpoint::paired(BASE_POOL))
    }

    fn polygon_source() -> SourceConfig {
        SourceConfig::new("polygon", "https://polygon.example")
            .with_token("FLOW", FLOW_POLYGON)
            .with_token("USDC", USDC_POLYGON)
            .with_pool(PoolEndpoint::paired(POLYGON_POOL))
    }

    fn base_reserves() -> RawReserves {
        RawReserves::paired(FLOW_BASE, USDC_BASE, U256::from(1_000u64) * pow10(18), U256::from(1u64) * pow10(6))
            .with_fee_bps(30)
    }

    fn polygon_reserves() -> RawReserves {
        RawReserves::paired(USDC_POLYGON, FLOW_POLYGON, U256::from(5u64) * pow10(6), U256::from(5_000u64) * pow10(18))
            .with_fee_bps(25)
    }

    fn scripted_reader() -> StaticReserveReader {
        StaticReserveReader::new()
            .with_reserves("base", BASE_POOL, base_reserves())
            .with_reserves("polygon", POLYGON_POOL, polygon_reserves())
            .with_decimals(FLOW_BASE, 18)
            .with_decimals(USDC_BASE, 6)
            .with_decimals(FLOW_POLYGON, 18)
            .with_decimals(USDC_POLYGON, 6)
    }

    fn tracker_with(reader: Arc<StaticReserveReader>, sources: Vec<SourceConfig>, config: DepthTrackerConfig) -> DepthTracker {
        DepthTracker::new(sources, reader, config).unwrap().with_symbols("USDC", "FLOW")
    }

    fn fast_config() -> DepthTrackerConfig {
        DepthTrackerConfig { fetch_timeout_ms: 100, ..DepthTrackerConfig::default() }
    }

    #[tokio::test]
    async fn test_refresh_normalizes_live_pools() {
        let reader = Arc::new(scripted_reader());
        let tracker = tracker_with(reader, vec![base_source(), polygon_source()], fast_config());

        let report = tracker.refresh().await;
        assert!(report.is_fully_live());
        assert_eq!(report.generation, 1);

        let snapshot = tracker.store().snapshot();
        let polygon = &snapshot[&SourceId::from("polygon")][0];
        assert_eq!(polygon.token_a, USDC_POLYGON);
        assert_eq!(polygon.decimals_a, 6);
        assert_eq!(polygon.decimals_b, 18);
        assert_eq!(polygon.fee_bps, 25);
        assert!(!polygon.is_synthetic_fallback);
        // $5 of stable plus 5000 FLOW at $0.001
        assert_eq!(polygon.tvl_usd, U256::from(10u64) * pow10(18));
    }

    #[tokio::test]
    async fn test_failing_source_gets_synthetic_depth() {
        let reader = Arc::new(scripted_reader().with_failure("polygon", POLYGON_POOL, "connection refused"));
        let tracker = tracker_with(reader, vec![base_source(), polygon_source()], fast_config());

        let snapshot = tracker.get_all().await;
        let polygon = snapshot.get(&SourceId::from("polygon")).expect("failed source must stay in the snapshot");
        assert_eq!(polygon.len(), 1);
        assert!(polygon[0].is_synthetic_fallback);
        assert!(polygon[0].has_liquidity());
        assert_eq!(polygon[0].pool_address, POLYGON_POOL);
        // Configured addresses are used for the placeholder tokens
        assert_eq!(polygon[0].token_a, FLOW_POLYGON);
        assert_eq!(polygon[0].token_b, USDC_POLYGON);

        let base = &snapshot[&SourceId::from("base")];
        assert!(!base[0].is_synthetic_fallback);

        let status = tracker.store().get(&SourceId::from("polygon")).unwrap().status;
        assert!(matches!(status, SourceStatus::SyntheticFallback { reason } if reason.contains("connection refused")));
    }

    #[tokio::test]
    async fn test_empty_reserves_get_synthetic_depth() {
        let empty = RawReserves::paired(FLOW_BASE, USDC_BASE, U256::ZERO, U256::ZERO);
        let reader = Arc::new(scripted_reader().with_reserves("base", BASE_POOL, empty));
        let tracker = tracker_with(reader, vec![base_source()], fast_config());

        let report = tracker.refresh().await;
        let base = report.source(&SourceId::from("base")).unwrap();
        assert_eq!(base.synthetic_count, 1);
        assert!(matches!(base.status, SourceStatus::SyntheticFallback { .. }));
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let reader = Arc::new(scripted_reader().with_failure("polygon", POLYGON_POOL, "down"));
        let tracker = tracker_with(reader, vec![base_source(), polygon_source()], fast_config());

        tracker.refresh().await;
        let first = tracker.store().snapshot();
        tracker.refresh().await;
        let second = tracker.store().snapshot();

        assert_eq!(first.len(), second.len());
        for (source_id, pools) in &first {
            let again = &second[source_id];
            assert_eq!(pools.len(), again.len());
            for (a, b) in pools.iter().zip(again.iter()) {
                assert!(a.same_state(b), "{source_id} changed between identical refreshes");
            }
        }
    }

    #[tokio::test]
    async fn test_hanging_source_is_isolated_by_timeout() {
        let reader = Arc::new(scripted_reader().with_hang("polygon", POLYGON_POOL));
        let tracker = tracker_with(reader, vec![base_source(), polygon_source()], fast_config());

        let report = tokio::time::timeout(Duration::from_secs(5), tracker.refresh())
            .await
            .expect("refresh must not wait on a hanging source");

        assert!(report.source(&SourceId::from("base")).unwrap().status.is_live());
        let polygon = report.source(&SourceId::from("polygon")).unwrap();
        assert!(matches!(&polygon.status, SourceStatus::SyntheticFallback { reason } if reason.contains("did not answer")));
        assert_eq!(polygon.synthetic_count, 1);
    }

    #[tokio::test]
    async fn test_partial_failure_degrades_source() {
        let source = base_source().with_pool(PoolEndpoint::paired(BASE_POOL_2));
        let reader = Arc::new(scripted_reader().with_failure("base", BASE_POOL_2, "reverted"));
        let tracker = tracker_with(reader, vec![source], fast_config());

        let report = tracker.refresh().await;
        let base = report.source(&SourceId::from("base")).unwrap();
        assert_eq!(base.status, SourceStatus::Degraded { failed_pools: 1 });
        assert_eq!(base.pool_count, 2);
        assert_eq!(base.synthetic_count, 1);
    }

    #[tokio::test]
    async fn test_fallback_disabled_reports_unavailable() {
        let reader = Arc::new(scripted_reader().with_failure("polygon", POLYGON_POOL, "down"));
        let config = DepthTrackerConfig { synthetic_fallback: false, ..fast_config() };
        let tracker = tracker_with(reader, vec![base_source(), polygon_source()], config);

        let snapshot = tracker.get_all().await;
        assert!(snapshot[&SourceId::from("polygon")].is_empty());
        assert!(matches!(
            tracker.store().get(&SourceId::from("polygon")).unwrap().status,
            SourceStatus::Unavailable { .. }
        ));
    }

    #[tokio::test]
    async fn test_source_without_pools_gets_placeholder() {
        let bare = SourceConfig::new("arbitrum", "https://arbitrum.example");
        let reader = Arc::new(scripted_reader());
        let tracker = tracker_with(reader.clone(), vec![bare], fast_config());

        let snapshot = tracker.get_all().await;
        let pools = &snapshot[&SourceId::from("arbitrum")];
        assert_eq!(pools.len(), 1);
        assert!(pools[0].is_synthetic_fallback);
        assert_eq!(reader.call_count(), 0);
    }

    #[tokio::test]
    async fn test_vault_decimals_fall_back_to_source_defaults() {
        let project = Address::repeat_byte(0x21);
        let stable = Address::repeat_byte(0x22);
        let source = SourceConfig::new("flow-evm", "https://flow.example")
            .with_decimals(8, 6)
            .with_pool(PoolEndpoint::vault(VAULT));
        let raw = RawReserves::vault(project, stable, U256::from(100u64) * pow10(8), U256::from(50u64) * pow10(6));
        // decimals() is scripted for neither token
        let reader = Arc::new(StaticReserveReader::new().with_reserves("flow-evm", VAULT, raw));
        let tracker = tracker_with(reader, vec![source], fast_config());

        let snapshot = tracker.get_all().await;
        let vault = &snapshot[&SourceId::from("flow-evm")][0];
        assert!(vault.is_aggregated_vault);
        assert_eq!(vault.decimals_a, 8);
        assert_eq!(vault.decimals_b, 6);
        assert_eq!(vault.fee_bps, 30);
        assert_eq!(vault.tvl_usd, U256::from(100u64) * pow10(18));
    }

    #[tokio::test]
    async fn test_get_all_refreshes_only_on_cold_start() {
        let reader = Arc::new(scripted_reader());
        let tracker = tracker_with(reader.clone(), vec![base_source(), polygon_source()], fast_config());

        assert!(!tracker.store().is_populated());
        tracker.get_all().await;
        assert_eq!(reader.call_count(), 2);

        // Later reads are served from the store
        tracker.get_all().await;
        assert_eq!(reader.call_count(), 2);
        assert_eq!(tracker.store().generation(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_cold_start_reads_share_one_refresh() {
        // The hanging pool keeps the first refresh in flight until the fetch timeout
        let reader = Arc::new(scripted_reader().with_hang("polygon", POLYGON_POOL));
        let tracker = tracker_with(reader.clone(), vec![base_source(), polygon_source()], fast_config());

        let (first, second) = tokio::join!(tracker.get_all(), tracker.get_all());
        assert_eq!(reader.call_count(), 2);
        assert_eq!(tracker.store().generation(), 1);
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn test_get_for_source() {
        let reader = Arc::new(scripted_reader());
        let tracker = tracker_with(reader.clone(), vec![base_source(), polygon_source()], fast_config());

        let pools = tracker.get_for_source(&SourceId::from("polygon")).await.unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(reader.call_count(), 1);

        // Cached now
        tracker.get_for_source(&SourceId::from("polygon")).await.unwrap();
        assert_eq!(reader.call_count(), 1);

        let err = tracker.get_for_source(&SourceId::from("solana")).await.unwrap_err();
        assert!(matches!(err, RouteError::UnknownSource(id) if id.as_str() == "solana"));
    }

    #[tokio::test]
    async fn test_injected_store_is_shared() {
        let store = Arc::new(DepthStore::new());
        let tracker = tracker_with(Arc::new(scripted_reader()), vec![base_source()], fast_config()).with_store(store.clone());

        let report = tracker.refresh().await;
        assert!(store.is_populated());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&SourceId::from("base")).unwrap().generation, report.generation);
    }

    #[tokio::test]
    async fn test_refresh_service_lifecycle() {
        let tracker = Arc::new(tracker_with(Arc::new(scripted_reader()), vec![base_source(), polygon_source()], fast_config()));
        let mut service = DepthRefreshService::new(tracker.clone());
        assert!(!service.is_running());

        let mut reports = service.start().await.unwrap();
        assert!(service.is_running());
        assert!(service.start().await.is_err());

        // The first cycle runs immediately
        let report = tokio::time::timeout(Duration::from_secs(5), reports.recv())
            .await
            .expect("first refresh report")
            .expect("report channel open");
        assert_eq!(report.sources.len(), 2);
        assert!(tracker.store().is_populated());

        service.stop().await.unwrap();
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn test_stop_without_start() {
        let tracker = Arc::new(tracker_with(Arc::new(scripted_reader()), vec![base_source()], fast_config()));
        let mut service = DepthRefreshService::new(tracker);
        assert!(service.stop().await.is_ok());
    }
}
