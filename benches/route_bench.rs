use alloy_primitives::{Address, U256};
use criterion::{Criterion, criterion_group, criterion_main};
use lazy_static::lazy_static;
use split_route::data_sync::DepthSnapshot;
use split_route::logic::{LogicalTokenResolver, PairSymbols, RouteCandidate};
use split_route::utils::fixed_point::pow10;
use split_route::{CostModel, Pool, RouteEnumerator, RouteSelector, SourceId, TokenRef};
use std::hint::black_box;
use std::sync::Arc;

const REMOTE_SOURCES: u8 = 8;

lazy_static! {
    static ref RESOLVER: LogicalTokenResolver = build_resolver();
    static ref SNAPSHOT: DepthSnapshot = build_snapshot();
    static ref COST_MODEL: CostModel = CostModel::new("0.0002".parse().unwrap(), "0.10".parse().unwrap(), "USDC");
}

fn source_name(i: u8) -> String {
    if i == 0 { "flow-evm".to_string() } else { format!("remote-{i}") }
}

fn build_resolver() -> LogicalTokenResolver {
    let mut resolver = LogicalTokenResolver::new("USDC", "FLOW");
    for i in 0..=REMOTE_SOURCES {
        let source = SourceId::new(source_name(i));
        resolver.insert(source.clone(), "FLOW", Address::repeat_byte(i * 2 + 1));
        resolver.insert(source, "USDC", Address::repeat_byte(i * 2 + 2));
    }
    resolver
}

fn build_snapshot() -> DepthSnapshot {
    let mut snapshot = DepthSnapshot::new();
    for i in 0..=REMOTE_SOURCES {
        let depth = 500u64 * (u64::from(i) + 1);
        let pool = Pool {
            source_id: SourceId::new(source_name(i)),
            pool_address: Address::repeat_byte(0x80 + i),
            token_a: Address::repeat_byte(i * 2 + 1),
            token_b: Address::repeat_byte(i * 2 + 2),
            reserve_a: U256::from(depth) * pow10(18),
            reserve_b: U256::from(depth) * pow10(3),
            decimals_a: 18,
            decimals_b: 6,
            fee_bps: 30,
            total_supply: U256::ZERO,
            tvl_usd: U256::ZERO,
            last_update: 0,
            is_synthetic_fallback: false,
            is_aggregated_vault: false,
        };
        snapshot.insert(pool.source_id.clone(), Arc::from(vec![pool]));
    }
    snapshot
}

fn enumerate(amount_in: U256) -> (Vec<RouteCandidate>, PairSymbols) {
    let result = RouteEnumerator::new(&RESOLVER)
        .with_max_remote_pools(REMOTE_SOURCES as usize)
        .enumerate(
            &SNAPSHOT,
            &TokenRef::Symbol("FLOW".to_string()),
            &TokenRef::Symbol("USDC".to_string()),
            amount_in,
            &SourceId::from("flow-evm"),
        )
        .unwrap();
    (result.candidates, result.symbols)
}

fn benchmark_routing(c: &mut Criterion) {
    let amount_in = U256::from(4_000u64) * pow10(18);
    let mut group = c.benchmark_group("routing");

    group.bench_function("enumerate_8_remote", |b| b.iter(|| enumerate(black_box(amount_in))));

    group.bench_function("enumerate_and_select_8_remote", |b| {
        let selector = RouteSelector::new(&COST_MODEL);
        b.iter(|| {
            let (candidates, symbols) = enumerate(black_box(amount_in));
            selector.select(candidates, amount_in, &symbols)
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_routing);
criterion_main!(benches);
