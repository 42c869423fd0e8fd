//! Quote one swap across every configured source.
//!
//! ```text
//! cargo run --example route_quote -- config.toml FLOW USDC 4000
//! ```
use eyre::{Result, eyre};
use split_route::data_sync::RpcReserveReader;
use split_route::utils::Token;
use split_route::{AppConfig, RouteOptimizer, RouteRequest, TokenRef};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = args.first().map(String::as_str).unwrap_or("config.toml");
    let token_in: TokenRef = args.get(1).map(String::as_str).unwrap_or("FLOW").parse()?;
    let token_out: TokenRef = args.get(2).map(String::as_str).unwrap_or("USDC").parse()?;
    let amount = args.get(3).map(String::as_str).unwrap_or("4000");

    let config = AppConfig::load(config_path).await?;
    let execution_source = config
        .sources
        .iter()
        .find(|s| s.id == config.router.execution_source)
        .ok_or_else(|| eyre!("execution source {} is not configured", config.router.execution_source))?;
    let decimals = match &token_in {
        TokenRef::Symbol(symbol) if symbol.eq_ignore_ascii_case(&config.router.stable_symbol) => {
            execution_source.stable_decimals
        }
        _ => execution_source.asset_decimals,
    };
    let amount_in = Token::new_with_data(execution_source.id.clone(), Default::default(), None, Some(decimals)).parse_amount(amount)?;

    let reader = Arc::new(RpcReserveReader::new(config.tracker.fetch_timeout())?);
    let optimizer = RouteOptimizer::from_config(config, reader)?;

    let report = optimizer.tracker().refresh().await;
    info!("Refresh #{} took {:?}", report.generation, report.duration);
    for source in &report.sources {
        println!("{:<12} {:<40} pools: {} (synthetic: {})", source.source_id, source.status, source.pool_count, source.synthetic_count);
    }

    let allocation = optimizer.get_route(&RouteRequest::new(token_in, token_out, amount_in)).await?;

    println!("\nCandidates:");
    for (rank, candidate) in allocation.ranked.iter().enumerate() {
        println!(
            "{:>3}. {:<32} gross {:>14}  net {:>14}  {}",
            rank + 1,
            candidate.label,
            allocation.token_out.to_float(candidate.gross_output),
            allocation.token_out.to_float(candidate.net_output),
            if candidate.unfilled_input.is_zero() { "" } else { "(partial)" }
        );
    }

    println!("\n{}", allocation.summary());
    for transfer in &allocation.transfers {
        println!(
            "{} {} -> {}: {} {}",
            transfer.direction, transfer.from_source, transfer.to_source, transfer.amount, transfer.token
        );
    }
    for warning in &allocation.warnings {
        println!("warning: {warning}");
    }
    Ok(())
}
