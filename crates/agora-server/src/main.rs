//! Agora market simulator - server entry point.

use agora_market::RevaluationScheduler;
use agora_service::TradingService;
use agora_store::{JsonAccountStore, JsonMarketStore};
use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Agora synthetic market simulator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via AGORA_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config drives the default log filter, so load it first with a
    // fallback filter only for load-time diagnostics.
    let config = agora_server::AppConfig::load(args.config)?;
    agora_server::init_logging(&config.log_level);

    info!("Starting Agora server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        port = config.port,
        data_dir = %config.data_dir.display(),
        grid_interval_min = config.grid_interval_minutes,
        "Configuration loaded"
    );

    let market_store = Arc::new(JsonMarketStore::new(
        config.market_path(),
        config.grid_interval(),
    ));
    let account_store = Arc::new(JsonAccountStore::new(config.accounts_path()));

    let service = Arc::new(TradingService::new(
        market_store,
        account_store,
        config.initial_balance,
        config.deposit_cap,
        config.grid_interval(),
        config.admin_identities.clone(),
    ));

    // Materialize the roster before serving so the first request and the
    // scheduler both see an initialized market.
    let snapshot = service.market()?;
    info!(
        instruments = snapshot.instruments.len(),
        next_update = %snapshot.next_update_at,
        "Market ready"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler =
        RevaluationScheduler::new(service.clone(), config.grid_interval(), shutdown_rx);
    let scheduler_task = tokio::spawn(scheduler.run());

    let state = agora_server::AppState { service };
    let app = agora_server::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    shutdown_tx.send(true).ok();
    scheduler_task.await?;
    info!("Server stopped");
    Ok(())
}
