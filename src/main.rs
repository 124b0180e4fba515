//! Poolwatch - Token Lifecycle Monitoring Engine for Solana
//!
//! Watches new liquidity pools and signal channels, snipes tokens through a
//! persistent price-triggered lifecycle.

mod adapters;
mod application;
mod config;
mod domain;
mod ports;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::{fmt, EnvFilter};

use crate::adapters::cli::{CliApp, Command, RunCmd, StatusCmd};
use crate::adapters::http::{PriceServiceClient, RpcChainClient, RugCheckClient, SwapServiceClient};
use crate::adapters::signals::{SignalIngestor, TelegramClient};
use crate::adapters::stream::PoolStreamMonitor;
use crate::application::{LifecycleMonitor, SafetyGate, TradeDispatcher};
use crate::config::load_config;
use crate::domain::TokenStore;

const DISCOVERY_QUEUE_DEPTH: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    init_logging(app.verbose, app.debug);

    match app.command {
        Command::Run(cmd) => run_command(cmd).await,
        Command::Status(cmd) => status_command(cmd).await,
    }
}

fn init_logging(verbose: bool, debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt().with_env_filter(filter).with_target(false).init();
}

async fn run_command(cmd: RunCmd) -> Result<()> {
    tracing::info!("Starting poolwatch...");

    let mut config = load_config(&cmd.config).context("Failed to load configuration")?;
    if cmd.simulate {
        config.trading.simulation_mode = true;
    }
    if config.trading.simulation_mode {
        tracing::warn!("SIMULATION MODE - no trades will be dispatched");
    }

    // Persistent store
    if let Some(parent) = std::path::Path::new(&config.store.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }
    }
    let store = Arc::new(TokenStore::open(&config.store.db_path).context("Failed to open token store")?);

    // Outbound adapters
    let market_data = Arc::new(
        PriceServiceClient::new(&config.trading.price_url, config.safety.timeout_secs)
            .context("Failed to create price client")?,
    );
    let safety = Arc::new(
        RugCheckClient::new(&config.safety.rugcheck_url, config.safety.timeout_secs)
            .context("Failed to create rug-check client")?,
    );
    let swap = Arc::new(
        SwapServiceClient::new(
            &config.trading.swap_url,
            &config.trading.base_mint,
            config.trading.swap_timeout_secs,
        )
        .context("Failed to create swap client")?,
    );
    let chain = Arc::new(
        RpcChainClient::new(
            &config.rpc.get_http_url(),
            &config.trading.base_mint,
            config.rpc.request_timeout_secs,
        )
        .context("Failed to create RPC client")?,
    );

    // Core
    let gate = SafetyGate::new(safety.clone(), market_data.clone(), &config.safety);
    let dispatcher = Arc::new(TradeDispatcher::new(swap, &config.trading));
    let monitor = Arc::new(LifecycleMonitor::new(
        store,
        gate,
        market_data,
        safety,
        dispatcher,
        &config.trading,
        &config.monitor,
    ));

    let (discovery_tx, discovery_rx) = mpsc::channel(DISCOVERY_QUEUE_DEPTH);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Stream ingestor
    let stream_monitor =
        PoolStreamMonitor::new(config.stream.clone(), chain, discovery_tx.clone());
    tokio::spawn(stream_monitor.run(shutdown_rx.clone()));

    // Signal ingestor (optional)
    if config.signals.enabled {
        let bot_token = config
            .signals
            .get_bot_token()
            .context("signals enabled but no bot token configured (set SIGNAL_BOT_TOKEN)")?;
        let client = TelegramClient::new(&bot_token, config.signals.poll_timeout_secs)
            .context("Failed to create signal client")?;
        let bot = client
            .authenticate()
            .await
            .context("Signal channel authentication failed")?;
        tracing::info!("Signal client authenticated as @{}", bot);

        let (feed_tx, feed_rx) = mpsc::channel(DISCOVERY_QUEUE_DEPTH);
        tokio::spawn(client.run(feed_tx, shutdown_rx.clone()));

        let ingestor = SignalIngestor::new(&config.signals, discovery_tx.clone());
        tokio::spawn(ingestor.run(feed_rx, shutdown_rx.clone()));
    } else {
        tracing::info!("Signal channels disabled, running stream-only");
    }
    drop(discovery_tx);

    // Ctrl+C flips the shutdown signal; every task watches it
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        shutdown_tx.send(true).ok();
    });

    monitor.run(discovery_rx, shutdown_rx).await;
    tracing::info!("Poolwatch stopped");
    Ok(())
}

async fn status_command(cmd: StatusCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let store = TokenStore::open(&config.store.db_path).context("Failed to open token store")?;
    let counts = store.counts()?;

    println!("Store: {}", config.store.db_path);
    println!("  Active:   {}", counts.active);
    println!("  Inactive: {}", counts.inactive);
    Ok(())
}
