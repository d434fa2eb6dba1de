//! Walletbridge RPC Server - JSON-RPC relay between a local dev node and a
//! browser wallet.
//!
//! This binary serves the wallet bootstrap page and WebSocket on one port
//! and exposes a caller-facing `/rpc` endpoint: account and signing methods
//! are relayed to the connected wallet tab (after chain reconciliation),
//! everything else is proxied to the local node.

mod handler;
mod server;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use walletbridge_core::{Bridge, BridgeConfig, HttpNode, RequestGate, DEFAULT_PORT};

use crate::server::AppState;

#[derive(Parser, Debug)]
#[command(name = "walletbridge-rpc")]
#[command(about = "JSON-RPC relay between a local dev node and a browser wallet")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// JSON-RPC URL of the local node
    #[arg(long, default_value = "http://127.0.0.1:8545")]
    node_url: String,

    /// Stop the relay when the wallet tab disconnects
    #[arg(long)]
    stop_on_disconnect: bool,

    /// Fail in-flight wallet requests after this many seconds
    #[arg(long)]
    request_timeout_secs: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Walletbridge RPC Server");

    let config = BridgeConfig {
        host: args.host,
        port: args.port,
        request_timeout: args.request_timeout_secs.map(Duration::from_secs),
        stop_on_disconnect: args.stop_on_disconnect,
        ..BridgeConfig::default()
    };

    let bridge = Arc::new(Bridge::new(config));
    let node = Arc::new(HttpNode::new(args.node_url.clone()));
    let gate = RequestGate::new(bridge.clone(), node);
    let state = Arc::new(AppState::new(gate, args.node_url));

    let handle = server::start_server(state).await?;

    info!(
        "Open http://{} to connect a wallet; callers POST to http://{}/rpc",
        handle.addr(),
        handle.addr()
    );

    // Run until interrupted or, with --stop-on-disconnect, until the wallet
    // tab goes away.
    let mut shutdown = bridge.shutdown_signal();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received, exiting"),
        _ = shutdown.wait_for(|stopped| *stopped) => info!("Relay stopped, exiting"),
    }
    handle.stop().await;

    Ok(())
}
