//! HTTP/WebSocket transport listener built on Axum.

use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use axum::routing::{get, post};
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use walletbridge_core::{Bridge, PeerSession, RequestGate};

use crate::handler::{handle_health, handle_root, handle_rpc};

/// Application state shared across handlers.
pub struct AppState {
    /// Interception gate for account/signing methods (owns the bridge).
    pub gate: RequestGate,
    /// JSON-RPC URL of the local node for pass-through methods.
    pub node_url: String,
    /// Client used to proxy non-wallet methods to the node.
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(gate: RequestGate, node_url: impl Into<String>) -> Self {
        Self {
            gate,
            node_url: node_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn bridge(&self) -> &Arc<Bridge> {
        self.gate.bridge()
    }
}

/// A running relay server.
///
/// The listener runs on a spawned task, so dropping the handle does not keep
/// the process alive. [`ServerHandle::stop`] shuts the listener down
/// gracefully and releases the bound port.
pub struct ServerHandle {
    addr: SocketAddr,
    bridge: Arc<Bridge>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Actual bound address (useful when port=0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop the listener and wait for it to release the port.
    pub async fn stop(self) {
        self.bridge.request_stop();
        let _ = self.task.await;
    }
}

/// Bind the relay server and start accepting connections.
///
/// One port carries everything: `GET /` serves the wallet bootstrap page or
/// upgrades to the duplex WebSocket, `POST /rpc` is the caller endpoint, and
/// `GET /health` reports liveness. Shutdown is wired to the bridge's stop
/// signal, so both [`ServerHandle::stop`] and the stop-on-disconnect policy
/// end the same graceful teardown.
pub async fn start_server(state: Arc<AppState>) -> anyhow::Result<ServerHandle> {
    let bridge = state.bridge().clone();

    // Configure CORS for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/rpc", post(handle_rpc))
        .layer(cors)
        .with_state(state);

    // Parse the address
    let config = bridge.config();
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    // Bind to the address
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    let mut shutdown = bridge.shutdown_signal();
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|stopped| *stopped).await;
            })
            .await
            .expect("Server error");
    });

    Ok(ServerHandle {
        addr: actual_addr,
        bridge,
        task,
    })
}

/// Drive one accepted wallet WebSocket until it closes.
///
/// Claims the active peer slot; a second incoming connection is closed
/// immediately with a policy reason while the occupant stays untouched.
pub(crate) async fn wallet_session(state: Arc<AppState>, mut socket: WebSocket) {
    let bridge = state.bridge();
    let PeerSession {
        generation,
        mut outbound,
    } = match bridge.accept_peer() {
        Ok(session) => session,
        Err(err) => {
            warn!("rejecting wallet connection: {err}");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: Cow::from("a wallet tab is already connected"),
                })))
                .await;
            return;
        }
    };

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(text) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => bridge.handle_frame(&text),
                Some(Ok(Message::Close(_))) | None => break,
                // Pings are answered by axum; anything else is not part of
                // the protocol.
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!("wallet socket error: {err}");
                    break;
                }
            },
        }
    }
    bridge.release_peer(generation);
}
