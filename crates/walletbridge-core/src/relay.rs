//! The relay gateway: forwards JSON-RPC requests to the wallet and settles
//! them when the correlated response frame comes back.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::correlation::CorrelationTable;
use crate::error::{BridgeError, Result};
use crate::peer::{PeerSession, PeerSlot};
use crate::rpc::{JsonRpcRequest, JsonRpcResponse};

/// One relay instance: the active peer slot, the correlation table, the
/// request-id counter, and the shutdown signal.
///
/// Constructed once per process and shared by handle; there is no hidden
/// global state, so tests can run several bridges side by side.
#[derive(Debug)]
pub struct Bridge {
    config: BridgeConfig,
    slot: PeerSlot,
    pending: CorrelationTable,
    next_id: AtomicU64,
    shutdown: watch::Sender<bool>,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            slot: PeerSlot::new(),
            pending: CorrelationTable::new(),
            next_id: AtomicU64::new(1),
            shutdown,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Send a JSON-RPC request to the connected wallet and wait for the
    /// correlated response.
    ///
    /// Blocks (without erroring) while no wallet is connected: waiters are
    /// woken when a connection is accepted, with the configured interval as
    /// a fallback tick. The returned envelope may itself carry an error
    /// object; use [`JsonRpcResponse::into_result`] to unwrap it.
    pub async fn send_request(&self, method: &str, params: Value) -> Result<JsonRpcResponse> {
        if !self.slot.is_connected() {
            info!(
                "waiting for a wallet tab to connect; open {} to connect",
                self.config.browser_url()
            );
        }
        loop {
            self.slot.wait_connected(self.config.wait_poll).await;

            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let mut request = JsonRpcRequest::new(method, params.clone());
            request.id = Some(json!(id));
            let frame = serde_json::to_string(&request)?;

            let receiver = self.pending.register(id);
            if self.slot.send(frame).is_err() {
                // The wallet vanished between the readiness check and the
                // send; drop the registration and wait for the next tab.
                self.pending.remove(id);
                continue;
            }
            debug!("forwarded {method} to the wallet as request {id}");

            let response = match self.config.request_timeout {
                Some(limit) => tokio::time::timeout(limit, receiver)
                    .await
                    .map_err(|_| {
                        self.pending.remove(id);
                        BridgeError::Timeout(limit)
                    })??,
                None => receiver.await?,
            };
            return Ok(response);
        }
    }

    /// Handle one inbound frame from the wallet connection.
    ///
    /// Malformed frames and frames without a usable id are logged and
    /// dropped; so are responses whose id is unknown or already settled.
    pub fn handle_frame(&self, frame: &str) {
        let response: JsonRpcResponse = match serde_json::from_str(frame) {
            Ok(response) => response,
            Err(err) => {
                warn!("dropping malformed frame from the wallet: {err}");
                return;
            }
        };
        let Some(id) = response.id.as_ref().and_then(Value::as_u64) else {
            warn!("dropping wallet frame without a usable id");
            return;
        };
        if !self.pending.resolve(id, response) {
            warn!("dropping response for unknown or already-settled request {id}");
        }
    }

    /// Occupy the active peer slot for a new wallet connection.
    pub fn accept_peer(&self) -> Result<PeerSession> {
        let session = self.slot.accept()?;
        info!("wallet tab connected");
        Ok(session)
    }

    /// Release the slot when a wallet connection closes.
    ///
    /// Default policy is vacate-and-await: in-flight requests stay pending
    /// for the configured timeout (or indefinitely) and a new tab may take
    /// the slot. With `stop_on_disconnect`, pending requests are failed and
    /// the shutdown signal is raised instead.
    pub fn release_peer(&self, generation: u64) {
        if !self.slot.vacate(generation) {
            return;
        }
        info!("wallet tab disconnected");
        if self.config.stop_on_disconnect {
            self.pending.fail_all();
            self.request_stop();
        }
    }

    /// Whether a wallet is currently connected and ready.
    pub fn is_connected(&self) -> bool {
        self.slot.is_connected()
    }

    /// Number of requests awaiting a wallet response.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Raise the shutdown signal observed by the transport listener.
    pub fn request_stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Subscribe to the shutdown signal.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}
