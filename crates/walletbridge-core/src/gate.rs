//! Caller-facing interception surface for account and signing methods.

use std::sync::Arc;

use tracing::{debug, error};

use crate::chain::{self, ChainIdSource};
use crate::error::{Result, PARSE_ERROR};
use crate::relay::Bridge;
use crate::rpc::{JsonRpcRequest, JsonRpcResponse};

/// Intercepts account-sensitive JSON-RPC requests, reconciles the wallet's
/// chain with the local node, forwards the call over the relay, and hands
/// the response back with the caller's own id restored.
///
/// The relay handle and the node seam are injected at construction; the gate
/// holds no state of its own.
#[derive(Clone)]
pub struct RequestGate {
    bridge: Arc<Bridge>,
    node: Arc<dyn ChainIdSource>,
}

impl RequestGate {
    pub fn new(bridge: Arc<Bridge>, node: Arc<dyn ChainIdSource>) -> Self {
        Self { bridge, node }
    }

    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }

    /// Whether `method` is routed through the wallet.
    pub fn is_gated(&self, method: &str) -> bool {
        chain::is_wallet_method(method)
    }

    /// Handle one caller request end to end. Never fails the transport:
    /// every outcome is a JSON-RPC response envelope carrying the caller's
    /// original id.
    pub async fn on_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let caller_id = request.id.clone();
        if request.validate().is_err() {
            // Unusable envelope; reject before the wallet is ever contacted.
            return JsonRpcResponse::error(caller_id, PARSE_ERROR, "Parse error");
        }

        debug!("gating {} through the wallet", request.method);
        match self.forward(request).await {
            Ok(mut response) => {
                response.id = caller_id;
                response
            }
            Err(err) => {
                error!("wallet request failed: {err}");
                JsonRpcResponse::error(caller_id, err.to_rpc_error_code(), err.to_string())
            }
        }
    }

    async fn forward(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        chain::reconcile_chain(&self.bridge, self.node.as_ref()).await?;
        self.bridge
            .send_request(
                &request.method,
                request.params.unwrap_or_else(|| serde_json::json!([])),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainId;
    use crate::config::BridgeConfig;
    use crate::error::Result;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::time::Duration;

    struct FixedNode(ChainId);

    #[async_trait]
    impl ChainIdSource for FixedNode {
        async fn chain_id(&self) -> Result<ChainId> {
            Ok(self.0)
        }
    }

    fn test_gate() -> RequestGate {
        let bridge = Arc::new(Bridge::new(BridgeConfig {
            wait_poll: Duration::from_millis(10),
            ..BridgeConfig::default()
        }));
        RequestGate::new(bridge, Arc::new(FixedNode(ChainId::new(31337))))
    }

    fn spawn_wallet(gate: &RequestGate, accounts: Value) {
        let bridge = gate.bridge().clone();
        let mut session = bridge.accept_peer().unwrap();
        tokio::spawn(async move {
            while let Some(frame) = session.outbound.recv().await {
                let request: JsonRpcRequest = serde_json::from_str(&frame).unwrap();
                let response = match request.method.as_str() {
                    "eth_chainId" => JsonRpcResponse::success(request.id, json!("0x7a69")),
                    _ => JsonRpcResponse::success(request.id, accounts.clone()),
                };
                bridge.handle_frame(&serde_json::to_string(&response).unwrap());
            }
        });
    }

    #[tokio::test]
    async fn caller_id_is_substituted_back() {
        let gate = test_gate();
        spawn_wallet(&gate, json!(["0xabc"]));

        let mut request = JsonRpcRequest::new("eth_accounts", json!([]));
        request.id = Some(json!("caller-7"));
        let response = gate.on_request(request).await;
        assert_eq!(response.id, Some(json!("caller-7")));
        assert_eq!(response.result, Some(json!(["0xabc"])));
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn invalid_shape_never_reaches_the_wallet() {
        let gate = test_gate();
        // No wallet connected: a forwarded call would hang, so completion
        // itself proves the request was rejected up front.
        let mut request = JsonRpcRequest::new("", json!([]));
        request.id = Some(json!(3));
        let response =
            tokio::time::timeout(Duration::from_millis(200), gate.on_request(request))
                .await
                .expect("rejected without waiting for a wallet");
        let error = response.error.unwrap();
        assert_eq!(error.code, PARSE_ERROR);
        assert_eq!(error.message, "Parse error");
        assert_eq!(response.id, Some(json!(3)));
    }

    #[tokio::test]
    async fn wallet_error_objects_pass_through_with_caller_id() {
        let gate = test_gate();
        let bridge = gate.bridge().clone();
        let mut session = bridge.accept_peer().unwrap();
        tokio::spawn(async move {
            while let Some(frame) = session.outbound.recv().await {
                let request: JsonRpcRequest = serde_json::from_str(&frame).unwrap();
                let response = match request.method.as_str() {
                    "eth_chainId" => JsonRpcResponse::success(request.id, json!("0x7a69")),
                    _ => JsonRpcResponse::error(request.id, 4001, "User rejected the request"),
                };
                bridge.handle_frame(&serde_json::to_string(&response).unwrap());
            }
        });

        let mut request = JsonRpcRequest::new("eth_sendTransaction", json!([{}]));
        request.id = Some(json!(11));
        let response = gate.on_request(request).await;
        assert_eq!(response.id, Some(json!(11)));
        assert_eq!(response.error.unwrap().code, 4001);
    }
}
