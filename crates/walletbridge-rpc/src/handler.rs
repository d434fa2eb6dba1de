//! HTTP request handlers: the caller-facing JSON-RPC endpoint, the wallet
//! bootstrap page, and the health check.

use std::sync::Arc;

use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::{debug, error};
use walletbridge_core::error::PARSE_ERROR;
use walletbridge_core::{JsonRpcRequest, JsonRpcResponse};

use crate::server::{wallet_session, AppState};

/// Single-page asset bootstrapping the browser wallet peer.
const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Root endpoint: serves the wallet page, or upgrades to the duplex
/// WebSocket when the browser asks for one on the same route.
pub async fn handle_root(
    State(state): State<Arc<AppState>>,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    match ws {
        Some(upgrade) => upgrade
            .on_upgrade(move |socket| wallet_session(state, socket))
            .into_response(),
        None => Html(INDEX_HTML).into_response(),
    }
}

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Caller-facing JSON-RPC handler.
///
/// Account and signing methods go through the wallet gate; every other
/// method is passed through to the local node. The body is taken as raw
/// JSON so an unusable envelope yields a JSON-RPC "Parse error" response
/// instead of a transport-level rejection.
pub async fn handle_rpc(State(state): State<Arc<AppState>>, body: String) -> impl IntoResponse {
    let body: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(_) => {
            return (
                StatusCode::OK,
                Json(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error")),
            );
        }
    };
    let request: JsonRpcRequest = match serde_json::from_value(body.clone()) {
        Ok(request) => request,
        Err(_) => {
            let id = body.get("id").cloned();
            return (
                StatusCode::OK,
                Json(JsonRpcResponse::error(id, PARSE_ERROR, "Parse error")),
            );
        }
    };
    let id = request.id.clone();
    if request.validate().is_err() {
        return (
            StatusCode::OK,
            Json(JsonRpcResponse::error(id, PARSE_ERROR, "Parse error")),
        );
    }

    debug!("RPC call: {}({:?})", request.method, request.params);

    if state.gate.is_gated(&request.method) {
        return (StatusCode::OK, Json(state.gate.on_request(request).await));
    }

    match forward_to_node(&state, &request).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(err) => {
            error!("node proxy error for {}: {}", request.method, err);
            (
                StatusCode::OK,
                Json(JsonRpcResponse::error(
                    id,
                    err.to_rpc_error_code(),
                    err.to_string(),
                )),
            )
        }
    }
}

/// Pass a non-wallet method through to the local node unchanged.
async fn forward_to_node(
    state: &AppState,
    request: &JsonRpcRequest,
) -> walletbridge_core::Result<JsonRpcResponse> {
    let response = state
        .client
        .post(&state.node_url)
        .json(request)
        .send()
        .await?
        .json::<JsonRpcResponse>()
        .await?;
    Ok(response)
}
