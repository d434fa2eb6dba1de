//! Error types for the walletbridge relay.
//!
//! Transport- and framing-level problems (malformed frames, stale response
//! ids) are logged and dropped where they occur; everything that must reach a
//! caller as a rejected call is a `BridgeError`.

use std::time::Duration;

use thiserror::Error;

use crate::chain::ChainId;

/// Main error type for the relay core.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A second wallet tab tried to connect while the slot was occupied.
    #[error("a wallet tab is already connected")]
    WalletAlreadyConnected,

    /// The active peer slot is empty.
    #[error("no wallet tab is connected")]
    NoWalletConnected,

    /// The wallet still reports a different chain id after a switch attempt.
    #[error("chain id mismatch: {wallet} (wallet) != {node} (node)")]
    ChainMismatch { wallet: ChainId, node: ChainId },

    /// The caller's JSON-RPC envelope is not usable.
    #[error("invalid JSON-RPC request: {message}")]
    InvalidRequest { message: String },

    /// The wallet answered with a JSON-RPC error object.
    #[error("wallet returned error {code}: {message}")]
    Wallet { code: i64, message: String },

    /// The wallet connection closed before a response arrived.
    #[error("wallet connection closed before a response arrived")]
    ConnectionClosed,

    #[error("request timeout after {0:?}")]
    Timeout(Duration),

    /// The local node could not be queried.
    #[error("node request failed: {message}")]
    Node { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    /// Map this error to a JSON-RPC error code for the caller-facing
    /// response envelope.
    pub fn to_rpc_error_code(&self) -> i64 {
        match self {
            BridgeError::InvalidRequest { .. } => PARSE_ERROR,
            BridgeError::Wallet { code, .. } => *code,
            BridgeError::ChainMismatch { .. } => SERVER_ERROR,
            _ => INTERNAL_ERROR,
        }
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for BridgeError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        BridgeError::ConnectionClosed
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        BridgeError::Node {
            message: err.to_string(),
        }
    }
}

/// JSON-RPC "Parse error" code, used for any unusable caller envelope.
pub const PARSE_ERROR: i64 = -32700;
/// JSON-RPC generic server error code.
pub const SERVER_ERROR: i64 = -32000;
/// JSON-RPC internal error code.
pub const INTERNAL_ERROR: i64 = -32603;

/// Result type alias using `BridgeError`.
pub type Result<T> = std::result::Result<T, BridgeError>;
