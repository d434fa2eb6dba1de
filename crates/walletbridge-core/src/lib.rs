//! Walletbridge core - headless relay between a local dev node and a
//! browser wallet.
//!
//! This crate implements the relay logic without any HTTP layer: the
//! correlation table matching responses back to in-flight requests, the
//! single active peer slot, the [`Bridge`] gateway, the chain-identity
//! reconciliation handshake, and the [`RequestGate`] that fronts account and
//! signing methods. The `walletbridge-rpc` crate puts an axum transport in
//! front of it.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use walletbridge_core::{Bridge, BridgeConfig, HttpNode, RequestGate};
//!
//! let bridge = Arc::new(Bridge::new(BridgeConfig::default()));
//! let node = Arc::new(HttpNode::new("http://127.0.0.1:8545"));
//! let gate = RequestGate::new(bridge.clone(), node);
//! // hand `bridge` to the transport listener and `gate` to the caller path
//! ```

pub mod chain;
pub mod config;
pub mod correlation;
pub mod error;
pub mod gate;
pub mod peer;
pub mod relay;
pub mod rpc;

// Re-export commonly used types
pub use chain::{is_wallet_method, ChainId, ChainIdSource, HttpNode, WALLET_METHODS};
pub use config::{BridgeConfig, DEFAULT_PORT};
pub use correlation::CorrelationTable;
pub use error::{BridgeError, Result};
pub use gate::RequestGate;
pub use peer::{PeerSession, PeerSlot};
pub use relay::Bridge;
pub use rpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
