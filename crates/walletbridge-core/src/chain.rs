//! Chain-identity reconciliation between the wallet and the local node.
//!
//! Runs as a precondition gate before any account or signing method is
//! forwarded, so the wallet never signs against a different chain than the
//! one the local node is serving.

use std::fmt;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{BridgeError, Result};
use crate::relay::Bridge;
use crate::rpc::JsonRpcRequest;

/// Account and signing methods that must pass chain reconciliation before
/// being forwarded to the wallet. Matched case-sensitively.
pub const WALLET_METHODS: [&str; 6] = [
    "eth_accounts",
    "eth_requestAccounts",
    "eth_sign",
    "personal_sign",
    "eth_signTypedData_v4",
    "eth_sendTransaction",
];

/// Whether `method` is handled by the wallet rather than the local node.
pub fn is_wallet_method(method: &str) -> bool {
    WALLET_METHODS.contains(&method)
}

/// A normalized chain identifier.
///
/// The wallet and the node may report the id in different numeral bases
/// (typically a 0x-hex string); both sides are normalized to an integer
/// before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainId(u64);

impl ChainId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Parse a chain id from a JSON-RPC result value: a number, a 0x-hex
    /// string, or a decimal string.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(Self).ok_or_else(|| BridgeError::Node {
                message: format!("chain id out of range: {n}"),
            }),
            Value::String(s) => {
                let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => s.parse(),
                };
                parsed.map(Self).map_err(|_| BridgeError::Node {
                    message: format!("unparseable chain id: {s:?}"),
                })
            }
            other => Err(BridgeError::Node {
                message: format!("unexpected chain id value: {other}"),
            }),
        }
    }

    /// Hexadecimal representation expected by `wallet_switchEthereumChain`.
    pub fn as_hex(&self) -> String {
        format!("0x{:x}", self.0)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of the local node's chain identity.
#[async_trait]
pub trait ChainIdSource: Send + Sync {
    async fn chain_id(&self) -> Result<ChainId>;
}

/// Queries a node's JSON-RPC endpoint over HTTP for its chain id.
pub struct HttpNode {
    url: String,
    client: reqwest::Client,
}

impl HttpNode {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChainIdSource for HttpNode {
    async fn chain_id(&self) -> Result<ChainId> {
        let mut request = JsonRpcRequest::new("eth_chainId", json!([]));
        request.id = Some(json!(1));
        let response: crate::rpc::JsonRpcResponse = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .json()
            .await?;
        ChainId::from_value(&response.into_result()?)
    }
}

/// Align the wallet's active chain with the local node's before signing.
///
/// Queries both sides; when they differ, issues exactly one
/// `wallet_switchEthereumChain` parameterized with the node's chain id and
/// re-checks. A wallet still on a different chain after the switch attempt
/// is a fatal [`BridgeError::ChainMismatch`]; there is no further retry.
pub async fn reconcile_chain(bridge: &Bridge, node: &dyn ChainIdSource) -> Result<()> {
    let wallet = wallet_chain_id(bridge).await?;
    let local = node.chain_id().await?;
    if wallet == local {
        debug!("wallet already on chain {local}");
        return Ok(());
    }

    info!(
        "switching wallet chain id to {local} (hex {})",
        local.as_hex()
    );
    // The wallet's reply to the switch itself is ignored; the re-query below
    // is the source of truth.
    let _ = bridge
        .send_request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": local.as_hex() }]),
        )
        .await?;

    let wallet = wallet_chain_id(bridge).await?;
    if wallet != local {
        return Err(BridgeError::ChainMismatch {
            wallet,
            node: local,
        });
    }
    Ok(())
}

async fn wallet_chain_id(bridge: &Bridge) -> Result<ChainId> {
    let result = bridge
        .send_request("eth_chainId", json!([]))
        .await?
        .into_result()?;
    ChainId::from_value(&result)
}
