//! JSON-RPC 2.0 envelope types.
//!
//! One envelope per frame on the wire, no batching. The relay both produces
//! and consumes these, so requests and responses derive `Serialize` and
//! `Deserialize` alike.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, Result};

/// Protocol version tag carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl JsonRpcRequest {
    /// Build a request envelope without an id. The relay assigns one right
    /// before the frame is sent to the wallet.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: Some(params),
            id: None,
        }
    }

    /// Check the envelope shape: correct version tag and a non-empty method.
    pub fn validate(&self) -> Result<()> {
        if self.jsonrpc != JSONRPC_VERSION {
            return Err(BridgeError::InvalidRequest {
                message: format!("unsupported jsonrpc version: {:?}", self.jsonrpc),
            });
        }
        if self.method.is_empty() {
            return Err(BridgeError::InvalidRequest {
                message: "missing method".to_string(),
            });
        }
        Ok(())
    }
}

/// JSON-RPC 2.0 response structure. Exactly one of `result`/`error` is
/// present in a well-formed response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(default)]
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<Value>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
            id,
        }
    }

    /// Unwrap the response into its result payload, turning a carried error
    /// object into [`BridgeError::Wallet`].
    pub fn into_result(self) -> Result<Value> {
        if let Some(err) = self.error {
            return Err(BridgeError::Wallet {
                code: err.code,
                message: err.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_without_id_omits_the_field() {
        let request = JsonRpcRequest::new("eth_accounts", json!([]));
        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(
            encoded,
            json!({"jsonrpc": "2.0", "method": "eth_accounts", "params": []})
        );
    }

    #[test]
    fn absent_params_are_not_reserialized_as_null() {
        // Pass-through requests keep their shape: a request that came in
        // without params must not grow a "params": null on the way out.
        let request: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "eth_blockNumber",
            "id": 1
        }))
        .unwrap();
        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(
            encoded,
            json!({"jsonrpc": "2.0", "method": "eth_blockNumber", "id": 1})
        );
    }

    #[test]
    fn validate_rejects_wrong_version_and_empty_method() {
        let mut request = JsonRpcRequest::new("eth_accounts", json!([]));
        request.jsonrpc = "1.0".to_string();
        assert!(request.validate().is_err());

        let request = JsonRpcRequest::new("", json!([]));
        assert!(request.validate().is_err());

        let request = JsonRpcRequest::new("eth_accounts", json!([]));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn into_result_surfaces_the_error_object() {
        let response: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 7,
            "error": {"code": 4001, "message": "user rejected"}
        }))
        .unwrap();
        match response.into_result() {
            Err(BridgeError::Wallet { code, message }) => {
                assert_eq!(code, 4001);
                assert_eq!(message, "user rejected");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn into_result_returns_the_payload() {
        let response = JsonRpcResponse::success(Some(json!(1)), json!(["0xabc"]));
        assert_eq!(response.into_result().unwrap(), json!(["0xabc"]));
    }
}
