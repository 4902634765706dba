//! Ledger access - read-only `eth_call` against a network's registry.
//!
//! [`LedgerClient`] is the seam the reader depends on; [`JsonRpcClient`] is
//! the HTTP implementation. Every request is bounded by the client timeout
//! and never retried here. Retrying is the caller's decision.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::RpcError;
use crate::network::NetworkDescriptor;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Read-only contract call against the registry hosted on `network`.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Execute `calldata` against the network's hub contract and return the
    /// raw return data.
    async fn call(&self, network: &NetworkDescriptor, calldata: &[u8]) -> Result<Vec<u8>, RpcError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// JSON-RPC 2.0 client issuing `eth_call` at the `latest` block.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    client: reqwest::Client,
}

impl JsonRpcClient {
    pub fn new(config: ReaderConfig) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RpcError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Send a JSON-RPC request and return the result field.
    async fn rpc_call(
        &self,
        endpoint: &str,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RpcError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .client
            .post(endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RpcError::Timeout {
                        endpoint: endpoint.to_string(),
                    }
                } else {
                    RpcError::Transport {
                        endpoint: endpoint.to_string(),
                        source: e,
                    }
                }
            })?;

        if !resp.status().is_success() {
            return Err(RpcError::Status {
                endpoint: endpoint.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let json: serde_json::Value = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                RpcError::Timeout {
                    endpoint: endpoint.to_string(),
                }
            } else {
                RpcError::MalformedResponse {
                    endpoint: endpoint.to_string(),
                    reason: format!("invalid JSON: {e}"),
                }
            }
        })?;

        if let Some(error) = json.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown RPC error");
            return Err(RpcError::JsonRpc {
                endpoint: endpoint.to_string(),
                message: message.to_string(),
            });
        }

        json.get("result")
            .cloned()
            .ok_or_else(|| RpcError::MalformedResponse {
                endpoint: endpoint.to_string(),
                reason: "missing 'result' field".to_string(),
            })
    }
}

#[async_trait]
impl LedgerClient for JsonRpcClient {
    async fn call(&self, network: &NetworkDescriptor, calldata: &[u8]) -> Result<Vec<u8>, RpcError> {
        let tx = serde_json::json!({
            "to": network.hub_address,
            "data": format!("0x{}", hex::encode(calldata)),
        });

        tracing::debug!(network = %network.name, rpc = %network.rpc_url, "eth_call");
        let result = self
            .rpc_call(&network.rpc_url, "eth_call", serde_json::json!([tx, "latest"]))
            .await?;

        let malformed = |reason: &str| RpcError::MalformedResponse {
            endpoint: network.rpc_url.clone(),
            reason: reason.to_string(),
        };
        let text = result
            .as_str()
            .ok_or_else(|| malformed("eth_call result is not a string"))?;
        let body = text
            .strip_prefix("0x")
            .ok_or_else(|| malformed("eth_call result is not 0x-prefixed"))?;
        hex::decode(body).map_err(|_| malformed("eth_call result is not valid hex"))
    }
}
