//! JSON-RPC submission of contract calls.
//!
//! Calls go out as `eth_sendTransaction` from the operator's account, so the
//! chain node's own account management signs the raw transaction. Every call
//! carries the fixed gas limit. A JSON-RPC error (revert, nonce too low,
//! locked account) is surfaced verbatim.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use super::{ChainClient, ContractCall, TxHandle};
use crate::config::DEFAULT_GAS_LIMIT;
use crate::crypto::hash::{parse_h256, to_prefixed_hex};
use crate::crypto::Address;
use crate::error::{ProtocolError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRequest {
    from: String,
    to: String,
    gas: String,
    data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    nonce: Option<String>,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    message: String,
}

/// Submits contract calls through a chain node's JSON-RPC endpoint.
pub struct JsonRpcChainClient {
    client: Client,
    url: String,
    from: Address,
    gas_limit: u64,
    next_id: AtomicU64,
}

impl JsonRpcChainClient {
    /// Submit as `from` through the node at `url`.
    pub fn new(url: impl Into<String>, from: Address) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            from,
            gas_limit: DEFAULT_GAS_LIMIT,
            next_id: AtomicU64::new(1),
        }
    }

    /// Override the gas limit.
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn from_address(&self) -> Address {
        self.from
    }
}

#[async_trait]
impl ChainClient for JsonRpcChainClient {
    async fn submit(
        &self,
        contract: &Address,
        call: &ContractCall,
        nonce: Option<u64>,
    ) -> Result<TxHandle> {
        let method = call.method();
        let tx = TransactionRequest {
            from: self.from.to_hex(),
            to: contract.to_hex(),
            gas: format!("{:#x}", self.gas_limit),
            data: to_prefixed_hex(&call.encode()),
            nonce: nonce.map(|n| format!("{n:#x}")),
        };
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: "eth_sendTransaction",
            params: [tx],
        };

        debug!(method, contract = %contract, "submitting contract call");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProtocolError::chain(method, e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProtocolError::chain(method, e.to_string()))?;
        if !status.is_success() {
            return Err(ProtocolError::chain(
                method,
                format!("RPC returned {}: {}", status, body.trim()),
            ));
        }

        let payload: RpcResponse = serde_json::from_str(&body)
            .map_err(|e| ProtocolError::chain(method, format!("invalid RPC response: {e}")))?;

        if let Some(err) = payload.error {
            warn!(method, code = err.code, reason = %err.message, "contract call rejected");
            return Err(ProtocolError::chain(method, err.message));
        }

        let result = payload
            .result
            .ok_or_else(|| ProtocolError::chain(method, "RPC response without result"))?;
        let tx_hash = parse_h256(&result)
            .map_err(|e| ProtocolError::chain(method, format!("invalid tx hash: {e}")))?;

        Ok(TxHandle {
            method: method.to_string(),
            tx_hash,
        })
    }
}
