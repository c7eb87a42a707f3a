//! JSON-RPC transport to a NEAR node.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use super::keys::{KeyError, decode_fixed};
use crate::{CallOutcome, RemoteError};

/// Per-request HTTP timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC failures.
#[derive(Debug, Error)]
pub enum RpcError {
    /// HTTP layer failed (DNS, TLS, connection, status).
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    /// Response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The node rejected the request.
    #[error("{0}")]
    Server(String),

    /// The access key is not registered on chain.
    #[error("no matching key pair found: access key {0} does not exist")]
    UnknownAccessKey(String),

    /// The transaction executed and failed.
    #[error("{0}")]
    ExecutionFailure(String),
}

impl From<KeyError> for RpcError {
    fn from(err: KeyError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<RpcError> for RemoteError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Http(_) | RpcError::Decode(_) => Self::Transport(err.to_string()),
            RpcError::Server(_) | RpcError::UnknownAccessKey(_) | RpcError::ExecutionFailure(_) => {
                Self::Rejected(err.to_string())
            },
        }
    }
}

/// Nonce and anchoring block of an access key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKeyView {
    /// Last used nonce.
    pub nonce: u64,
    /// Block the view was taken at.
    pub block_hash: [u8; 32],
}

#[derive(Deserialize)]
struct Envelope {
    result: Option<Value>,
    error: Option<Value>,
}

#[derive(Deserialize)]
struct CallFunctionResult {
    #[serde(default)]
    result: Vec<u8>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct AccessKeyResult {
    nonce: u64,
    block_hash: String,
}

/// JSON-RPC client bound to one node.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
}

impl JsonRpcClient {
    /// Create a client for `url`.
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, url: url.into() })
    }

    /// Node URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Chain id reported by the node.
    pub async fn chain_id(&self) -> Result<String, RpcError> {
        let status = self.request("status", json!([])).await?;
        status
            .get("chain_id")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| RpcError::Decode("status without chain_id".into()))
    }

    /// Call a view method and return its raw result bytes.
    pub async fn call_function(
        &self,
        contract_id: &str,
        method: &str,
        args: &Value,
    ) -> Result<Vec<u8>, RpcError> {
        let args = serde_json::to_vec(args).map_err(|e| RpcError::Decode(e.to_string()))?;
        let params = json!({
            "request_type": "call_function",
            "finality": "final",
            "account_id": contract_id,
            "method_name": method,
            "args_base64": BASE64.encode(args),
        });

        let value = self.request("query", params).await?;
        let result: CallFunctionResult =
            serde_json::from_value(value).map_err(|e| RpcError::Decode(e.to_string()))?;
        match result.error {
            Some(error) => Err(RpcError::ExecutionFailure(error)),
            None => Ok(result.result),
        }
    }

    /// Current nonce of an access key.
    pub async fn view_access_key(
        &self,
        account_id: &str,
        public_key: &str,
    ) -> Result<AccessKeyView, RpcError> {
        let params = json!({
            "request_type": "view_access_key",
            "finality": "final",
            "account_id": account_id,
            "public_key": public_key,
        });

        let value = match self.request("query", params).await {
            Ok(value) => value,
            Err(RpcError::Server(message)) if is_unknown_access_key(&message) => {
                return Err(RpcError::UnknownAccessKey(public_key.to_owned()));
            },
            Err(err) => return Err(err),
        };

        // Some nodes report a missing key inside `result`.
        if let Some(error) = value.get("error").and_then(Value::as_str) {
            return Err(if is_unknown_access_key(error) {
                RpcError::UnknownAccessKey(public_key.to_owned())
            } else {
                RpcError::Server(error.to_owned())
            });
        }

        let view: AccessKeyResult =
            serde_json::from_value(value).map_err(|e| RpcError::Decode(e.to_string()))?;
        Ok(AccessKeyView { nonce: view.nonce, block_hash: decode_fixed(&view.block_hash)? })
    }

    /// Submit a signed transaction and wait for its final outcome.
    pub async fn broadcast_tx_commit(&self, signed: &[u8]) -> Result<CallOutcome, RpcError> {
        let value = self.request("broadcast_tx_commit", json!([BASE64.encode(signed)])).await?;
        parse_outcome(&value)
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": "sociogram",
            "method": method,
            "params": params,
        });

        tracing::trace!(%method, url = %self.url, "rpc request");
        let envelope: Envelope = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = envelope.error {
            return Err(RpcError::Server(error_message(&error)));
        }
        envelope.result.ok_or_else(|| RpcError::Decode("response without result".into()))
    }
}

fn is_unknown_access_key(message: &str) -> bool {
    message.contains("UNKNOWN_ACCESS_KEY") || message.contains("does not exist while viewing")
}

/// Most specific human-readable text in a JSON-RPC error object.
fn error_message(error: &Value) -> String {
    let cause = error.get("cause");
    let cause_name = cause.and_then(|c| c.get("name")).and_then(Value::as_str);
    let data = error.get("data");

    if let Some(text) = find_execution_error(error) {
        return text;
    }
    match (cause_name, data) {
        (Some(name), Some(Value::String(data))) => format!("{name}: {data}"),
        (Some(name), Some(data)) => format!("{name}: {data}"),
        (Some(name), None) => name.to_owned(),
        (None, Some(Value::String(data))) => data.clone(),
        _ => error
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), str::to_owned),
    }
}

/// First `ExecutionError` string anywhere in `value` (contract panics).
fn find_execution_error(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("ExecutionError") {
                return Some(text.clone());
            }
            map.values().find_map(find_execution_error)
        },
        Value::Array(items) => items.iter().find_map(find_execution_error),
        _ => None,
    }
}

fn parse_outcome(value: &Value) -> Result<CallOutcome, RpcError> {
    let status = value
        .get("status")
        .ok_or_else(|| RpcError::Decode("outcome without status".into()))?;

    if let Some(failure) = status.get("Failure") {
        return Err(RpcError::ExecutionFailure(
            find_execution_error(failure).unwrap_or_else(|| failure.to_string()),
        ));
    }

    let return_value = match status.get("SuccessValue").and_then(Value::as_str) {
        Some(encoded) => BASE64.decode(encoded).map_err(|e| RpcError::Decode(e.to_string()))?,
        None => Vec::new(),
    };
    let transaction_hash = value
        .get("transaction")
        .and_then(|tx| tx.get("hash"))
        .and_then(Value::as_str)
        .map(str::to_owned);

    Ok(CallOutcome { transaction_hash, return_value })
}
