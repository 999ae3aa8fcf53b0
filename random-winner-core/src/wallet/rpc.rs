use crate::error::{DappError, Result};
use crate::wallet::WalletProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Wallet provider reached over JSON-RPC 2.0 on HTTP.
pub struct HttpProvider {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

impl HttpProvider {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(DappError::config("Wallet RPC URL cannot be empty"));
        }
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            url,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WalletProvider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        tracing::debug!("RPC {} -> {} (id {})", method, self.url, id);

        let res = self.http.post(&self.url).json(&body).send().await?;
        let status = res.status();
        let bytes = res.bytes().await?;

        match serde_json::from_slice::<RpcResponse>(&bytes) {
            Ok(response) => decode_response(response),
            Err(_) if !status.is_success() => Err(DappError::wallet(format!(
                "wallet provider responded with {} to {}",
                status, method
            ))),
            Err(e) => Err(DappError::wallet(format!(
                "invalid response to {}: {}",
                method, e
            ))),
        }
    }
}

fn decode_response(response: RpcResponse) -> Result<Value> {
    if let Some(error) = response.error {
        return Err(DappError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    // A null result is meaningful (e.g. a receipt that is not mined yet).
    Ok(response.result.unwrap_or(Value::Null))
}
