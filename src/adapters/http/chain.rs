//! RPC Chain Client
//!
//! Resolves a pool-initialization signature to the new token's mint by
//! fetching the transaction and scanning its post token balances for the
//! first mint that is not the base currency.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::ports::{ChainError, ChainQueryPort};

#[derive(Debug, Clone)]
pub struct RpcChainClient {
    http: Client,
    rpc_url: String,
    base_mint: String,
    timeout_secs: u64,
}

impl RpcChainClient {
    pub fn new(rpc_url: &str, base_mint: &str, timeout_secs: u64) -> Result<Self, ChainError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        Ok(Self {
            http,
            rpc_url: rpc_url.to_string(),
            base_mint: base_mint.to_string(),
            timeout_secs,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<TransactionResult>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct TransactionResult {
    meta: Option<TransactionMeta>,
}

#[derive(Debug, Deserialize)]
struct TransactionMeta {
    #[serde(rename = "postTokenBalances", default)]
    post_token_balances: Vec<TokenBalance>,
}

#[derive(Debug, Deserialize)]
struct TokenBalance {
    mint: String,
}

/// First non-base mint among the post token balances
fn first_new_mint(meta: &TransactionMeta, base_mint: &str) -> Option<String> {
    meta.post_token_balances
        .iter()
        .map(|balance| &balance.mint)
        .find(|mint| mint.as_str() != base_mint)
        .cloned()
}

#[async_trait]
impl ChainQueryPort for RpcChainClient {
    async fn new_token_mint(&self, signature: &str) -> Result<Option<String>, ChainError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getTransaction",
            "params": [
                signature,
                {
                    "encoding": "jsonParsed",
                    "commitment": "confirmed",
                    "maxSupportedTransactionVersion": 0
                }
            ]
        });

        let response: RpcResponse = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChainError::Timeout(self.timeout_secs)
                } else {
                    ChainError::Rpc(e.to_string())
                }
            })?
            .json()
            .await
            .map_err(|e| ChainError::Parse(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(ChainError::Rpc(format!(
                "{} ({})",
                error.message, error.code
            )));
        }

        // Transaction not yet visible at this commitment: treat as no mint
        let Some(result) = response.result else {
            return Ok(None);
        };
        let Some(meta) = result.meta else {
            return Ok(None);
        };
        Ok(first_new_mint(&meta, &self.base_mint))
    }
}
