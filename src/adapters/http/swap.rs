//! Swap Service Client
//!
//! Submits swap requests to the external execution service and returns the
//! transaction signature. Quote fetching, transaction construction and
//! submission all happen service-side; this client only frames the request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ports::{SwapError, SwapPort};

#[derive(Debug, Clone)]
pub struct SwapServiceClient {
    http: Client,
    base_url: String,
    base_mint: String,
    timeout_secs: u64,
}

impl SwapServiceClient {
    pub fn new(base_url: &str, base_mint: &str, timeout_secs: u64) -> Result<Self, SwapError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SwapError::Api(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            base_mint: base_mint.to_string(),
            timeout_secs,
        })
    }
}

#[derive(Debug, Serialize)]
struct SwapRequest<'a> {
    #[serde(rename = "inputMint")]
    input_mint: &'a str,
    #[serde(rename = "outputMint")]
    output_mint: &'a str,
}

#[derive(Debug, Deserialize)]
struct SwapResponse {
    signature: String,
}

#[derive(Debug, Deserialize)]
struct SwapErrorResponse {
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl SwapPort for SwapServiceClient {
    async fn swap(&self, from: Option<&str>, to: &str) -> Result<String, SwapError> {
        let request = SwapRequest {
            input_mint: from.unwrap_or(&self.base_mint),
            output_mint: to,
        };

        let response = self
            .http
            .post(format!("{}/swap", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SwapError::Timeout(self.timeout_secs)
                } else {
                    SwapError::Api(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .json::<SwapErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| status.to_string());
            return Err(SwapError::Rejected(detail));
        }

        let body: SwapResponse = response
            .json()
            .await
            .map_err(|e| SwapError::Api(e.to_string()))?;
        Ok(body.signature)
    }
}
