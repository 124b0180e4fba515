//! Price Service Client
//!
//! Price and metadata lookups against the external price API. The HTTP
//! client carries a hard timeout so a wedged service can never stall a
//! poll sweep beyond its budget.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::ports::{MarketDataError, MarketDataPort, TokenMetadata};

#[derive(Debug, Clone)]
pub struct PriceServiceClient {
    http: Client,
    base_url: String,
    timeout_secs: u64,
}

impl PriceServiceClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| MarketDataError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    fn map_error(&self, e: reqwest::Error) -> MarketDataError {
        if e.is_timeout() {
            MarketDataError::Timeout(self.timeout_secs)
        } else if e.is_decode() {
            MarketDataError::Parse(e.to_string())
        } else {
            MarketDataError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    data: HashMap<String, PriceData>,
}

#[derive(Debug, Deserialize)]
struct PriceData {
    price: f64,
}

#[derive(Debug, Deserialize)]
struct TokenInfoResponse {
    name: Option<String>,
    supply: Option<f64>,
    #[serde(rename = "createdAt")]
    created_at: Option<u64>,
}

#[async_trait]
impl MarketDataPort for PriceServiceClient {
    async fn get_price(&self, address: &str) -> Result<f64, MarketDataError> {
        let url = format!("{}/price?ids={}", self.base_url, address);

        let response: PriceResponse = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?
            .json()
            .await
            .map_err(|e| self.map_error(e))?;

        response
            .data
            .get(address)
            .map(|p| p.price)
            .ok_or_else(|| MarketDataError::NoPrice(address.to_string()))
    }

    async fn get_metadata(&self, address: &str) -> Result<TokenMetadata, MarketDataError> {
        let url = format!("{}/token/{}", self.base_url, address);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketDataError::NoMetadata(address.to_string()));
        }

        let info: TokenInfoResponse = response.json().await.map_err(|e| self.map_error(e))?;
        let name = info
            .name
            .ok_or_else(|| MarketDataError::NoMetadata(address.to_string()))?;

        Ok(TokenMetadata {
            name,
            supply: info.supply.unwrap_or(0.0),
            created_at: info.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = PriceServiceClient::new("https://price.example/v6/", 10);
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url, "https://price.example/v6");
    }

    #[test]
    fn test_parse_price_response() {
        let json = r#"{
            "data": {
                "Mint111": { "id": "Mint111", "price": 0.00042 }
            },
            "timeTaken": 0.003
        }"#;

        let response: PriceResponse = serde_json::from_str(json).unwrap();
        assert!((response.data["Mint111"].price - 0.00042).abs() < 1e-9);
    }

    #[test]
    fn test_parse_token_info() {
        let json = r#"{"name": "Doge Jr", "supply": 1000000000.0, "createdAt": 1735689600}"#;
        let info: TokenInfoResponse = serde_json::from_str(json).unwrap();

        assert_eq!(info.name.as_deref(), Some("Doge Jr"));
        assert_eq!(info.created_at, Some(1735689600));
    }

    #[test]
    fn test_parse_sparse_token_info() {
        let info: TokenInfoResponse = serde_json::from_str("{}").unwrap();
        assert!(info.name.is_none());
        assert!(info.supply.is_none());
    }
}
