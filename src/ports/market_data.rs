//! Market Data Port
//!
//! Price and metadata lookups against external price/indexing services.
//! Both are opaque calls from the core's point of view; implementations
//! must bound every request with a timeout.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("No price data for {0}")]
    NoPrice(String),

    #[error("No metadata for {0}")]
    NoMetadata(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Metadata enrichment for a token; all fields best effort
#[derive(Debug, Clone)]
pub struct TokenMetadata {
    pub name: String,
    pub supply: f64,
    /// Unix seconds of mint creation, when the indexer reports it
    pub created_at: Option<u64>,
}

#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Current price of a token in the base currency
    async fn get_price(&self, address: &str) -> Result<f64, MarketDataError>;

    /// Name/supply metadata for a token
    async fn get_metadata(&self, address: &str) -> Result<TokenMetadata, MarketDataError>;
}
