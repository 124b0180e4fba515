//! Execution Port
//!
//! The opaque swap operation. Construction and submission of the actual
//! transaction live behind this trait; the core only cares about the
//! returned transaction signature or the failure.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("Swap rejected: {0}")]
    Rejected(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),
}

#[async_trait]
pub trait SwapPort: Send + Sync {
    /// Swap `from` into `to`, returning the transaction signature.
    /// `from = None` means "spend the base currency".
    async fn swap(&self, from: Option<&str>, to: &str) -> Result<String, SwapError>;
}
