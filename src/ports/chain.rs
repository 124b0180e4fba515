//! Chain Query Port
//!
//! Follow-up transaction detail lookup used by the stream ingestor to turn
//! a pool-initialization signature into the new token's mint address.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[async_trait]
pub trait ChainQueryPort: Send + Sync {
    /// Resolve a pool-creation signature to the minted token address.
    /// `Ok(None)` means the transaction exists but no candidate mint was
    /// found in it (e.g. a base-currency-only pool).
    async fn new_token_mint(&self, signature: &str) -> Result<Option<String>, ChainError>;
}
