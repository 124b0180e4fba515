//! Safety Port
//!
//! Rug-check and dev-sold signals from external safety services. The gate
//! treats any error from `rug_check` as a failure (unsafe by default), so
//! implementations should not paper over transport problems.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SafetyError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result of a rug-check evaluation
#[derive(Debug, Clone, Copy, Default)]
pub struct RugCheckReport {
    /// Known-scam flag
    pub rugged: bool,
    /// Mint authority still held
    pub mint_authority: bool,
    /// Freeze authority still held
    pub freeze_authority: bool,
    /// Metadata is mutable
    pub mutable: bool,
}

#[async_trait]
pub trait SafetyPort: Send + Sync {
    /// Evaluate a token's authorities and known-scam status
    async fn rug_check(&self, address: &str) -> Result<RugCheckReport, SafetyError>;

    /// Whether the token's original holder has liquidated their position
    async fn dev_sold(&self, address: &str) -> Result<bool, SafetyError>;
}
