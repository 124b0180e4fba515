//! Ports Layer - Trait definitions for external collaborators
//!
//! Following hexagonal architecture, these traits abstract everything the
//! core calls out to:
//! - Market data (price and metadata lookups)
//! - Safety signals (rug check, dev-sold)
//! - Trade execution (the opaque swap operation)
//! - Chain queries (signature -> new token mint resolution)

pub mod chain;
pub mod execution;
pub mod market_data;
pub mod mocks;
pub mod safety;

pub use chain::{ChainError, ChainQueryPort};
pub use execution::{SwapError, SwapPort};
pub use market_data::{MarketDataError, MarketDataPort, TokenMetadata};
pub use safety::{RugCheckReport, SafetyError, SafetyPort};
