//! HTTP clients backing the outbound ports

mod chain;
mod market_data;
mod safety;
mod swap;

pub use chain::RpcChainClient;
pub use market_data::PriceServiceClient;
pub use safety::RugCheckClient;
pub use swap::SwapServiceClient;
