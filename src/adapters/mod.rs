//! Adapters Layer - Concrete implementations of the ports
//!
//! - `stream`: WebSocket log-stream ingestor
//! - `signals`: signal-channel ingestor + Telegram long-poll client
//! - `http`: reqwest clients for prices, safety reports, swaps and RPC

pub mod cli;
pub mod http;
pub mod signals;
pub mod stream;
