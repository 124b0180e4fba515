//! Live log-stream ingestor (WebSocket logsSubscribe)

mod monitor;
mod types;

pub use monitor::{PoolStreamMonitor, StreamError};
pub use types::{RawStreamMessage, SubscribeRequest};
