//! Log-Stream Types
//!
//! JSON-RPC wire types for the logsSubscribe WebSocket feed.

use serde::{Deserialize, Serialize};

/// Outbound subscription request
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: serde_json::Value,
}

impl SubscribeRequest {
    /// Subscribe to logs mentioning `program_id` at the given commitment
    pub fn logs(program_id: &str, commitment: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            id: 1,
            method: "logsSubscribe",
            params: serde_json::json!([
                { "mentions": [program_id] },
                { "commitment": commitment }
            ]),
        }
    }
}

/// Error payload of a JSON-RPC error envelope
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// Logs-notification payload: `params.result.value`
#[derive(Debug, Clone, Deserialize)]
pub struct LogsValue {
    pub signature: String,
    pub logs: Vec<String>,
    #[serde(default)]
    pub err: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogsResult {
    pub value: LogsValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationParams {
    pub result: LogsResult,
    pub subscription: u64,
}

/// Raw inbound WebSocket message
/// Used for initial parsing before determining message type
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawStreamMessage {
    /// Logs notification
    Notification {
        method: String,
        params: NotificationParams,
    },
    /// Subscription confirmation carrying the subscription id
    Confirmation { id: u64, result: u64 },
    /// Error envelope
    Error { error: RpcError },
}

impl RawStreamMessage {
    /// Signature of a successful pool-initialization notification, if any
    /// log line contains `marker`
    pub fn pool_signature(&self, marker: &str) -> Option<&str> {
        match self {
            RawStreamMessage::Notification { method, params } if method == "logsNotification" => {
                let value = &params.result.value;
                if value.err.is_some() {
                    return None;
                }
                if value.logs.iter().any(|line| line.contains(marker)) {
                    Some(&value.signature)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}
