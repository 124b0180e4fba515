//! Pool Stream Monitor
//!
//! Maintains a logsSubscribe WebSocket subscription against the RPC node
//! and turns pool-initialization log notifications into discovery events.
//! The connection is disposable: any transport error tears it down and a
//! fresh one is opened after a fixed delay, forever.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::StreamSection;
use crate::domain::{Discovery, DiscoverySource};
use crate::ports::ChainQueryPort;

use super::types::{RawStreamMessage, SubscribeRequest};

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Invalid WebSocket URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("WebSocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Connection attempt timed out")]
    ConnectTimeout,

    #[error("Connection closed by remote")]
    Closed,
}

pub struct PoolStreamMonitor {
    config: StreamSection,
    chain: Arc<dyn ChainQueryPort>,
    discoveries: mpsc::Sender<Discovery>,
}

impl PoolStreamMonitor {
    pub fn new(
        config: StreamSection,
        chain: Arc<dyn ChainQueryPort>,
        discoveries: mpsc::Sender<Discovery>,
    ) -> Self {
        Self {
            config,
            chain,
            discoveries,
        }
    }

    /// Run until shutdown. Every connection failure reconnects after the
    /// configured fixed delay; there is no backoff growth and no give-up.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let reconnect_delay = Duration::from_secs(self.config.reconnect_delay_secs);

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.run_connection(&mut shutdown).await {
                // Graceful: shutdown closed the socket
                Ok(()) => break,
                Err(e) => {
                    warn!(
                        "Log stream disconnected ({}), reconnecting in {}s",
                        e, self.config.reconnect_delay_secs
                    );
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(reconnect_delay) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Pool stream monitor stopped");
    }

    /// One connection lifetime: connect, subscribe, pump messages
    async fn run_connection(
        &self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), StreamError> {
        let url = Url::parse(&self.config.get_wss_url())?;
        let connect_timeout = Duration::from_secs(self.config.connect_timeout_secs);

        let (ws, _) = timeout(connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| StreamError::ConnectTimeout)??;
        let (mut write, mut read) = ws.split();

        let request = SubscribeRequest::logs(&self.config.program_id, &self.config.commitment);
        let payload = serde_json::to_string(&request).expect("static request serializes");
        write.send(Message::Text(payload)).await?;
        info!(
            "Subscribed to logs mentioning {} ({})",
            self.config.program_id, self.config.commitment
        );

        let mut heartbeat = tokio::time::interval(Duration::from_secs(self.config.heartbeat_secs));
        heartbeat.tick().await;

        loop {
            tokio::select! {
                message = read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => self.process_message(&text).await,
                        Some(Ok(Message::Ping(payload))) => {
                            write.send(Message::Pong(payload)).await?;
                        }
                        Some(Ok(Message::Close(_))) | None => return Err(StreamError::Closed),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                    }
                }
                _ = heartbeat.tick() => {
                    write.send(Message::Ping(Vec::new())).await?;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Parse one inbound text frame. Malformed payloads are logged and
    /// skipped; the connection stays up.
    async fn process_message(&self, text: &str) {
        let message: RawStreamMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                debug!("Skipping malformed stream message: {}", e);
                return;
            }
        };

        match &message {
            RawStreamMessage::Confirmation { result, .. } => {
                info!("Log subscription confirmed: id {}", result);
                return;
            }
            RawStreamMessage::Error { error } => {
                warn!("RPC error on log stream: {} ({})", error.message, error.code);
                return;
            }
            RawStreamMessage::Notification { .. } => {}
        }

        let Some(signature) = message.pool_signature(&self.config.pool_marker) else {
            return;
        };
        debug!("Pool initialization in tx {}", signature);

        match self.chain.new_token_mint(signature).await {
            Ok(Some(mint)) => {
                info!("New pool token {} (tx {})", mint, signature);
                let event = Discovery::Candidate {
                    address: mint,
                    source: DiscoverySource::Stream,
                };
                if self.discoveries.send(event).await.is_err() {
                    error!("Discovery channel closed, dropping stream candidate");
                }
            }
            Ok(None) => debug!("No new mint resolved from tx {}", signature),
            Err(e) => warn!("Mint resolution failed for tx {}: {}", signature, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::MockChain;

    fn config() -> StreamSection {
        StreamSection {
            wss_url: "wss://localhost".to_string(),
            program_id: "Prog111".to_string(),
            commitment: "processed".to_string(),
            pool_marker: "initialize2".to_string(),
            heartbeat_secs: 30,
            reconnect_delay_secs: 5,
            connect_timeout_secs: 15,
        }
    }

    fn monitor_with(chain: MockChain) -> (PoolStreamMonitor, mpsc::Receiver<Discovery>) {
        let (tx, rx) = mpsc::channel(16);
        (PoolStreamMonitor::new(config(), Arc::new(chain), tx), rx)
    }

    fn pool_notification(signature: &str) -> String {
        format!(
            r#"{{"jsonrpc":"2.0","method":"logsNotification","params":{{"result":{{"context":{{"slot":1}},"value":{{"signature":"{signature}","err":null,"logs":["Program log: instruction: initialize2"]}}}},"subscription":7}}}}"#
        )
    }

    #[tokio::test]
    async fn test_pool_notification_emits_candidate() {
        let (monitor, mut rx) = monitor_with(MockChain::new().with_mint("Sig111", "Mint111"));

        monitor.process_message(&pool_notification("Sig111")).await;

        let event = rx.try_recv().unwrap();
        assert_eq!(
            event,
            Discovery::Candidate {
                address: "Mint111".to_string(),
                source: DiscoverySource::Stream,
            }
        );
    }

    #[tokio::test]
    async fn test_unresolvable_signature_emits_nothing() {
        let (monitor, mut rx) = monitor_with(MockChain::new());

        monitor.process_message(&pool_notification("SigUnknown")).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_message_is_skipped() {
        let (monitor, mut rx) = monitor_with(MockChain::new());

        monitor.process_message("not json at all {{{").await;
        monitor.process_message(r#"{"jsonrpc":"2.0","id":1,"result":42}"#).await;
        monitor
            .process_message(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"x"}}"#)
            .await;

        assert!(rx.try_recv().is_err());
    }
}
