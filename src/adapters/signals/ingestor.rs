//! Signal Ingestor
//!
//! Turns raw channel messages into discovery events. Only messages from
//! allow-listed channels are considered; the first line that is entirely a
//! valid token address wins. Messages from the designation channel carry
//! the confirmed correct token instead of a mere recommendation.

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::config::SignalsSection;
use crate::domain::{Discovery, DiscoverySource};

/// One message as delivered by the channel client
#[derive(Debug, Clone)]
pub struct RawSignalMessage {
    pub channel_id: i64,
    pub channel_name: String,
    pub text: String,
}

/// Whether `candidate` is a plausible token mint address: base58 of 32-44
/// chars decoding to exactly 32 bytes.
pub fn is_token_address(candidate: &str) -> bool {
    if candidate.len() < 32 || candidate.len() > 44 {
        return false;
    }
    match bs58::decode(candidate).into_vec() {
        Ok(bytes) => bytes.len() == 32,
        Err(_) => false,
    }
}

/// First line of `text` that is entirely a token address
pub fn extract_address(text: &str) -> Option<&str> {
    text.lines()
        .map(str::trim)
        .find(|line| is_token_address(line))
}

pub struct SignalIngestor {
    allow_channels: Vec<i64>,
    designation_channel: Option<i64>,
    discoveries: mpsc::Sender<Discovery>,
}

impl SignalIngestor {
    pub fn new(config: &SignalsSection, discoveries: mpsc::Sender<Discovery>) -> Self {
        Self {
            allow_channels: config.allow_channels.clone(),
            designation_channel: config.designation_channel,
            discoveries,
        }
    }

    /// Consume raw messages until the feed closes or shutdown flips
    pub async fn run(
        self,
        mut messages: mpsc::Receiver<RawSignalMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                message = messages.recv() => {
                    match message {
                        Some(message) => {
                            if let Some(event) = self.handle_message(&message) {
                                if self.discoveries.send(event).await.is_err() {
                                    info!("Discovery channel closed, signal ingestor stopping");
                                    break;
                                }
                            }
                        }
                        None => {
                            info!("Signal feed closed, ingestor stopping");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }

    /// Classify one message; None means it is dropped
    pub fn handle_message(&self, message: &RawSignalMessage) -> Option<Discovery> {
        let designated = self.designation_channel == Some(message.channel_id);

        if !designated && !self.allow_channels.contains(&message.channel_id) {
            debug!(
                "Ignoring message from non-listed channel {} ({})",
                message.channel_id, message.channel_name
            );
            return None;
        }

        let address = extract_address(&message.text)?;
        info!(
            "Signal from {} ({}): {} [{}]",
            message.channel_name,
            message.channel_id,
            address,
            message.text.replace('\n', " | ")
        );

        if designated {
            Some(Discovery::CorrectToken {
                address: address.to_string(),
            })
        } else {
            Some(Discovery::Candidate {
                address: address.to_string(),
                source: DiscoverySource::Signal,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 43-char base58 string decoding to 32 bytes (SOL mint)
    const VALID_MINT: &str = "So11111111111111111111111111111111111111112";

    fn ingestor() -> (SignalIngestor, mpsc::Receiver<Discovery>) {
        let config = SignalsSection {
            enabled: true,
            bot_token: String::new(),
            allow_channels: vec![-100],
            designation_channel: Some(-200),
            poll_timeout_secs: 25,
        };
        let (tx, rx) = mpsc::channel(16);
        (SignalIngestor::new(&config, tx), rx)
    }

    fn message(channel_id: i64, text: &str) -> RawSignalMessage {
        RawSignalMessage {
            channel_id,
            channel_name: "test".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_address_grammar() {
        assert!(is_token_address(VALID_MINT));
        assert!(!is_token_address("too-short"));
        assert!(!is_token_address("contains!invalid@base58#characters0000000000"));
        // Valid base58 but wrong decoded length
        assert!(!is_token_address("11111111111111111111111111111111111111111111"));
    }

    #[test]
    fn test_first_matching_line_wins() {
        let text = format!("New gem alert\n{VALID_MINT}\nBONK111");
        assert_eq!(extract_address(&text), Some(VALID_MINT));
    }

    #[test]
    fn test_whitespace_trimmed() {
        let text = format!("  {VALID_MINT}  ");
        assert_eq!(extract_address(&text), Some(VALID_MINT));
    }

    #[test]
    fn test_allowed_channel_emits_candidate() {
        let (ingestor, _rx) = ingestor();
        let event = ingestor.handle_message(&message(-100, VALID_MINT)).unwrap();
        assert_eq!(
            event,
            Discovery::Candidate {
                address: VALID_MINT.to_string(),
                source: DiscoverySource::Signal,
            }
        );
    }

    #[test]
    fn test_designation_channel_emits_correct_token() {
        let (ingestor, _rx) = ingestor();
        let event = ingestor.handle_message(&message(-200, VALID_MINT)).unwrap();
        assert_eq!(
            event,
            Discovery::CorrectToken {
                address: VALID_MINT.to_string(),
            }
        );
    }

    #[test]
    fn test_non_listed_channel_dropped() {
        let (ingestor, _rx) = ingestor();
        assert!(ingestor.handle_message(&message(-999, VALID_MINT)).is_none());
    }

    #[test]
    fn test_message_without_address_is_noop() {
        let (ingestor, _rx) = ingestor();
        assert!(ingestor
            .handle_message(&message(-100, "just chatting, no address here"))
            .is_none());
    }
}
