//! Telegram Long-Poll Client
//!
//! Feeds channel posts into the signal ingestor's queue via the Bot API.
//! Authentication is verified once at startup (a bad token is fatal);
//! transport failures inside the poll loop are retried with a fixed delay
//! and never kill the task.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::ingestor::RawSignalMessage;

const API_BASE: &str = "https://api.telegram.org";
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bot API rejected the request: {0}")]
    Api(String),

    #[error("Authentication failed: {0}")]
    Auth(String),
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct BotInfo {
    username: String,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    channel_post: Option<ChannelPost>,
}

#[derive(Debug, Deserialize)]
struct ChannelPost {
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
    #[serde(default)]
    title: Option<String>,
}

pub struct TelegramClient {
    http: Client,
    base_url: String,
    poll_timeout_secs: u64,
    /// chat id -> title, learned from posts as they arrive
    chat_names: HashMap<i64, String>,
}

impl TelegramClient {
    pub fn new(bot_token: &str, poll_timeout_secs: u64) -> Result<Self, TelegramError> {
        // The long poll holds the request open server-side; the client
        // timeout must comfortably exceed it.
        let http = Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .build()?;
        Ok(Self {
            http,
            base_url: format!("{API_BASE}/bot{bot_token}"),
            poll_timeout_secs,
            chat_names: HashMap::new(),
        })
    }

    /// Verify the bot token. Returns the bot username on success.
    pub async fn authenticate(&self) -> Result<String, TelegramError> {
        let response: ApiResponse<BotInfo> = self
            .http
            .get(format!("{}/getMe", self.base_url))
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(TelegramError::Auth(
                response
                    .description
                    .unwrap_or_else(|| "token rejected".to_string()),
            ));
        }
        response
            .result
            .map(|bot| bot.username)
            .ok_or_else(|| TelegramError::Auth("empty getMe result".to_string()))
    }

    /// Long-poll getUpdates and forward every channel post until shutdown
    pub async fn run(
        mut self,
        feed: mpsc::Sender<RawSignalMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut offset: i64 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let poll = self.poll_updates(offset);
            let updates = tokio::select! {
                result = poll => result,
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            };

            let updates = match updates {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(
                        "Signal poll failed ({}), retrying in {}s",
                        e,
                        POLL_RETRY_DELAY.as_secs()
                    );
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(post) = update.channel_post else {
                    continue;
                };
                let Some(text) = post.text else {
                    continue;
                };

                if let Some(title) = post.chat.title {
                    self.chat_names.insert(post.chat.id, title);
                }
                let channel_name = self
                    .chat_names
                    .get(&post.chat.id)
                    .cloned()
                    .unwrap_or_else(|| post.chat.id.to_string());

                let message = RawSignalMessage {
                    channel_id: post.chat.id,
                    channel_name,
                    text,
                };
                if feed.send(message).await.is_err() {
                    info!("Signal feed closed, poll loop stopping");
                    return;
                }
            }
        }
        info!("Signal poll loop stopped");
    }

    async fn poll_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let response: ApiResponse<Vec<Update>> = self
            .http
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", self.poll_timeout_secs.to_string()),
                ("allowed_updates", r#"["channel_post"]"#.to_string()),
            ])
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(TelegramError::Api(
                response
                    .description
                    .unwrap_or_else(|| "unspecified error".to_string()),
            ));
        }
        debug!(
            "Polled {} signal updates",
            response.result.as_ref().map(Vec::len).unwrap_or(0)
        );
        Ok(response.result.unwrap_or_default())
    }
}
