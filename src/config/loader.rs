//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml
//! structure. Secrets (bot token, private RPC URLs) come from the
//! environment and override the file values.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub stream: StreamSection,
    pub rpc: RpcSection,
    #[serde(default)]
    pub signals: SignalsSection,
    pub safety: SafetySection,
    pub trading: TradingSection,
    pub monitor: MonitorSection,
    pub store: StoreSection,
}

/// Live log-stream subscription section
#[derive(Debug, Clone, Deserialize)]
pub struct StreamSection {
    /// WebSocket RPC endpoint
    pub wss_url: String,
    /// Program id whose logs announce new pools
    pub program_id: String,
    /// Commitment level: "processed" or "finalized"
    pub commitment: String,
    /// Log line marker identifying a pool initialization
    #[serde(default = "default_pool_marker")]
    pub pool_marker: String,
    /// Keep-alive ping interval in seconds
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    /// Fixed delay before reconnecting after any transport failure
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    /// Connection establishment timeout
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl StreamSection {
    /// WSS URL with environment variable override (private endpoints)
    pub fn get_wss_url(&self) -> String {
        std::env::var("RPC_WSS_URL").unwrap_or_else(|_| self.wss_url.clone())
    }
}

/// HTTP RPC section (transaction detail lookups)
#[derive(Debug, Clone, Deserialize)]
pub struct RpcSection {
    pub http_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl RpcSection {
    pub fn get_http_url(&self) -> String {
        std::env::var("RPC_HTTP_URL").unwrap_or_else(|_| self.http_url.clone())
    }
}

/// Signal channel section (optional; the engine runs stream-only without it)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SignalsSection {
    #[serde(default)]
    pub enabled: bool,
    /// Long-lived session credential; prefer the SIGNAL_BOT_TOKEN env var
    #[serde(default)]
    pub bot_token: String,
    /// Channel ids whose messages are considered recommendations
    #[serde(default)]
    pub allow_channels: Vec<i64>,
    /// Channel id whose messages designate the confirmed correct token
    #[serde(default)]
    pub designation_channel: Option<i64>,
    /// Long-poll timeout in seconds
    #[serde(default = "default_signal_poll_secs")]
    pub poll_timeout_secs: u64,
}

impl SignalsSection {
    pub fn get_bot_token(&self) -> Option<String> {
        if let Ok(token) = std::env::var("SIGNAL_BOT_TOKEN") {
            if !token.is_empty() {
                return Some(token);
            }
        }
        if self.bot_token.is_empty() {
            None
        } else {
            Some(self.bot_token.clone())
        }
    }
}

/// Safety gate policy section
#[derive(Debug, Clone, Deserialize)]
pub struct SafetySection {
    /// Accept tokens whose mint authority is still held
    #[serde(default)]
    pub allow_mint_authority: bool,
    /// Accept tokens whose freeze authority is still held
    #[serde(default)]
    pub allow_freeze_authority: bool,
    /// Accept tokens with mutable metadata
    #[serde(default)]
    pub allow_mutable: bool,
    /// Rug check service base URL
    pub rugcheck_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

/// Trade dispatch section
#[derive(Debug, Clone, Deserialize)]
pub struct TradingSection {
    /// When set, no trade is ever dispatched; discovery and gating still run
    #[serde(default)]
    pub simulation_mode: bool,
    /// Base currency mint (what buys spend and sells settle into)
    pub base_mint: String,
    /// Global cap on simultaneously in-flight trade attempts
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Per-call timeout on the swap operation
    #[serde(default = "default_swap_timeout_secs")]
    pub swap_timeout_secs: u64,
    /// Buy trigger: percentage gain over the reference price
    #[serde(default = "default_gain_threshold_pct")]
    pub gain_threshold_pct: f64,
    /// Swap service base URL
    pub swap_url: String,
    /// Price/metadata service base URL
    pub price_url: String,
}

/// Lifecycle monitor cadence section
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSection {
    /// Price poll sweep interval in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Pacing delay between tokens within one sweep, in milliseconds
    #[serde(default = "default_per_token_delay_ms")]
    pub per_token_delay_ms: u64,
    /// Cleanup sweep interval in seconds
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    /// Hours an inactive token is kept before deletion
    #[serde(default = "default_retention_hours")]
    pub retention_hours: i64,
}

/// Persistence section
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// SQLite database path
    pub db_path: String,
}

fn default_pool_marker() -> String {
    "initialize2".to_string()
}
fn default_heartbeat_secs() -> u64 {
    30
}
fn default_reconnect_delay_secs() -> u64 {
    5
}
fn default_connect_timeout_secs() -> u64 {
    15
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_signal_poll_secs() -> u64 {
    25
}
fn default_max_in_flight() -> usize {
    3
}
fn default_swap_timeout_secs() -> u64 {
    30
}
fn default_gain_threshold_pct() -> f64 {
    200.0
}
fn default_poll_interval_secs() -> u64 {
    10
}
fn default_per_token_delay_ms() -> u64 {
    600
}
fn default_cleanup_interval_secs() -> u64 {
    86_400
}
fn default_retention_hours() -> i64 {
    72
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream.wss_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "stream.wss_url cannot be empty".to_string(),
            ));
        }

        if !self.stream.wss_url.starts_with("ws://") && !self.stream.wss_url.starts_with("wss://") {
            return Err(ConfigError::ValidationError(format!(
                "stream.wss_url must be a ws:// or wss:// URL, got {}",
                self.stream.wss_url
            )));
        }

        if self.stream.program_id.is_empty() {
            return Err(ConfigError::ValidationError(
                "stream.program_id cannot be empty".to_string(),
            ));
        }

        match self.stream.commitment.as_str() {
            "processed" | "finalized" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "stream.commitment must be 'processed' or 'finalized', got '{other}'"
                )));
            }
        }

        if self.rpc.http_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc.http_url cannot be empty".to_string(),
            ));
        }

        if self.signals.enabled && self.signals.allow_channels.is_empty() {
            return Err(ConfigError::ValidationError(
                "signals.allow_channels cannot be empty when signals are enabled".to_string(),
            ));
        }

        if self.safety.rugcheck_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "safety.rugcheck_url cannot be empty".to_string(),
            ));
        }

        if self.trading.base_mint.is_empty() {
            return Err(ConfigError::ValidationError(
                "trading.base_mint cannot be empty".to_string(),
            ));
        }

        if self.trading.max_in_flight == 0 {
            return Err(ConfigError::ValidationError(
                "trading.max_in_flight must be > 0".to_string(),
            ));
        }

        if self.trading.gain_threshold_pct <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "trading.gain_threshold_pct must be > 0, got {}",
                self.trading.gain_threshold_pct
            )));
        }

        if self.trading.swap_url.is_empty() || self.trading.price_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "trading.swap_url and trading.price_url cannot be empty".to_string(),
            ));
        }

        if self.monitor.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "monitor.poll_interval_secs must be > 0".to_string(),
            ));
        }

        if self.monitor.retention_hours <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "monitor.retention_hours must be > 0, got {}",
                self.monitor.retention_hours
            )));
        }

        if self.store.db_path.is_empty() {
            return Err(ConfigError::ValidationError(
                "store.db_path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[stream]
wss_url = "wss://api.mainnet-beta.solana.com"
program_id = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8"
commitment = "processed"

[rpc]
http_url = "https://api.mainnet-beta.solana.com"

[signals]
enabled = true
allow_channels = [-1001234567890]
designation_channel = -1009876543210

[safety]
allow_mint_authority = false
allow_freeze_authority = false
allow_mutable = false
rugcheck_url = "https://api.rugcheck.xyz/v1"

[trading]
simulation_mode = true
base_mint = "So11111111111111111111111111111111111111112"
swap_url = "https://quote-api.jup.ag/v6"
price_url = "https://price.jup.ag/v6"

[monitor]
poll_interval_secs = 10
retention_hours = 72

[store]
db_path = "data/tokens.db"
"#
        .to_string()
    }

    fn load_from_str(content: &str) -> Result<Config, ConfigError> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        load_config(file.path())
    }

    #[test]
    fn test_load_valid_config() {
        let config = load_from_str(&create_valid_config()).unwrap();

        assert_eq!(config.stream.commitment, "processed");
        assert_eq!(config.stream.pool_marker, "initialize2");
        assert_eq!(config.stream.heartbeat_secs, 30);
        assert_eq!(config.stream.reconnect_delay_secs, 5);
        assert_eq!(config.trading.max_in_flight, 3);
        assert_eq!(config.trading.gain_threshold_pct, 200.0);
        assert_eq!(config.monitor.per_token_delay_ms, 600);
        assert_eq!(config.monitor.cleanup_interval_secs, 86_400);
        assert_eq!(config.monitor.retention_hours, 72);
        assert!(config.trading.simulation_mode);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_invalid_commitment() {
        let content = create_valid_config().replace("\"processed\"", "\"confirmed-ish\"");
        let result = load_from_str(&content);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_wss_url_scheme_enforced() {
        let content = create_valid_config().replace(
            "wss://api.mainnet-beta.solana.com",
            "https://api.mainnet-beta.solana.com",
        );
        let result = load_from_str(&content);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_signals_enabled_requires_channels() {
        let content = create_valid_config().replace("allow_channels = [-1001234567890]", "allow_channels = []");
        let result = load_from_str(&content);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_signals_section_optional() {
        let content = create_valid_config()
            .replace("enabled = true", "enabled = false")
            .replace("allow_channels = [-1001234567890]", "allow_channels = []");
        let config = load_from_str(&content).unwrap();
        assert!(!config.signals.enabled);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let content = create_valid_config().replace("poll_interval_secs = 10", "poll_interval_secs = 0");
        let result = load_from_str(&content);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_gain_threshold_must_be_positive() {
        let content = format!("{}\n", create_valid_config())
            .replace("simulation_mode = true", "simulation_mode = true\ngain_threshold_pct = -5.0");
        let result = load_from_str(&content);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }
}
