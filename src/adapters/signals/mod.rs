//! Signal-channel ingestor and the long-poll client feeding it

mod ingestor;
mod telegram;

pub use ingestor::{extract_address, is_token_address, RawSignalMessage, SignalIngestor};
pub use telegram::{TelegramClient, TelegramError};
