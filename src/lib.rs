//! Poolwatch - Token Lifecycle Monitoring Engine for Solana
//!
//! Watches new liquidity pools and signal channels, gates candidates through
//! a rug-check safety policy, and tracks enrolled tokens through a
//! persistent, price-triggered lifecycle.
//!
//! # Modules
//!
//! - `domain`: TokenRecord, discovery events and the SQLite token store
//! - `ports`: Trait abstractions (MarketDataPort, SafetyPort, SwapPort, ChainQueryPort)
//! - `adapters`: External implementations (WebSocket stream, signal channels, HTTP clients, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Safety gate, lifecycle monitor and trade dispatcher

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
