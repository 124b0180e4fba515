//! Domain Layer - Core entities and the persistent token store
//!
//! - `token`: TokenRecord and its lifecycle status
//! - `store`: SQLite-backed table of tokens under observation
//! - `discovery`: the normalized event both ingestors emit

pub mod discovery;
pub mod store;
pub mod token;

pub use discovery::{Discovery, DiscoverySource};
pub use store::{StoreCounts, StoreError, TokenStore};
pub use token::{TokenRecord, TokenStatus, UNKNOWN_NAME};
