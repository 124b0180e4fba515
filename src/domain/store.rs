//! Persistent Token Store
//!
//! Durable SQLite table of tokens under observation. The store is passive:
//! the lifecycle monitor is the sole writer, and every operation serializes
//! through the connection mutex so no partial update is ever visible. The
//! lock is never held across an await point - callers read, do their slow
//! I/O, then write back in a second short critical section.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use super::token::{TokenRecord, TokenStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Counts reported by [`TokenStore::counts`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCounts {
    pub active: u64,
    pub inactive: u64,
}

/// SQLite-backed table of [`TokenRecord`]s keyed by address
pub struct TokenStore {
    conn: Mutex<Connection>,
}

impl TokenStore {
    /// Open (or create) the store at `path` and ensure the schema exists
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory store, used by tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tokens (
                address         TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                discovered_at   TEXT NOT NULL,
                reference_price REAL NOT NULL,
                current_price   REAL NOT NULL,
                last_checked_at TEXT NOT NULL,
                status          TEXT NOT NULL CHECK (status IN ('active', 'inactive')),
                total_supply    REAL NOT NULL DEFAULT 0,
                market_cap      REAL NOT NULL DEFAULT 0,
                bought          INTEGER NOT NULL DEFAULT 0
            )",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Idempotent enrollment: inserting an address that already has a row is
    /// a no-op. Returns true when a new row was created.
    pub fn enroll(&self, record: &TokenRecord) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO tokens
             (address, name, discovered_at, reference_price, current_price,
              last_checked_at, status, total_supply, market_cap, bought)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.address,
                record.name,
                record.discovered_at.to_rfc3339(),
                record.reference_price,
                record.current_price,
                record.last_checked_at.to_rfc3339(),
                record.status.as_str(),
                record.total_supply,
                record.market_cap,
                record.bought as i64,
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Fetch a single record by address
    pub fn get(&self, address: &str) -> Result<Option<TokenRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT address, name, discovered_at, reference_price, current_price,
                    last_checked_at, status, total_supply, market_cap, bought
             FROM tokens WHERE address = ?1",
            params![address],
            row_to_record,
        )
        .optional()
        .map_err(StoreError::from)
    }

    /// All tokens currently active, oldest discovery first
    pub fn active_tokens(&self) -> Result<Vec<TokenRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT address, name, discovered_at, reference_price, current_price,
                    last_checked_at, status, total_supply, market_cap, bought
             FROM tokens WHERE status = 'active' ORDER BY discovered_at ASC",
        )?;
        let rows = stmt.query_map([], row_to_record)?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// Record the latest observed price and advance `last_checked_at`.
    /// The reference price is deliberately untouched.
    pub fn record_price(&self, address: &str, price: f64) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE tokens SET current_price = ?2, last_checked_at = ?3 WHERE address = ?1",
            params![address, price, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Flip a token to inactive (terminal; there is no reverse operation)
    pub fn mark_inactive(&self, address: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE tokens SET status = 'inactive', last_checked_at = ?2 WHERE address = ?1",
            params![address, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Set the re-fire guard after a successful buy
    pub fn mark_bought(&self, address: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE tokens SET bought = 1 WHERE address = ?1",
            params![address],
        )?;
        Ok(())
    }

    /// Delete inactive records whose last check is older than the retention
    /// horizon. Returns the number of rows removed.
    pub fn cleanup(&self, retention_hours: i64) -> Result<usize, StoreError> {
        let cutoff = Utc::now() - Duration::hours(retention_hours);
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM tokens WHERE status = 'inactive' AND last_checked_at < ?1",
            params![cutoff.to_rfc3339()],
        )?;
        Ok(deleted)
    }

    /// Active/inactive row counts
    pub fn counts(&self) -> Result<StoreCounts, StoreError> {
        let conn = self.conn.lock().unwrap();
        let active: u64 = conn.query_row(
            "SELECT COUNT(*) FROM tokens WHERE status = 'active'",
            [],
            |row| row.get(0),
        )?;
        let inactive: u64 = conn.query_row(
            "SELECT COUNT(*) FROM tokens WHERE status = 'inactive'",
            [],
            |row| row.get(0),
        )?;
        Ok(StoreCounts { active, inactive })
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<TokenRecord> {
    let address: String = row.get(0)?;
    let discovered_at: String = row.get(2)?;
    let last_checked_at: String = row.get(5)?;
    let status: String = row.get(6)?;

    Ok(TokenRecord {
        address: address.clone(),
        name: row.get(1)?,
        discovered_at: parse_timestamp(&discovered_at, 2)?,
        reference_price: row.get(3)?,
        current_price: row.get(4)?,
        last_checked_at: parse_timestamp(&last_checked_at, 5)?,
        status: TokenStatus::parse(&status).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                format!("unknown status '{status}' for {address}").into(),
            )
        })?,
        total_supply: row.get(7)?,
        market_cap: row.get(8)?,
        bought: row.get::<_, i64>(9)? != 0,
    })
}

fn parse_timestamp(raw: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                e.to_string().into(),
            )
        })
}
