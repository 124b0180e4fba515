//! Token Record
//!
//! The central entity of the monitoring engine: one row per token under
//! observation, carrying the enrollment baseline price and lifecycle status.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder name used when metadata enrichment is unavailable
pub const UNKNOWN_NAME: &str = "Unknown";

/// Lifecycle status of a tracked token
///
/// Transitions only ever go `Active -> Inactive`; the store exposes no
/// operation that reverses an inactive token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    Active,
    Inactive,
}

impl TokenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Active => "active",
            TokenStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(TokenStatus::Active),
            "inactive" => Some(TokenStatus::Inactive),
            _ => None,
        }
    }
}

/// A token enrolled for lifecycle monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Token mint address (base58, primary key)
    pub address: String,
    /// Token name from metadata enrichment ("Unknown" when unavailable)
    pub name: String,
    /// When the token was first observed
    pub discovered_at: DateTime<Utc>,
    /// Price captured at enrollment; baseline for trigger math, never mutated
    pub reference_price: f64,
    /// Latest observed price
    pub current_price: f64,
    /// Timestamp of the most recent price poll
    pub last_checked_at: DateTime<Utc>,
    /// Lifecycle status
    pub status: TokenStatus,
    /// Total supply from metadata enrichment (0 when unavailable)
    pub total_supply: f64,
    /// Market cap computed at enrollment: total_supply * reference_price
    pub market_cap: f64,
    /// Set after a successful buy so the trigger does not re-fire for the
    /// same crossing
    pub bought: bool,
}

impl TokenRecord {
    /// Create a fresh record at enrollment time
    pub fn new(address: String, name: String, reference_price: f64, total_supply: f64) -> Self {
        let now = Utc::now();
        Self {
            address,
            name,
            discovered_at: now,
            reference_price,
            current_price: reference_price,
            last_checked_at: now,
            status: TokenStatus::Active,
            total_supply,
            market_cap: total_supply * reference_price,
            bought: false,
        }
    }

    /// Percentage change of `price` against the enrollment baseline
    pub fn gain_pct(&self, price: f64) -> f64 {
        if self.reference_price <= 0.0 {
            return 0.0;
        }
        (price - self.reference_price) / self.reference_price * 100.0
    }

    /// Whether an inactive record has aged past the retention horizon
    pub fn is_stale(&self, now: DateTime<Utc>, retention_hours: i64) -> bool {
        self.status == TokenStatus::Inactive
            && now - self.last_checked_at > Duration::hours(retention_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        assert_eq!(TokenStatus::parse("active"), Some(TokenStatus::Active));
        assert_eq!(TokenStatus::parse("inactive"), Some(TokenStatus::Inactive));
        assert_eq!(TokenStatus::parse("selling"), None);
        assert_eq!(TokenStatus::Active.as_str(), "active");
    }

    #[test]
    fn test_gain_pct() {
        let record = TokenRecord::new("Addr1".to_string(), "Test".to_string(), 1.0, 0.0);

        // 250% increase
        assert!((record.gain_pct(3.5) - 250.0).abs() < 0.001);

        // 50% drop
        assert!((record.gain_pct(0.5) - (-50.0)).abs() < 0.001);
    }

    #[test]
    fn test_gain_pct_zero_reference() {
        let record = TokenRecord::new("Addr1".to_string(), "Test".to_string(), 0.0, 0.0);
        assert_eq!(record.gain_pct(5.0), 0.0);
    }

    #[test]
    fn test_market_cap_computed_at_enrollment() {
        let record = TokenRecord::new("Addr1".to_string(), "Test".to_string(), 2.0, 1000.0);
        assert!((record.market_cap - 2000.0).abs() < 0.001);
    }

    #[test]
    fn test_staleness_requires_inactive() {
        let mut record = TokenRecord::new("Addr1".to_string(), "Test".to_string(), 1.0, 0.0);
        let later = record.last_checked_at + Duration::hours(100);

        // Active records never go stale
        assert!(!record.is_stale(later, 72));

        record.status = TokenStatus::Inactive;
        assert!(record.is_stale(later, 72));
        assert!(!record.is_stale(record.last_checked_at + Duration::hours(10), 72));
    }
}
