//! Safety Gate
//!
//! Wraps the opaque rug-check and metadata lookups into a single pass/fail
//! decision with best-effort enrichment. The gate fails closed: any error
//! from the rug check rejects the candidate.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::SafetySection;
use crate::domain::UNKNOWN_NAME;
use crate::ports::{MarketDataPort, SafetyPort};

/// Outcome of gating one candidate address
#[derive(Debug, Clone)]
pub struct GateDecision {
    pub passed: bool,
    /// Reason for rejection, for the audit log
    pub reason: Option<String>,
    /// Enrichment: token name, "Unknown" when metadata is unavailable
    pub name: String,
    /// Enrichment: total supply, 0 when metadata is unavailable
    pub total_supply: f64,
}

impl GateDecision {
    fn rejected(reason: String) -> Self {
        Self {
            passed: false,
            reason: Some(reason),
            name: UNKNOWN_NAME.to_string(),
            total_supply: 0.0,
        }
    }
}

pub struct SafetyGate {
    safety: Arc<dyn SafetyPort>,
    market_data: Arc<dyn MarketDataPort>,
    allow_mint_authority: bool,
    allow_freeze_authority: bool,
    allow_mutable: bool,
}

impl SafetyGate {
    pub fn new(
        safety: Arc<dyn SafetyPort>,
        market_data: Arc<dyn MarketDataPort>,
        policy: &SafetySection,
    ) -> Self {
        Self {
            safety,
            market_data,
            allow_mint_authority: policy.allow_mint_authority,
            allow_freeze_authority: policy.allow_freeze_authority,
            allow_mutable: policy.allow_mutable,
        }
    }

    /// Evaluate one candidate. Rug-check failures reject; metadata failures
    /// only leave the enrichment fields at their defaults.
    pub async fn check(&self, address: &str) -> GateDecision {
        let report = match self.safety.rug_check(address).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Rug check failed for {}, rejecting: {}", address, e);
                return GateDecision::rejected(format!("rug check unavailable: {e}"));
            }
        };

        if report.rugged {
            return GateDecision::rejected("token flagged as rugged".to_string());
        }
        if report.mint_authority && !self.allow_mint_authority {
            return GateDecision::rejected("mint authority still held".to_string());
        }
        if report.freeze_authority && !self.allow_freeze_authority {
            return GateDecision::rejected("freeze authority still held".to_string());
        }
        if report.mutable && !self.allow_mutable {
            return GateDecision::rejected("metadata is mutable".to_string());
        }

        // Best effort from here on
        let (name, total_supply) = match self.market_data.get_metadata(address).await {
            Ok(meta) => (meta.name, meta.supply),
            Err(e) => {
                debug!("Metadata unavailable for {}: {}", address, e);
                (UNKNOWN_NAME.to_string(), 0.0)
            }
        };

        GateDecision {
            passed: true,
            reason: None,
            name,
            total_supply,
        }
    }
}
