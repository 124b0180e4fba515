//! Trade Dispatcher
//!
//! Executes buy/sell actions against the opaque swap operation under a
//! global cap on simultaneously in-flight attempts. A request arriving
//! while the cap is exhausted is rejected immediately, never queued - the
//! lifecycle monitor retries on a later cycle if the trigger still holds.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::TradingSection;
use crate::ports::{SwapError, SwapPort};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Swap failed: {0}")]
    Swap(#[from] SwapError),

    #[error("Swap timed out after {0}s")]
    Timeout(u64),
}

/// What happened to one dispatch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Swap submitted; contains the transaction signature
    Executed(String),
    /// In-flight cap exhausted; not attempted
    Skipped,
    /// Simulation mode; logged but never dispatched
    Simulated,
}

pub struct TradeDispatcher {
    swap: Arc<dyn SwapPort>,
    permits: Arc<Semaphore>,
    swap_timeout: Duration,
    timeout_secs: u64,
    simulation_mode: bool,
    base_mint: String,
}

impl TradeDispatcher {
    pub fn new(swap: Arc<dyn SwapPort>, trading: &TradingSection) -> Self {
        Self {
            swap,
            permits: Arc::new(Semaphore::new(trading.max_in_flight)),
            swap_timeout: Duration::from_secs(trading.swap_timeout_secs),
            timeout_secs: trading.swap_timeout_secs,
            simulation_mode: trading.simulation_mode,
            base_mint: trading.base_mint.clone(),
        }
    }

    /// Spend the base currency on `address`
    pub async fn buy(&self, address: &str) -> Result<DispatchOutcome, DispatchError> {
        self.dispatch(None, address).await
    }

    /// Sell `address` back into the base currency
    pub async fn sell(&self, address: &str) -> Result<DispatchOutcome, DispatchError> {
        self.dispatch(Some(address), &self.base_mint).await
    }

    /// Permits currently available (tests assert the cap invariant)
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    async fn dispatch(
        &self,
        from: Option<&str>,
        to: &str,
    ) -> Result<DispatchOutcome, DispatchError> {
        let action = if from.is_none() { "buy" } else { "sell" };

        if self.simulation_mode {
            info!("[simulation] {} {} skipped, no trade dispatched", action, to);
            return Ok(DispatchOutcome::Simulated);
        }

        // Not queued: a full pipeline rejects immediately.
        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("In-flight cap reached, skipping {} of {}", action, to);
                return Ok(DispatchOutcome::Skipped);
            }
        };

        // The owned permit is released on every exit path below, including
        // the timeout, so a hung swap cannot starve the pool forever.
        let result = timeout(self.swap_timeout, self.swap.swap(from, to)).await;
        drop(permit);

        match result {
            Ok(Ok(signature)) => {
                info!("Dispatched {} of {}: tx {}", action, to, signature);
                Ok(DispatchOutcome::Executed(signature))
            }
            Ok(Err(e)) => {
                warn!("{} of {} failed: {}", action, to, e);
                Err(DispatchError::Swap(e))
            }
            Err(_) => {
                warn!("{} of {} timed out after {}s", action, to, self.timeout_secs);
                Err(DispatchError::Timeout(self.timeout_secs))
            }
        }
    }
}
