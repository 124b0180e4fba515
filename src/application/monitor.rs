//! Lifecycle Monitor
//!
//! The single writer of the token store. Consumes discovery events from
//! both ingestors, runs candidates through the safety gate, and drives the
//! per-token state machine on periodic sweeps: dev-sold check, price poll,
//! buy trigger, correct-token designation and retention cleanup.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::{MonitorSection, TradingSection};
use crate::domain::{Discovery, DiscoverySource, StoreError, TokenRecord, TokenStore};
use crate::ports::{MarketDataPort, SafetyPort};

use super::dispatcher::{DispatchOutcome, TradeDispatcher};
use super::gate::SafetyGate;
use super::scheduler::spawn_periodic;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct LifecycleMonitor {
    store: Arc<TokenStore>,
    gate: SafetyGate,
    market_data: Arc<dyn MarketDataPort>,
    safety: Arc<dyn SafetyPort>,
    dispatcher: Arc<TradeDispatcher>,
    gain_threshold_pct: f64,
    poll_interval: Duration,
    per_token_delay: Duration,
    cleanup_interval: Duration,
    retention_hours: i64,
}

impl LifecycleMonitor {
    pub fn new(
        store: Arc<TokenStore>,
        gate: SafetyGate,
        market_data: Arc<dyn MarketDataPort>,
        safety: Arc<dyn SafetyPort>,
        dispatcher: Arc<TradeDispatcher>,
        trading: &TradingSection,
        monitor: &MonitorSection,
    ) -> Self {
        Self {
            store,
            gate,
            market_data,
            safety,
            dispatcher,
            gain_threshold_pct: trading.gain_threshold_pct,
            poll_interval: Duration::from_secs(monitor.poll_interval_secs),
            per_token_delay: Duration::from_millis(monitor.per_token_delay_ms),
            cleanup_interval: Duration::from_secs(monitor.cleanup_interval_secs),
            retention_hours: monitor.retention_hours,
        }
    }

    /// Consume discovery events until the channel closes or shutdown flips.
    /// Spawns the poll and cleanup sweeps as periodic tasks.
    pub async fn run(
        self: Arc<Self>,
        mut discoveries: mpsc::Receiver<Discovery>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let poller = self.clone();
        let poll_handle = spawn_periodic(
            "price-poll",
            self.poll_interval,
            shutdown.clone(),
            move || {
                let poller = poller.clone();
                async move { poller.poll_sweep().await }
            },
        );

        let cleaner = self.clone();
        let cleanup_handle = spawn_periodic(
            "cleanup",
            self.cleanup_interval,
            shutdown.clone(),
            move || {
                let cleaner = cleaner.clone();
                async move { cleaner.cleanup_sweep().await }
            },
        );

        loop {
            tokio::select! {
                event = discoveries.recv() => {
                    match event {
                        Some(event) => {
                            if let Err(e) = self.handle_discovery(event).await {
                                warn!("Discovery handling failed: {}", e);
                            }
                        }
                        None => {
                            info!("Discovery channel closed, monitor stopping");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Monitor shutting down");
                        break;
                    }
                }
            }
        }

        poll_handle.abort();
        cleanup_handle.abort();
    }

    /// Route one discovery event
    pub async fn handle_discovery(&self, event: Discovery) -> Result<(), MonitorError> {
        match event {
            Discovery::Candidate { address, source } => self.enroll_candidate(&address, source).await,
            Discovery::CorrectToken { address } => self.designate_correct(&address).await,
        }
    }

    /// Gate a candidate and enroll it with the current price as baseline.
    /// A price fetch failure drops the candidate entirely; enrolling with a
    /// zero baseline would poison the trigger math forever.
    async fn enroll_candidate(
        &self,
        address: &str,
        source: DiscoverySource,
    ) -> Result<(), MonitorError> {
        if self.store.get(address)?.is_some() {
            debug!("Already tracking {}, ignoring {} discovery", address, source);
            return Ok(());
        }

        let decision = self.gate.check(address).await;
        if !decision.passed {
            info!(
                "Rejected {} (via {}): {}",
                address,
                source,
                decision.reason.as_deref().unwrap_or("unspecified")
            );
            return Ok(());
        }

        let price = match self.market_data.get_price(address).await {
            Ok(price) => price,
            Err(e) => {
                warn!("No price for {}, dropping candidate: {}", address, e);
                return Ok(());
            }
        };

        let record = TokenRecord::new(
            address.to_string(),
            decision.name,
            price,
            decision.total_supply,
        );
        if self.store.enroll(&record)? {
            info!(
                "Enrolled {} ({}) via {} at reference price {}",
                address, record.name, source, price
            );
        }
        Ok(())
    }

    /// One pass over every active token: dev-sold first, then price trigger
    pub async fn poll_sweep(&self) -> Result<(), MonitorError> {
        let tokens = self.store.active_tokens()?;
        let count = tokens.len();
        if count == 0 {
            return Ok(());
        }
        debug!("Polling {} active tokens", count);

        for (i, token) in tokens.into_iter().enumerate() {
            if let Err(e) = self.poll_token(&token).await {
                warn!("Poll failed for {}: {}", token.address, e);
            }
            // Pace the sweep so a large table does not hammer upstream APIs
            if i + 1 < count && !self.per_token_delay.is_zero() {
                tokio::time::sleep(self.per_token_delay).await;
            }
        }
        Ok(())
    }

    async fn poll_token(&self, token: &TokenRecord) -> Result<(), MonitorError> {
        match self.safety.dev_sold(&token.address).await {
            Ok(true) => {
                info!("Developer sold {}, retiring token", token.address);
                self.store.mark_inactive(&token.address)?;
                return Ok(());
            }
            Ok(false) => {}
            // Inconclusive check: leave the token active and move on
            Err(e) => debug!("Dev-sold check failed for {}: {}", token.address, e),
        }

        let price = match self.market_data.get_price(&token.address).await {
            Ok(price) => price,
            Err(e) => {
                debug!("Price unavailable for {}: {}", token.address, e);
                return Ok(());
            }
        };
        self.store.record_price(&token.address, price)?;

        let gain = token.gain_pct(price);
        if gain > self.gain_threshold_pct && !token.bought {
            info!(
                "{} gained {:.1}% (ref {} -> {}), buying",
                token.address, gain, token.reference_price, price
            );
            match self.dispatcher.buy(&token.address).await {
                Ok(DispatchOutcome::Executed(signature)) => {
                    self.store.mark_bought(&token.address)?;
                    info!("Bought {}: tx {}", token.address, signature);
                }
                Ok(DispatchOutcome::Simulated) => {
                    // Mirror the real flow so simulation fires once per crossing
                    self.store.mark_bought(&token.address)?;
                }
                // Guard stays clear; the trigger re-evaluates next sweep
                Ok(DispatchOutcome::Skipped) => {}
                Err(e) => warn!("Buy of {} failed: {}", token.address, e),
            }
        }
        Ok(())
    }

    /// The confirmed correct token has been designated: sell everything else
    /// (best effort), then make sure the designated token is enrolled and
    /// bought.
    async fn designate_correct(&self, address: &str) -> Result<(), MonitorError> {
        info!("Correct token designated: {}", address);

        for token in self.store.active_tokens()? {
            if token.address == address {
                continue;
            }
            // Only held positions are sold; an unheld token has nothing to
            // swap back and is just retired below
            if token.bought {
                if let Err(e) = self.dispatcher.sell(&token.address).await {
                    warn!("Sell of {} failed during sweep: {}", token.address, e);
                }
            }
            // Retired even when the sell failed; the position is abandoned
            self.store.mark_inactive(&token.address)?;
        }

        if self.store.get(address)?.is_none() {
            self.enroll_candidate(address, DiscoverySource::Signal).await?;
        }

        match self.store.get(address)? {
            Some(token) if !token.bought => {
                match self.dispatcher.buy(address).await {
                    Ok(DispatchOutcome::Executed(signature)) => {
                        self.store.mark_bought(address)?;
                        info!("Bought designated token {}: tx {}", address, signature);
                    }
                    Ok(DispatchOutcome::Simulated) => {
                        self.store.mark_bought(address)?;
                    }
                    Ok(DispatchOutcome::Skipped) => {
                        warn!("Buy of designated token {} skipped at capacity", address);
                    }
                    Err(e) => warn!("Buy of designated token {} failed: {}", address, e),
                }
            }
            Some(_) => debug!("Designated token {} already held", address),
            None => warn!("Designated token {} failed gating, not bought", address),
        }
        Ok(())
    }

    /// Drop inactive records past the retention horizon
    pub async fn cleanup_sweep(&self) -> Result<(), MonitorError> {
        let deleted = self.store.cleanup(self.retention_hours)?;
        if deleted > 0 {
            info!("Cleanup removed {} stale tokens", deleted);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SafetySection;
    use crate::ports::mocks::{MockMarketData, MockSafety, MockSwap};

    struct Fixture {
        monitor: LifecycleMonitor,
        store: Arc<TokenStore>,
        swap: Arc<MockSwap>,
        safety: Arc<MockSafety>,
    }

    fn fixture(market: MockMarketData, safety: MockSafety, simulation: bool) -> Fixture {
        fixture_with_swap(market, safety, MockSwap::new(), simulation)
    }

    fn fixture_with_swap(
        market: MockMarketData,
        safety: MockSafety,
        swap: MockSwap,
        simulation: bool,
    ) -> Fixture {
        let store = Arc::new(TokenStore::open_in_memory().unwrap());
        let market: Arc<MockMarketData> = Arc::new(market);
        let safety = Arc::new(safety);
        let swap = Arc::new(swap);

        let trading = TradingSection {
            simulation_mode: simulation,
            base_mint: "Base".to_string(),
            max_in_flight: 3,
            swap_timeout_secs: 5,
            gain_threshold_pct: 200.0,
            swap_url: "http://localhost".to_string(),
            price_url: "http://localhost".to_string(),
        };
        let section = MonitorSection {
            poll_interval_secs: 10,
            per_token_delay_ms: 0,
            cleanup_interval_secs: 86_400,
            retention_hours: 72,
        };
        let policy = SafetySection {
            allow_mint_authority: false,
            allow_freeze_authority: false,
            allow_mutable: false,
            rugcheck_url: "http://localhost".to_string(),
            timeout_secs: 10,
        };

        let gate = SafetyGate::new(safety.clone(), market.clone(), &policy);
        let dispatcher = Arc::new(TradeDispatcher::new(swap.clone(), &trading));
        let monitor = LifecycleMonitor::new(
            store.clone(),
            gate,
            market,
            safety.clone(),
            dispatcher,
            &trading,
            &section,
        );

        Fixture {
            monitor,
            store,
            swap,
            safety,
        }
    }

    fn candidate(address: &str) -> Discovery {
        Discovery::Candidate {
            address: address.to_string(),
            source: DiscoverySource::Stream,
        }
    }

    #[tokio::test]
    async fn test_gated_candidate_enrolled_at_current_price() {
        let f = fixture(
            MockMarketData::new()
                .with_prices("Addr1", &[2.0])
                .with_metadata("Addr1", "Pepe Jr", 500.0),
            MockSafety::new().with_clean("Addr1"),
            false,
        );

        f.monitor.handle_discovery(candidate("Addr1")).await.unwrap();

        let record = f.store.get("Addr1").unwrap().unwrap();
        assert_eq!(record.reference_price, 2.0);
        assert_eq!(record.name, "Pepe Jr");
        assert_eq!(record.market_cap, 1000.0);
    }

    #[tokio::test]
    async fn test_rejected_candidate_not_enrolled() {
        let f = fixture(
            MockMarketData::new().with_prices("Addr1", &[2.0]),
            MockSafety::new().with_failure("Addr1"),
            false,
        );

        f.monitor.handle_discovery(candidate("Addr1")).await.unwrap();
        assert!(f.store.get("Addr1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_price_failure_drops_candidate() {
        // Gate passes but no price is available
        let f = fixture(MockMarketData::new(), MockSafety::new().with_clean("Addr1"), false);

        f.monitor.handle_discovery(candidate("Addr1")).await.unwrap();
        assert!(f.store.get("Addr1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_discovery_skips_gate() {
        let f = fixture(
            MockMarketData::new().with_prices("Addr1", &[2.0]),
            MockSafety::new().with_clean("Addr1"),
            false,
        );

        f.monitor.handle_discovery(candidate("Addr1")).await.unwrap();
        f.monitor
            .handle_discovery(Discovery::Candidate {
                address: "Addr1".to_string(),
                source: DiscoverySource::Signal,
            })
            .await
            .unwrap();

        // One enrollment price call, no second gate pass
        assert_eq!(f.store.counts().unwrap().active, 1);
    }

    #[tokio::test]
    async fn test_buy_fires_once_above_threshold() {
        // Enrollment at 1.0, then sweeps see 3.5 (a 250% gain)
        let f = fixture(
            MockMarketData::new().with_prices("Addr1", &[1.0, 3.5]),
            MockSafety::new().with_clean("Addr1"),
            false,
        );

        f.monitor.handle_discovery(candidate("Addr1")).await.unwrap();
        f.monitor.poll_sweep().await.unwrap();
        f.monitor.poll_sweep().await.unwrap();
        f.monitor.poll_sweep().await.unwrap();

        // The guard stops the trigger from re-firing on later sweeps
        assert_eq!(f.swap.buys_into("Addr1"), 1);
        let record = f.store.get("Addr1").unwrap().unwrap();
        assert!(record.bought);
        assert_eq!(record.current_price, 3.5);
        assert_eq!(record.reference_price, 1.0);
    }

    #[tokio::test]
    async fn test_failed_buy_leaves_guard_clear_and_retries() {
        // Every swap into Addr1 fails; the gain holds across sweeps
        let f = fixture_with_swap(
            MockMarketData::new().with_prices("Addr1", &[1.0, 3.5]),
            MockSafety::new().with_clean("Addr1"),
            MockSwap::new().with_failure("Addr1"),
            false,
        );

        f.monitor.handle_discovery(candidate("Addr1")).await.unwrap();
        f.monitor.poll_sweep().await.unwrap();
        f.monitor.poll_sweep().await.unwrap();

        // The guard never sets on failure, so each sweep retries the buy
        assert!(!f.store.get("Addr1").unwrap().unwrap().bought);
        assert_eq!(f.swap.buys_into("Addr1"), 2);
        assert_eq!(
            f.store.get("Addr1").unwrap().unwrap().status,
            crate::domain::TokenStatus::Active
        );
    }

    #[tokio::test]
    async fn test_gain_at_threshold_does_not_trigger() {
        // Exactly +200% is not strictly above the threshold
        let f = fixture(
            MockMarketData::new().with_prices("Addr1", &[1.0, 3.0]),
            MockSafety::new().with_clean("Addr1"),
            false,
        );

        f.monitor.handle_discovery(candidate("Addr1")).await.unwrap();
        f.monitor.poll_sweep().await.unwrap();

        assert_eq!(f.swap.buys_into("Addr1"), 0);
    }

    #[tokio::test]
    async fn test_dev_sold_retires_before_price_check() {
        let f = fixture(
            MockMarketData::new().with_prices("Addr1", &[1.0, 9.0]),
            MockSafety::new().with_clean("Addr1"),
            false,
        );

        f.monitor.handle_discovery(candidate("Addr1")).await.unwrap();
        f.safety.set_dev_sold("Addr1");
        f.monitor.poll_sweep().await.unwrap();

        // Retired without buying despite the huge gain
        assert_eq!(f.swap.buys_into("Addr1"), 0);
        let record = f.store.get("Addr1").unwrap().unwrap();
        assert_eq!(record.status, crate::domain::TokenStatus::Inactive);
        // Price was never recorded for a retired token
        assert_eq!(record.current_price, 1.0);
    }

    #[tokio::test]
    async fn test_price_failure_keeps_token_active() {
        let f = fixture(MockMarketData::new(), MockSafety::new(), false);

        // Enrolled directly; the mock has no price for it, so every sweep's
        // lookup fails
        let record = crate::domain::TokenRecord::new(
            "Addr1".to_string(),
            "Test".to_string(),
            1.0,
            0.0,
        );
        f.store.enroll(&record).unwrap();

        f.monitor.poll_sweep().await.unwrap();

        let after = f.store.get("Addr1").unwrap().unwrap();
        assert_eq!(after.status, crate::domain::TokenStatus::Active);
        assert_eq!(after.current_price, 1.0);
        assert!(f.swap.calls().is_empty());
    }

    #[tokio::test]
    async fn test_designation_sells_held_and_retires_everything_else() {
        let f = fixture(
            MockMarketData::new()
                .with_prices("Held", &[1.0, 4.0])
                .with_prices("Other", &[1.0])
                .with_prices("Chosen", &[2.0]),
            MockSafety::new()
                .with_clean("Held")
                .with_clean("Other")
                .with_clean("Chosen"),
            false,
        );

        f.monitor.handle_discovery(candidate("Held")).await.unwrap();
        f.monitor.handle_discovery(candidate("Other")).await.unwrap();
        // "Held" crosses the threshold and gets bought
        f.monitor.poll_sweep().await.unwrap();
        assert!(f.store.get("Held").unwrap().unwrap().bought);

        f.monitor
            .handle_discovery(Discovery::CorrectToken {
                address: "Chosen".to_string(),
            })
            .await
            .unwrap();

        // Held position sold, unheld one just retired
        let calls = f.swap.calls();
        assert!(calls.contains(&(Some("Held".to_string()), "Base".to_string())));
        assert!(!calls.iter().any(|(from, _)| from.as_deref() == Some("Other")));

        use crate::domain::TokenStatus;
        assert_eq!(f.store.get("Held").unwrap().unwrap().status, TokenStatus::Inactive);
        assert_eq!(f.store.get("Other").unwrap().unwrap().status, TokenStatus::Inactive);

        // The designated token is enrolled and immediately bought
        let chosen = f.store.get("Chosen").unwrap().unwrap();
        assert_eq!(chosen.status, TokenStatus::Active);
        assert!(chosen.bought);
        assert_eq!(f.swap.buys_into("Chosen"), 1);
    }

    #[tokio::test]
    async fn test_designation_of_already_enrolled_token() {
        let f = fixture(
            MockMarketData::new().with_prices("Chosen", &[1.0]),
            MockSafety::new().with_clean("Chosen"),
            false,
        );

        f.monitor.handle_discovery(candidate("Chosen")).await.unwrap();
        f.monitor
            .handle_discovery(Discovery::CorrectToken {
                address: "Chosen".to_string(),
            })
            .await
            .unwrap();

        // No re-enrollment; bought exactly once
        assert_eq!(f.store.counts().unwrap().active, 1);
        assert_eq!(f.swap.buys_into("Chosen"), 1);
        assert!(f.store.get("Chosen").unwrap().unwrap().bought);
    }

    #[tokio::test]
    async fn test_simulation_mode_marks_bought_without_trading() {
        let f = fixture(
            MockMarketData::new().with_prices("Addr1", &[1.0, 5.0]),
            MockSafety::new().with_clean("Addr1"),
            true,
        );

        f.monitor.handle_discovery(candidate("Addr1")).await.unwrap();
        f.monitor.poll_sweep().await.unwrap();
        f.monitor.poll_sweep().await.unwrap();

        assert!(f.swap.calls().is_empty());
        assert!(f.store.get("Addr1").unwrap().unwrap().bought);
    }

    #[tokio::test]
    async fn test_cleanup_sweep_delegates_to_store() {
        let f = fixture(
            MockMarketData::new().with_prices("Addr1", &[1.0]),
            MockSafety::new().with_clean("Addr1"),
            false,
        );
        f.monitor.handle_discovery(candidate("Addr1")).await.unwrap();
        f.monitor.cleanup_sweep().await.unwrap();

        // Active and recent rows are untouched
        assert!(f.store.get("Addr1").unwrap().is_some());
    }
}
