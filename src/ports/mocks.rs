//! Mock port implementations used by unit and integration tests.
//!
//! Deterministic, no network: each mock records its calls and serves
//! responses configured up front.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::chain::{ChainError, ChainQueryPort};
use super::execution::{SwapError, SwapPort};
use super::market_data::{MarketDataError, MarketDataPort, TokenMetadata};
use super::safety::{RugCheckReport, SafetyError, SafetyPort};

/// Market data mock: per-address FIFO of prices (the last one is sticky)
/// and a fixed metadata table.
#[derive(Default)]
pub struct MockMarketData {
    prices: Mutex<HashMap<String, Vec<f64>>>,
    metadata: Mutex<HashMap<String, TokenMetadata>>,
    price_calls: Mutex<Vec<String>>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a sequence of prices for an address; once drained to the last
    /// entry, that price keeps being served.
    pub fn with_prices(self, address: &str, prices: &[f64]) -> Self {
        self.prices
            .lock()
            .unwrap()
            .insert(address.to_string(), prices.to_vec());
        self
    }

    pub fn with_metadata(self, address: &str, name: &str, supply: f64) -> Self {
        self.metadata.lock().unwrap().insert(
            address.to_string(),
            TokenMetadata {
                name: name.to_string(),
                supply,
                created_at: None,
            },
        );
        self
    }

    pub fn price_calls(&self) -> Vec<String> {
        self.price_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataPort for MockMarketData {
    async fn get_price(&self, address: &str) -> Result<f64, MarketDataError> {
        self.price_calls.lock().unwrap().push(address.to_string());
        let mut prices = self.prices.lock().unwrap();
        match prices.get_mut(address) {
            Some(queue) if queue.len() > 1 => Ok(queue.remove(0)),
            Some(queue) if queue.len() == 1 => Ok(queue[0]),
            _ => Err(MarketDataError::NoPrice(address.to_string())),
        }
    }

    async fn get_metadata(&self, address: &str) -> Result<TokenMetadata, MarketDataError> {
        self.metadata
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| MarketDataError::NoMetadata(address.to_string()))
    }
}

/// Safety mock: per-address reports, error injection and a mutable
/// dev-sold set.
#[derive(Default)]
pub struct MockSafety {
    reports: Mutex<HashMap<String, RugCheckReport>>,
    failing: Mutex<Vec<String>>,
    dev_sold: Mutex<Vec<String>>,
}

impl MockSafety {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_report(self, address: &str, report: RugCheckReport) -> Self {
        self.reports
            .lock()
            .unwrap()
            .insert(address.to_string(), report);
        self
    }

    /// Clean report: not rugged, no authorities, immutable
    pub fn with_clean(self, address: &str) -> Self {
        self.with_report(address, RugCheckReport::default())
    }

    /// Make `rug_check` return an error for this address
    pub fn with_failure(self, address: &str) -> Self {
        self.failing.lock().unwrap().push(address.to_string());
        self
    }

    pub fn set_dev_sold(&self, address: &str) {
        self.dev_sold.lock().unwrap().push(address.to_string());
    }
}

#[async_trait]
impl SafetyPort for MockSafety {
    async fn rug_check(&self, address: &str) -> Result<RugCheckReport, SafetyError> {
        if self.failing.lock().unwrap().iter().any(|a| a == address) {
            return Err(SafetyError::Network("injected failure".to_string()));
        }
        self.reports
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .ok_or_else(|| SafetyError::Network(format!("no report for {address}")))
    }

    async fn dev_sold(&self, address: &str) -> Result<bool, SafetyError> {
        Ok(self.dev_sold.lock().unwrap().iter().any(|a| a == address))
    }
}

/// Swap mock: records every call, optionally holds each call open for a
/// configured delay, and tracks the peak number of concurrent calls so
/// tests can assert the in-flight cap.
#[derive(Default)]
pub struct MockSwap {
    calls: Mutex<Vec<(Option<String>, String)>>,
    failing: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockSwap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make swaps into `to` fail
    pub fn with_failure(self, to: &str) -> Self {
        self.failing.lock().unwrap().push(to.to_string());
        self
    }

    /// Hold every swap open for `delay` before completing
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(Option<String>, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Count of buys (base currency spends) into `to`
    pub fn buys_into(&self, to: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(from, target)| from.is_none() && target == to)
            .count()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SwapPort for MockSwap {
    async fn swap(&self, from: Option<&str>, to: &str) -> Result<String, SwapError> {
        self.calls
            .lock()
            .unwrap()
            .push((from.map(str::to_string), to.to_string()));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().iter().any(|t| t == to) {
            return Err(SwapError::Rejected(format!("injected failure for {to}")));
        }
        Ok(format!("MockTx{}", self.calls.lock().unwrap().len()))
    }
}

/// Chain lookup mock: fixed signature -> mint table
#[derive(Default)]
pub struct MockChain {
    mints: Mutex<HashMap<String, String>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mint(self, signature: &str, mint: &str) -> Self {
        self.mints
            .lock()
            .unwrap()
            .insert(signature.to_string(), mint.to_string());
        self
    }
}

#[async_trait]
impl ChainQueryPort for MockChain {
    async fn new_token_mint(&self, signature: &str) -> Result<Option<String>, ChainError> {
        Ok(self.mints.lock().unwrap().get(signature).cloned())
    }
}
