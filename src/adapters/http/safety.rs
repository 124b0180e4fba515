//! Rug-Check Client
//!
//! Fetches token safety reports from the external rug-check service. The
//! dev-sold signal is derived from the same report: a creator balance of
//! zero means the original holder has fully liquidated.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::ports::{RugCheckReport, SafetyError, SafetyPort};

#[derive(Debug, Clone)]
pub struct RugCheckClient {
    http: Client,
    base_url: String,
    timeout_secs: u64,
}

impl RugCheckClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, SafetyError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SafetyError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    async fn fetch_report(&self, address: &str) -> Result<ReportResponse, SafetyError> {
        let url = format!("{}/tokens/{}/report", self.base_url, address);

        let response = self.http.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                SafetyError::Timeout(self.timeout_secs)
            } else {
                SafetyError::Network(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(SafetyError::Network(format!(
                "report request for {} returned {}",
                address,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SafetyError::Parse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ReportResponse {
    #[serde(default)]
    rugged: bool,
    #[serde(default)]
    token: TokenAuthorities,
    #[serde(rename = "tokenMeta", default)]
    token_meta: TokenMeta,
    #[serde(rename = "creatorBalance", default)]
    creator_balance: u64,
}

#[derive(Debug, Default, Deserialize)]
struct TokenAuthorities {
    #[serde(rename = "mintAuthority")]
    mint_authority: Option<String>,
    #[serde(rename = "freezeAuthority")]
    freeze_authority: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenMeta {
    #[serde(default)]
    mutable: bool,
}

impl From<&ReportResponse> for RugCheckReport {
    fn from(report: &ReportResponse) -> Self {
        Self {
            rugged: report.rugged,
            mint_authority: report.token.mint_authority.is_some(),
            freeze_authority: report.token.freeze_authority.is_some(),
            mutable: report.token_meta.mutable,
        }
    }
}

#[async_trait]
impl SafetyPort for RugCheckClient {
    async fn rug_check(&self, address: &str) -> Result<RugCheckReport, SafetyError> {
        let report = self.fetch_report(address).await?;
        Ok(RugCheckReport::from(&report))
    }

    async fn dev_sold(&self, address: &str) -> Result<bool, SafetyError> {
        let report = self.fetch_report(address).await?;
        Ok(report.creator_balance == 0)
    }
}
