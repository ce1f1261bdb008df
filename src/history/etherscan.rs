//! Etherscan-compatible transaction history source
//!
//! Speaks the `module=account&action=txlist` API. Page numbers double as
//! continuation tokens: a full page means another page may exist.

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::history::{HistoryPage, HistorySource};
use crate::types::Transfer;

/// Etherscan API configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EtherscanConfig {
    /// API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// API key, empty for anonymous (heavily rate-limited) access
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Transactions requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Initial retry delay for transient failures, in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Give up retrying a request after this many seconds
    #[serde(default = "default_retry_max_elapsed_secs")]
    pub retry_max_elapsed_secs: u64,
}

fn default_api_url() -> String {
    std::env::var("ETHERSCAN_API_URL")
        .unwrap_or_else(|_| "https://api.etherscan.io/api".to_string())
}

fn default_api_key() -> String {
    std::env::var("ETHERSCAN_API_KEY").unwrap_or_default()
}

fn default_page_size() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_retry_max_elapsed_secs() -> u64 {
    15
}

impl Default for EtherscanConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: default_api_key(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_elapsed_secs: default_retry_max_elapsed_secs(),
        }
    }
}

/// `HistorySource` backed by the Etherscan transaction list endpoint
pub struct EtherscanHistorySource {
    config: EtherscanConfig,
    client: Client,
}

impl EtherscanHistorySource {
    pub fn new(config: EtherscanConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    fn txlist_url(&self, address: &str, page: u64) -> String {
        format!(
            "{}?module=account&action=txlist&address={}&startblock=0&endblock=99999999&page={}&offset={}&sort=asc&apikey={}",
            self.config.api_url, address, page, self.config.page_size, self.config.api_key
        )
    }

    /// Fetch one URL with retries on transport errors and retryable statuses
    async fn fetch_page(&self, url: &str) -> Result<TxListResponse> {
        let policy = ExponentialBackoff {
            initial_interval: Duration::from_millis(self.config.retry_base_delay_ms),
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_max_elapsed_secs)),
            ..ExponentialBackoff::default()
        };

        backoff::future::retry(policy, || async {
            let response = self.client.get(url).send().await.map_err(|e| {
                warn!("Etherscan request failed, will retry: {}", e);
                backoff::Error::transient(Error::UpstreamFetch(format!(
                    "Etherscan request failed: {}",
                    e
                )))
            })?;

            let status = response.status();
            if status.is_server_error() || status.as_u16() == 429 {
                warn!(status = %status, "Etherscan returned retryable status");
                return Err(backoff::Error::transient(Error::UpstreamFetch(format!(
                    "Etherscan returned status {}",
                    status
                ))));
            }
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read response body".to_string());
                return Err(backoff::Error::permanent(Error::UpstreamFetch(format!(
                    "Etherscan returned status {}: {}",
                    status, body
                ))));
            }

            response.json::<TxListResponse>().await.map_err(|e| {
                backoff::Error::permanent(Error::UpstreamFetch(format!(
                    "Failed to parse Etherscan response: {}",
                    e
                )))
            })
        })
        .await
    }
}

#[async_trait]
impl HistorySource for EtherscanHistorySource {
    fn name(&self) -> &'static str {
        "etherscan"
    }

    async fn page(&self, address: &str, page_token: Option<&str>) -> Result<HistoryPage> {
        let page = match page_token {
            Some(token) => token
                .parse::<u64>()
                .map_err(|_| Error::UpstreamFetch(format!("invalid page token: {:?}", token)))?,
            None => 1,
        };

        let url = self.txlist_url(address, page);
        debug!(address, page, "Requesting transaction page");
        let response = self.fetch_page(&url).await?;
        convert_response(response, page, self.config.page_size)
    }
}

// ============ Etherscan API Response Types ============

#[derive(Debug, Deserialize)]
struct TxListResponse {
    status: String,
    message: String,
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawTransaction {
    hash: String,
    from: String,
    #[serde(default)]
    to: String,
    value: String,
    #[serde(rename = "timeStamp")]
    time_stamp: String,
    #[serde(rename = "isError", default)]
    is_error: String,
}

/// Convert a raw API response into a history page
fn convert_response(response: TxListResponse, page: u64, page_size: usize) -> Result<HistoryPage> {
    if response.status != "1" {
        // An empty history comes back as an error-status response
        if response.message.starts_with("No transactions found") {
            return Ok(HistoryPage::default());
        }
        let detail = response
            .result
            .as_str()
            .unwrap_or(response.message.as_str());
        return Err(Error::UpstreamFetch(format!(
            "Etherscan API error: {}",
            detail
        )));
    }

    let raw: Vec<RawTransaction> = serde_json::from_value(response.result)
        .map_err(|e| Error::UpstreamFetch(format!("Unexpected Etherscan result shape: {}", e)))?;

    let full_page = raw.len() >= page_size;
    let transfers = raw
        .into_iter()
        .map(to_transfer)
        .collect::<Result<Vec<_>>>()?;

    let next_token = if full_page {
        Some((page + 1).to_string())
    } else {
        None
    };

    Ok(HistoryPage {
        transfers,
        next_token,
    })
}

/// Convert one raw transaction into the domain transfer type
fn to_transfer(raw: RawTransaction) -> Result<Transfer> {
    let value_raw = raw.value.trim().parse::<u128>().map_err(|e| {
        Error::UpstreamFetch(format!("Malformed transfer value {:?}: {}", raw.value, e))
    })?;
    let succeeded = raw.is_error != "1";
    Ok(Transfer {
        hash: raw.hash,
        from: raw.from,
        to: raw.to,
        value_raw,
        timestamp: raw.time_stamp.trim().parse().unwrap_or(0),
        succeeded,
    })
}
