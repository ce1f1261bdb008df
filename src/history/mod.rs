//! Transfer history retrieval
//!
//! A [`HistorySource`] yields one page of raw transfer history per call.
//! [`TransferFetcher`] drives pagination to exhaustion and applies the
//! retention filter for confirmed incoming value.

pub mod etherscan;
pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{is_valid_address, normalize_address, Transfer};

/// One page of transfer history from an upstream source
#[derive(Debug, Clone, Default)]
pub struct HistoryPage {
    /// Raw transfers, unfiltered
    pub transfers: Vec<Transfer>,
    /// Opaque continuation token, `None` when the history is exhausted
    pub next_token: Option<String>,
}

/// Paginated access to an address's transfer history
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Source name for logs
    fn name(&self) -> &'static str;

    /// Fetch one page of history for `address`
    ///
    /// `page_token` is a token returned by a previous call, or `None` for
    /// the first page.
    async fn page(&self, address: &str, page_token: Option<&str>) -> Result<HistoryPage>;
}

/// Fetches and filters confirmed incoming transfers
#[derive(Clone)]
pub struct TransferFetcher {
    source: Arc<dyn HistorySource>,
    min_transfer_amount: u128,
    max_pages_per_address: u32,
}

impl TransferFetcher {
    pub fn new(
        source: Arc<dyn HistorySource>,
        min_transfer_amount: u128,
        max_pages_per_address: u32,
    ) -> Self {
        Self {
            source,
            min_transfer_amount,
            max_pages_per_address,
        }
    }

    /// Confirmed incoming transfers for `wallet`, at or above the minimum value
    ///
    /// `min_amount` overrides the configured minimum for this call. Zero-value
    /// transfers never pass, whatever the minimum. The wallet is validated
    /// before any page is requested.
    pub async fn fetch_incoming(
        &self,
        wallet: &str,
        min_amount: Option<u128>,
    ) -> Result<Vec<Transfer>> {
        if !is_valid_address(wallet) {
            return Err(Error::InvalidAddress(wallet.to_string()));
        }
        let wallet_norm = normalize_address(wallet);
        let min = min_amount.unwrap_or(self.min_transfer_amount);

        let mut transfers = Vec::new();
        let mut token: Option<String> = None;
        let mut pages: u32 = 0;

        loop {
            if pages >= self.max_pages_per_address {
                warn!(
                    wallet = %wallet_norm,
                    pages,
                    source = self.source.name(),
                    "Page budget exhausted, truncating history"
                );
                break;
            }
            let page = self.source.page(&wallet_norm, token.as_deref()).await?;
            pages += 1;
            transfers.extend(page.transfers);
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        transfers.retain(|t| {
            t.succeeded
                && normalize_address(&t.to) == wallet_norm
                && t.value_raw > 0
                && t.value_raw >= min
        });

        debug!(
            wallet = %wallet_norm,
            pages,
            retained = transfers.len(),
            "Fetched incoming transfers"
        );

        Ok(transfers)
    }
}
