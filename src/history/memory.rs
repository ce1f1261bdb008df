//! In-memory history source for tests and offline analysis
//!
//! Mirrors the shape of a block-explorer transaction list: a transfer is
//! visible from both its sender and its recipient, and history is served in
//! fixed-size pages with offset continuation tokens.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::history::{HistoryPage, HistorySource};
use crate::types::{normalize_address, Transfer};

const DEFAULT_PAGE_SIZE: usize = 100;

/// `HistorySource` backed by a fixed in-memory transfer set
#[derive(Debug, Default)]
pub struct MemoryHistorySource {
    /// Participant address -> transfers involving it, in insertion order
    transfers: HashMap<String, Vec<Transfer>>,
    page_size: usize,
}

impl MemoryHistorySource {
    pub fn new() -> Self {
        Self {
            transfers: HashMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Source with a custom page size, for pagination tests
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            transfers: HashMap::new(),
            page_size: page_size.max(1),
        }
    }

    /// Record a transfer, visible from both participants
    pub fn insert(&mut self, transfer: Transfer) {
        let from = normalize_address(&transfer.from);
        let to = normalize_address(&transfer.to);
        if from != to && !from.is_empty() {
            self.transfers
                .entry(from)
                .or_default()
                .push(transfer.clone());
        }
        self.transfers.entry(to).or_default().push(transfer);
    }

    pub fn insert_all(&mut self, transfers: impl IntoIterator<Item = Transfer>) {
        for transfer in transfers {
            self.insert(transfer);
        }
    }
}

#[async_trait]
impl HistorySource for MemoryHistorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn page(&self, address: &str, page_token: Option<&str>) -> Result<HistoryPage> {
        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| Error::UpstreamFetch(format!("invalid page token: {:?}", token)))?,
            None => 0,
        };

        let all = self
            .transfers
            .get(&normalize_address(address))
            .map(|list| list.as_slice())
            .unwrap_or(&[]);

        let end = (offset.saturating_add(self.page_size)).min(all.len());
        let transfers = all
            .get(offset..end)
            .map(|slice| slice.to_vec())
            .unwrap_or_default();
        let next_token = if end < all.len() {
            Some(end.to_string())
        } else {
            None
        };

        Ok(HistoryPage {
            transfers,
            next_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(hash: &str, from: &str, to: &str) -> Transfer {
        Transfer {
            hash: hash.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            value_raw: 1,
            timestamp: 0,
            succeeded: true,
        }
    }

    const A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    #[tokio::test]
    async fn test_unknown_address_yields_empty_page() {
        let source = MemoryHistorySource::new();
        let page = source.page(A, None).await.unwrap();
        assert!(page.transfers.is_empty());
        assert!(page.next_token.is_none());
    }

    #[tokio::test]
    async fn test_transfer_visible_from_both_sides() {
        let mut source = MemoryHistorySource::new();
        source.insert(transfer("0x1", A, B));

        assert_eq!(source.page(A, None).await.unwrap().transfers.len(), 1);
        assert_eq!(source.page(B, None).await.unwrap().transfers.len(), 1);
    }

    #[tokio::test]
    async fn test_pagination_tokens_chain() {
        let mut source = MemoryHistorySource::with_page_size(2);
        source.insert_all((0..5).map(|i| transfer(&format!("0x{}", i), A, B)));

        let first = source.page(B, None).await.unwrap();
        assert_eq!(first.transfers.len(), 2);
        let second = source
            .page(B, first.next_token.as_deref())
            .await
            .unwrap();
        assert_eq!(second.transfers.len(), 2);
        let third = source
            .page(B, second.next_token.as_deref())
            .await
            .unwrap();
        assert_eq!(third.transfers.len(), 1);
        assert!(third.next_token.is_none());
    }

    #[tokio::test]
    async fn test_bad_token_is_rejected() {
        let source = MemoryHistorySource::new();
        let err = source.page(A, Some("not-a-number")).await.unwrap_err();
        assert!(matches!(err, Error::UpstreamFetch(_)));
    }
}
