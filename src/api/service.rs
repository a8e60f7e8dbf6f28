//! Query Service
//!
//! Translates API calls into lookups on a single published snapshot. Every
//! operation takes one `Arc<Snapshot>` up front, so a refresh landing mid-request
//! cannot mix an old catalog with a new index.

use crate::catalog::Record;
use crate::search::{SearchResults, TotalResponse};
use crate::sync::CatalogSynchronizer;

use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_LIMIT: usize = 50;

#[derive(Clone)]
pub struct QueryService {
    synchronizer: Arc<CatalogSynchronizer>,
    /// Applied when a request has no usable limit; `0` disables truncation.
    default_limit: usize,
}

impl QueryService {
    pub fn new(synchronizer: Arc<CatalogSynchronizer>, default_limit: usize) -> Self {
        Self {
            synchronizer,
            default_limit,
        }
    }

    /// Maximum number of items to return, `None` meaning unlimited.
    ///
    /// An absent or zero requested limit falls back to the default limit.
    pub fn effective_limit(&self, requested: Option<usize>) -> Option<usize> {
        match requested.filter(|limit| *limit > 0) {
            Some(limit) => Some(limit),
            None if self.default_limit > 0 => Some(self.default_limit),
            None => None,
        }
    }

    pub async fn search(&self, query: &str, limit: Option<usize>) -> SearchResults {
        let start = Instant::now();
        let Some(snapshot) = self.synchronizer.snapshot().await else {
            tracing::debug!("Search before first catalog load; returning no results");
            return SearchResults::default();
        };

        let matches = snapshot.search(query);
        let total = matches.len();
        let take = self.effective_limit(limit).unwrap_or(total);
        let items: Vec<Record> = matches.into_iter().take(take).cloned().collect();

        tracing::info!(
            "Returned {} results in {:.1} ms.",
            items.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        SearchResults { items, total }
    }

    pub async fn total(&self) -> TotalResponse {
        let total = self
            .synchronizer
            .snapshot()
            .await
            .map(|snapshot| snapshot.catalog().len())
            .unwrap_or(0);
        TotalResponse { total }
    }

    pub async fn browse(&self) -> Vec<Record> {
        match self.synchronizer.snapshot().await {
            Some(snapshot) => snapshot.catalog().records().to_vec(),
            None => Vec::new(),
        }
    }

    /// Runs a reconciliation now and returns its status line.
    pub async fn refresh(&self) -> String {
        self.synchronizer.refresh().await.to_string()
    }
}
