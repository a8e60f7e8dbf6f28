use crate::catalog::{Catalog, ExclusionFilter, RawRow, Record};
use crate::search::SearchIndex;

use chrono::{DateTime, Utc};
use std::time::Instant;

/// A catalog together with the index built from it.
///
/// Never mutated after construction; replaced wholesale on refresh.
#[derive(Debug)]
pub struct Snapshot {
    catalog: Catalog,
    index: SearchIndex,
    last_modified: DateTime<Utc>,
}

impl Snapshot {
    /// Normalizes `rows` and indexes the resulting catalog.
    pub fn build(rows: Vec<RawRow>, last_modified: DateTime<Utc>, filter: &ExclusionFilter) -> Self {
        let start = Instant::now();
        let catalog = Catalog::from_rows(rows, filter);
        let index = SearchIndex::build(&catalog);

        tracing::info!(
            "Added {} items ({} tokens) to search trie in {:.1} ms.",
            catalog.len(),
            index.token_count(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Self {
            catalog,
            index,
            last_modified,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Records matching `query`, in catalog order.
    pub fn search(&self, query: &str) -> Vec<&Record> {
        self.index
            .query(query)
            .into_iter()
            .filter_map(|id| self.catalog.get(id))
            .collect()
    }
}
