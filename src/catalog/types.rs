use super::normalize::{ExclusionFilter, normalize_rows};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One upstream row: `[artist, separator, title]`. Short rows mean missing cells.
pub type RawRow = Vec<String>;

/// A single catalog entry.
///
/// `id` is the record's position in the sorted catalog, so ascending ids
/// follow artist/title order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: usize,
    pub artist: String,
    pub title: String,
}

/// An immutable, sorted sequence of records.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<Record>,
}

impl Catalog {
    /// Cleans, filters and sorts raw rows into a catalog.
    pub fn from_rows(rows: Vec<RawRow>, filter: &ExclusionFilter) -> Self {
        Self {
            records: normalize_rows(rows, filter),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, id: usize) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Body of the Sheets `values` endpoint (and of a local catalog file).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub values: Vec<RawRow>,
}

/// Body of the Drive `files/{id}?fields=modifiedTime` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedTimeResponse {
    pub modified_time: DateTime<Utc>,
}
