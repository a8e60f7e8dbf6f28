use crate::catalog::Record;
use serde::{Deserialize, Serialize};

/// Body of the `search` route.
///
/// `total` counts every match; `items` may be cut short by the limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub items: Vec<Record>,
    pub total: usize,
}

/// Body of the `total` route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalResponse {
    pub total: usize,
}
