//! Music Catalog Search Service Library
//!
//! Serves prefix search over a small artist/title catalog held in memory and kept
//! in sync with a remote spreadsheet. The binary (`main.rs`) wires these modules
//! into an HTTP service.
//!
//! ## Modules
//! - **`catalog`**: Record model, row normalization and the upstream `CatalogSource`s.
//! - **`search`**: Tokenizer and the prefix trie index.
//! - **`sync`**: Snapshots and the `CatalogSynchronizer` polling loop that publishes them.
//! - **`api`**: The query façade and the path-routed JSON HTTP surface.
//! - **`config`**: Environment and command-line configuration.

pub mod api;
pub mod catalog;
pub mod config;
pub mod search;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;
