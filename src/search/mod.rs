//! Search Module
//!
//! Prefix search over the artist and title fields of the catalog.
//!
//! ## Overview
//! Every field value is split into alphanumeric tokens which are stored, lowercased,
//! in a character trie. A query is tokenized the same way; each query token matches
//! every indexed token it is a prefix of, and the per-token matches are merged by a
//! `Reducer` (union by default, so `"daft kiss"` finds both Daft Punk and "One Kiss").
//!
//! ## Submodules
//! - **`tokenizer`**: Splits text on non-alphanumeric boundaries.
//! - **`trie`**: The `SearchIndex` itself, its field selection and reducers.
//! - **`types`**: Response bodies shared with the HTTP layer.

pub mod tokenizer;
pub mod trie;
pub mod types;

pub use trie::{IndexField, Reducer, SearchIndex};
pub use types::{SearchResults, TotalResponse};
