//! Catalog Synchronization Module
//!
//! Keeps the served catalog in step with upstream without ever exposing a
//! half-built index.
//!
//! ## Core Concepts
//! - **Snapshot**: A catalog, its index and the upstream modification time, published together.
//! - **Reconciliation**: Ask upstream for its modification time; only when it moved past the
//!   published snapshot are the rows fetched and a new snapshot built.
//! - **Copy-then-swap**: Builds happen on a private copy. Publishing is a single pointer
//!   replacement, so readers see either the old snapshot or the new one in full.
//! - **Single writer**: Timer ticks and on-demand refreshes are serialized.

pub mod snapshot;
pub mod synchronizer;

pub use snapshot::Snapshot;
pub use synchronizer::{CatalogSynchronizer, RefreshOutcome, SyncOptions, SyncState};

#[cfg(test)]
mod tests;
