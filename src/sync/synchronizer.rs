//! Catalog Synchronizer
//!
//! Owns the currently published `Snapshot` and the polling loop that replaces it.
//!
//! ## Responsibilities
//! - **Reconciliation**: modification time first, rows only when upstream moved forward.
//! - **Off-path builds**: normalization and indexing run on the blocking pool.
//! - **Publication**: the new snapshot replaces the old one under a short write lock.
//! - **Containment**: fetch and build failures are logged and reported, never propagated
//!   to readers; the previous snapshot stays in place.

use super::snapshot::Snapshot;
use crate::catalog::{CatalogSource, ExclusionFilter};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Tuning knobs for the synchronizer.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Time between two reconciliations of the polling loop.
    pub poll_interval: Duration,
    /// Upper bound on each upstream call.
    pub fetch_timeout: Duration,
    /// Rows matching this block-list never reach the catalog.
    pub blocklist: ExclusionFilter,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            blocklist: ExclusionFilter::default(),
        }
    }
}

/// Lifecycle of the synchronizer as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No snapshot has been published yet.
    Uninitialized,
    /// A snapshot is published and no rebuild is running.
    Ready,
    /// A rebuild is in progress; the previous snapshot (if any) is still served.
    Refreshing,
}

/// Result of one reconciliation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot was published.
    Fetched {
        entries: usize,
        last_modified: DateTime<Utc>,
    },
    /// Upstream has not changed since the published snapshot.
    NotModified { since: DateTime<Utc> },
    /// The attempt was abandoned; whatever was published before is still served.
    Failed { reason: String },
}

impl fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshOutcome::Fetched {
                entries,
                last_modified,
            } => write!(
                f,
                "Fetched latest updates; {} entries. Last modified at {}.",
                entries,
                format_time(last_modified)
            ),
            RefreshOutcome::NotModified { since } => {
                write!(f, "Not modified since {}.", format_time(since))
            }
            RefreshOutcome::Failed { reason } => write!(f, "Update failed: {}.", reason),
        }
    }
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Holds the `refreshing` flag up for as long as it lives, including on unwind.
struct RefreshingFlag<'a>(&'a AtomicBool);

impl<'a> RefreshingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for RefreshingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Single writer of the published catalog snapshot.
pub struct CatalogSynchronizer {
    source: Arc<dyn CatalogSource>,
    current: RwLock<Option<Arc<Snapshot>>>,
    /// Serializes reconciliations (timer and on-demand).
    refresh_lock: Mutex<()>,
    refreshing: AtomicBool,
    options: SyncOptions,
}

impl CatalogSynchronizer {
    pub fn new(source: Arc<dyn CatalogSource>, options: SyncOptions) -> Arc<Self> {
        Arc::new(Self {
            source,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            refreshing: AtomicBool::new(false),
            options,
        })
    }

    /// The currently published snapshot, or `None` before the first successful build.
    pub async fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.current.read().await.clone()
    }

    pub async fn state(&self) -> SyncState {
        if self.refreshing.load(Ordering::Acquire) {
            return SyncState::Refreshing;
        }
        match self.current.read().await.as_ref() {
            Some(_) => SyncState::Ready,
            None => SyncState::Uninitialized,
        }
    }

    /// Runs one reconciliation and reports what happened.
    ///
    /// Failures are turned into `RefreshOutcome::Failed`; nothing is propagated.
    pub async fn refresh(&self) -> RefreshOutcome {
        let outcome = match self.reconcile().await {
            Ok(outcome) => outcome,
            Err(e) => RefreshOutcome::Failed {
                reason: format!("{:#}", e),
            },
        };

        match &outcome {
            RefreshOutcome::Failed { .. } => tracing::warn!("{}", outcome),
            _ => tracing::info!("{}", outcome),
        }

        outcome
    }

    async fn reconcile(&self) -> Result<RefreshOutcome> {
        let _guard = self.refresh_lock.lock().await;

        let modified = self
            .with_timeout("modification time fetch", self.source.fetch_modified_time())
            .await?;

        if let Some(current) = self.snapshot().await
            && modified <= current.last_modified()
        {
            return Ok(RefreshOutcome::NotModified {
                since: current.last_modified(),
            });
        }

        let snapshot = {
            let _refreshing = RefreshingFlag::raise(&self.refreshing);
            self.rebuild(modified).await?
        };
        let entries = snapshot.catalog().len();
        self.publish(snapshot).await;

        Ok(RefreshOutcome::Fetched {
            entries,
            last_modified: modified,
        })
    }

    /// Fetches rows and builds a snapshot without touching the published one.
    async fn rebuild(&self, modified: DateTime<Utc>) -> Result<Arc<Snapshot>> {
        let rows = self
            .with_timeout("catalog rows fetch", self.source.fetch_rows())
            .await?;
        tracing::debug!("Fetched {} raw rows from {}", rows.len(), self.source.describe());

        let filter = self.options.blocklist.clone();
        let snapshot = tokio::task::spawn_blocking(move || Snapshot::build(rows, modified, &filter))
            .await
            .context("Index build task failed")?;

        Ok(Arc::new(snapshot))
    }

    async fn publish(&self, snapshot: Arc<Snapshot>) {
        let mut current = self.current.write().await;
        *current = Some(snapshot);
    }

    async fn with_timeout<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.options.fetch_timeout, fut).await {
            Ok(result) => result.with_context(|| format!("{} failed", what)),
            Err(_) => Err(anyhow::anyhow!(
                "{} timed out after {:?}",
                what,
                self.options.fetch_timeout
            )),
        }
    }

    /// Spawns the polling loop. The first tick fires immediately and performs
    /// the startup load; the loop ends once `shutdown` flips to `true`. A tick
    /// that panics is treated as a failed attempt and retried on the next one.
    pub fn spawn_polling(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                "Polling {} every {:?}",
                self.source.describe(),
                self.options.poll_interval
            );

            let mut interval = tokio::time::interval(self.options.poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        // Each tick runs in its own task so a panicking source
                        // only abandons this attempt.
                        let sync = self.clone();
                        if let Err(e) = tokio::spawn(async move { sync.refresh().await }).await {
                            tracing::warn!("Update failed: reconciliation task aborted: {}.", e);
                        }
                    }
                }
            }

            tracing::info!("Catalog polling stopped");
        })
    }
}
