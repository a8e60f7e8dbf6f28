//! Synchronization Module Tests
//!
//! Drives the synchronizer against an in-memory upstream.
//!
//! ## Test Scopes
//! - **Reconciliation**: Rebuild only when upstream moved forward, status lines.
//! - **Failure containment**: Failed or timed out fetches keep the published snapshot.
//! - **Atomicity**: Readers always see a complete catalog/index pair.
//! - **Polling loop**: Startup load and shutdown.

#[cfg(test)]
mod tests {
    use crate::catalog::ExclusionFilter;
    use crate::sync::snapshot::Snapshot;
    use crate::sync::synchronizer::{CatalogSynchronizer, RefreshOutcome, SyncOptions, SyncState};
    use crate::test_support::{FakeSource, at, row};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::sync::watch;

    fn two_songs() -> Vec<Vec<String>> {
        vec![row("Dua Lipa", "One Kiss"), row("Daft Punk", "One More Time")]
    }

    fn synchronizer(source: Arc<FakeSource>) -> Arc<CatalogSynchronizer> {
        CatalogSynchronizer::new(
            source,
            SyncOptions {
                poll_interval: Duration::from_secs(3600),
                fetch_timeout: Duration::from_secs(5),
                blocklist: ExclusionFilter::default(),
            },
        )
    }

    // ============================================================
    // SNAPSHOT TESTS
    // ============================================================

    #[test]
    fn test_snapshot_search_maps_ids_to_catalog_order() {
        let snapshot = Snapshot::build(two_songs(), at(10), &ExclusionFilter::default());

        let artists: Vec<&str> = snapshot
            .search("one")
            .iter()
            .map(|r| r.artist.as_str())
            .collect();

        assert_eq!(artists, vec!["Daft Punk", "Dua Lipa"]);
        assert_eq!(snapshot.last_modified(), at(10));
        assert_eq!(snapshot.catalog().len(), 2);
    }

    #[test]
    fn test_snapshot_applies_blocklist() {
        let filter = ExclusionFilter::new(["daft"]);
        let snapshot = Snapshot::build(two_songs(), at(10), &filter);

        assert_eq!(snapshot.catalog().len(), 1);
        assert!(snapshot.search("daft").is_empty());
    }

    // ============================================================
    // RECONCILIATION TESTS
    // ============================================================

    #[tokio::test]
    async fn test_starts_uninitialized() {
        let sync = synchronizer(Arc::new(FakeSource::new(two_songs(), at(10))));

        assert_eq!(sync.state().await, SyncState::Uninitialized);
        assert!(sync.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_first_refresh_publishes_snapshot() {
        let source = Arc::new(FakeSource::new(two_songs(), at(10)));
        let sync = synchronizer(source.clone());

        let outcome = sync.refresh().await;

        assert_eq!(
            outcome,
            RefreshOutcome::Fetched {
                entries: 2,
                last_modified: at(10)
            }
        );
        assert_eq!(sync.state().await, SyncState::Ready);
        let snapshot = sync.snapshot().await.unwrap();
        assert_eq!(snapshot.catalog().len(), 2);
        assert_eq!(snapshot.last_modified(), at(10));
    }

    #[tokio::test]
    async fn test_refresh_without_upstream_change_is_noop() {
        let source = Arc::new(FakeSource::new(two_songs(), at(10)));
        let sync = synchronizer(source.clone());
        sync.refresh().await;
        let before = sync.snapshot().await.unwrap();

        let outcome = sync.refresh().await;

        assert_eq!(outcome, RefreshOutcome::NotModified { since: at(10) });
        assert!(outcome.to_string().starts_with("Not modified since"));
        let after = sync.snapshot().await.unwrap();
        assert!(Arc::ptr_eq(&before, &after), "snapshot must not be rebuilt");
        assert_eq!(source.row_fetch_count(), 1);
        assert_eq!(source.modified_fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_older_timestamp_does_not_rebuild() {
        let source = Arc::new(FakeSource::new(two_songs(), at(10)));
        let sync = synchronizer(source.clone());
        sync.refresh().await;

        source.publish(vec![row("ABBA", "Waterloo")], at(9));
        let outcome = sync.refresh().await;

        assert_eq!(outcome, RefreshOutcome::NotModified { since: at(10) });
        assert_eq!(sync.snapshot().await.unwrap().catalog().len(), 2);
    }

    #[tokio::test]
    async fn test_newer_timestamp_replaces_snapshot() {
        let source = Arc::new(FakeSource::new(two_songs(), at(10)));
        let sync = synchronizer(source.clone());
        sync.refresh().await;
        let old = sync.snapshot().await.unwrap();

        source.publish(vec![row("ABBA", "Waterloo")], at(11));
        let outcome = sync.refresh().await;

        assert_eq!(
            outcome.to_string(),
            "Fetched latest updates; 1 entries. Last modified at 2021-11-05 11:00:00 UTC."
        );
        let new = sync.snapshot().await.unwrap();
        assert_eq!(new.catalog().len(), 1);
        assert_eq!(new.search("waterloo").len(), 1);
        assert!(new.search("daft").is_empty());

        // Readers holding the old snapshot keep a complete, consistent view.
        assert_eq!(old.catalog().len(), 2);
        assert_eq!(old.search("daft").len(), 1);
    }

    // ============================================================
    // FAILURE CONTAINMENT TESTS
    // ============================================================

    #[tokio::test]
    async fn test_failed_first_fetch_stays_uninitialized() {
        let source = Arc::new(FakeSource::new(two_songs(), at(10)));
        source.fail_modified.store(true, Ordering::SeqCst);
        let sync = synchronizer(source.clone());

        let outcome = sync.refresh().await;

        assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
        assert!(outcome.to_string().contains("dns error"));
        assert_eq!(sync.state().await, SyncState::Uninitialized);
        assert_eq!(source.row_fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_rows_fetch_keeps_previous_snapshot() {
        let source = Arc::new(FakeSource::new(two_songs(), at(10)));
        let sync = synchronizer(source.clone());
        sync.refresh().await;

        source.publish(vec![row("ABBA", "Waterloo")], at(11));
        source.fail_rows.store(true, Ordering::SeqCst);
        let outcome = sync.refresh().await;

        assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
        assert_eq!(sync.state().await, SyncState::Ready);
        let snapshot = sync.snapshot().await.unwrap();
        assert_eq!(snapshot.catalog().len(), 2);
        assert_eq!(snapshot.last_modified(), at(10));
    }

    #[tokio::test]
    async fn test_failed_rows_fetch_is_retried_next_time() {
        let source = Arc::new(FakeSource::new(two_songs(), at(10)));
        let sync = synchronizer(source.clone());
        sync.refresh().await;

        source.publish(vec![row("ABBA", "Waterloo")], at(11));
        source.fail_rows.store(true, Ordering::SeqCst);
        sync.refresh().await;
        source.fail_rows.store(false, Ordering::SeqCst);
        let outcome = sync.refresh().await;

        // The failed attempt must not have marked 11:00 as already seen.
        assert_eq!(
            outcome,
            RefreshOutcome::Fetched {
                entries: 1,
                last_modified: at(11)
            }
        );
    }

    #[tokio::test]
    async fn test_timed_out_fetch_is_a_failed_attempt() {
        let source = Arc::new(FakeSource::new(two_songs(), at(10)));
        source.set_rows_delay(Some(Duration::from_millis(500)));
        let sync = CatalogSynchronizer::new(
            source.clone(),
            SyncOptions {
                fetch_timeout: Duration::from_millis(50),
                ..SyncOptions::default()
            },
        );

        let outcome = sync.refresh().await;

        assert!(outcome.to_string().contains("timed out"));
        assert_eq!(sync.state().await, SyncState::Uninitialized);

        source.set_rows_delay(None);
        let outcome = sync.refresh().await;
        assert!(matches!(outcome, RefreshOutcome::Fetched { entries: 2, .. }));
    }

    // ============================================================
    // ATOMICITY TESTS
    // ============================================================

    #[tokio::test]
    async fn test_snapshot_served_while_rebuilding() {
        let source = Arc::new(FakeSource::new(two_songs(), at(10)));
        let sync = synchronizer(source.clone());
        sync.refresh().await;

        source.publish(vec![row("ABBA", "Waterloo")], at(11));
        source.set_rows_delay(Some(Duration::from_millis(200)));
        let refresher = {
            let sync = sync.clone();
            tokio::spawn(async move { sync.refresh().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sync.state().await, SyncState::Refreshing);
        let during = sync.snapshot().await.unwrap();
        assert_eq!(during.catalog().len(), 2);
        assert_eq!(during.search("one").len(), 2);

        refresher.await.unwrap();
        assert_eq!(sync.state().await, SyncState::Ready);
        assert_eq!(sync.snapshot().await.unwrap().catalog().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refresh_and_search_never_tear() {
        let small = vec![row("Daft Punk", "One More Time")];
        let large: Vec<Vec<String>> = (0..200)
            .map(|i| row(&format!("One Artist {}", i), &format!("One Title {}", i)))
            .collect();

        let source = Arc::new(FakeSource::new(small.clone(), at(0)));
        let sync = synchronizer(source.clone());
        sync.refresh().await;

        let writer = {
            let sync = sync.clone();
            let source = source.clone();
            tokio::spawn(async move {
                for generation in 1..=20u32 {
                    let rows = if generation % 2 == 0 {
                        small.clone()
                    } else {
                        large.clone()
                    };
                    source.publish(rows, at(generation));
                    sync.refresh().await;
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..4 {
            let sync = sync.clone();
            readers.push(tokio::spawn(async move {
                for _ in 0..200 {
                    let snapshot = sync.snapshot().await.unwrap();
                    let total = snapshot.catalog().len();
                    for id in snapshot.index().query("one") {
                        assert!(id < total, "id {} outside catalog of {}", id, total);
                    }
                    assert_eq!(snapshot.search("one").len(), total);
                    tokio::task::yield_now().await;
                }
            }));
        }

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_rebuild_once() {
        let source = Arc::new(FakeSource::new(two_songs(), at(10)));
        source.set_rows_delay(Some(Duration::from_millis(50)));
        let sync = synchronizer(source.clone());

        let (a, b) = tokio::join!(sync.refresh(), sync.refresh());

        let fetched = [&a, &b]
            .iter()
            .filter(|o| matches!(o, RefreshOutcome::Fetched { .. }))
            .count();
        assert_eq!(fetched, 1);
        assert_eq!(source.row_fetch_count(), 1);
    }

    // ============================================================
    // POLLING LOOP TESTS
    // ============================================================

    #[tokio::test]
    async fn test_polling_loads_on_start_and_stops_on_shutdown() {
        let source = Arc::new(FakeSource::new(two_songs(), at(10)));
        let sync = synchronizer(source.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = sync.clone().spawn_polling(shutdown_rx);

        for _ in 0..100 {
            if sync.snapshot().await.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sync.state().await, SyncState::Ready);

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("polling loop should stop")
            .unwrap();
        assert_eq!(source.modified_fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_polling_reconciles_on_every_tick() {
        let source = Arc::new(FakeSource::new(two_songs(), at(10)));
        let sync = CatalogSynchronizer::new(
            source.clone(),
            SyncOptions {
                poll_interval: Duration::from_millis(20),
                ..SyncOptions::default()
            },
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = sync.clone().spawn_polling(shutdown_rx);

        for _ in 0..200 {
            if source.modified_fetch_count() >= 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
        assert!(source.modified_fetch_count() >= 3);
        // Upstream never changed after the first load.
        assert_eq!(source.row_fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_polling_stops_when_sender_dropped() {
        let sync = synchronizer(Arc::new(FakeSource::new(two_songs(), at(10))));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = sync.spawn_polling(shutdown_rx);

        drop(shutdown_tx);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("polling loop should stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_polling_survives_panicking_source() {
        let source = Arc::new(FakeSource::new(two_songs(), at(10)));
        source.panic_modified.store(true, Ordering::SeqCst);
        let sync = CatalogSynchronizer::new(
            source.clone(),
            SyncOptions {
                poll_interval: Duration::from_millis(20),
                ..SyncOptions::default()
            },
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = sync.clone().spawn_polling(shutdown_rx);

        for _ in 0..200 {
            if source.modified_fetch_count() >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(source.modified_fetch_count() >= 2);
        assert!(!handle.is_finished());
        assert_eq!(sync.state().await, SyncState::Uninitialized);

        source.panic_modified.store(false, Ordering::SeqCst);
        for _ in 0..200 {
            if sync.snapshot().await.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sync.state().await, SyncState::Ready);

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("polling loop should stop")
            .unwrap();
    }
}
