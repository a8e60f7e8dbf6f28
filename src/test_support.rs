//! In-memory catalog source shared by the synchronizer and HTTP tests.

use crate::catalog::{CatalogSource, RawRow};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub fn row(artist: &str, title: &str) -> RawRow {
    vec![artist.to_string(), "    /    ".to_string(), title.to_string()]
}

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 11, 5, hour, 0, 0).unwrap()
}

/// Upstream stand-in with switches for failures and latency.
pub struct FakeSource {
    rows: Mutex<Vec<RawRow>>,
    modified: Mutex<DateTime<Utc>>,
    pub fail_rows: AtomicBool,
    pub fail_modified: AtomicBool,
    pub panic_modified: AtomicBool,
    rows_delay: Mutex<Option<Duration>>,
    pub row_fetches: AtomicUsize,
    pub modified_fetches: AtomicUsize,
}

impl FakeSource {
    pub fn new(rows: Vec<RawRow>, modified: DateTime<Utc>) -> Self {
        Self {
            rows: Mutex::new(rows),
            modified: Mutex::new(modified),
            fail_rows: AtomicBool::new(false),
            fail_modified: AtomicBool::new(false),
            panic_modified: AtomicBool::new(false),
            rows_delay: Mutex::new(None),
            row_fetches: AtomicUsize::new(0),
            modified_fetches: AtomicUsize::new(0),
        }
    }

    /// Replaces the upstream content and bumps its modification time.
    pub fn publish(&self, rows: Vec<RawRow>, modified: DateTime<Utc>) {
        *self.rows.lock().unwrap() = rows;
        *self.modified.lock().unwrap() = modified;
    }

    pub fn set_rows_delay(&self, delay: Option<Duration>) {
        *self.rows_delay.lock().unwrap() = delay;
    }

    pub fn row_fetch_count(&self) -> usize {
        self.row_fetches.load(Ordering::SeqCst)
    }

    pub fn modified_fetch_count(&self) -> usize {
        self.modified_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for FakeSource {
    async fn fetch_rows(&self) -> Result<Vec<RawRow>> {
        self.row_fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.rows_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_rows.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("connection reset by peer"));
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn fetch_modified_time(&self) -> Result<DateTime<Utc>> {
        self.modified_fetches.fetch_add(1, Ordering::SeqCst);
        if self.panic_modified.load(Ordering::SeqCst) {
            panic!("upstream client bug");
        }
        if self.fail_modified.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("dns error"));
        }
        Ok(*self.modified.lock().unwrap())
    }

    fn describe(&self) -> String {
        "fake source".to_string()
    }
}
