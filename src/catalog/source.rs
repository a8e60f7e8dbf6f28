//! Catalog Sources
//!
//! The synchronizer only needs two things from upstream: the raw rows and a
//! timestamp that moves forward whenever those rows change. `CatalogSource`
//! captures that contract; `SheetsSource` talks to Google Sheets/Drive and
//! `FileSource` reads the same payload from disk for local runs.

use super::types::{ModifiedTimeResponse, RawRow, ValueRange};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DEFAULT_DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3/files";
pub const DEFAULT_SHEET_RANGE: &str = "Sheet1!A2:C";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_ATTEMPTS: usize = 3;

/// Upstream source of truth for the catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches every row of the catalog sheet.
    async fn fetch_rows(&self) -> Result<Vec<RawRow>>;

    /// Fetches the time the upstream content was last modified.
    async fn fetch_modified_time(&self) -> Result<DateTime<Utc>>;

    /// Short human readable description used in logs.
    fn describe(&self) -> String;
}

/// Connection settings for the Google Sheets backed catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsConfig {
    pub sheet_id: String,
    pub api_key: String,
    pub range: String,
    pub sheets_base_url: String,
    pub drive_base_url: String,
}

impl SheetsConfig {
    pub fn new(sheet_id: &str, api_key: &str) -> Self {
        Self {
            sheet_id: sheet_id.to_string(),
            api_key: api_key.to_string(),
            range: DEFAULT_SHEET_RANGE.to_string(),
            sheets_base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            drive_base_url: DEFAULT_DRIVE_BASE_URL.to_string(),
        }
    }

    pub fn values_url(&self) -> String {
        format!(
            "{}/{}/values/{}",
            self.sheets_base_url.trim_end_matches('/'),
            self.sheet_id,
            self.range
        )
    }

    pub fn metadata_url(&self) -> String {
        format!(
            "{}/{}",
            self.drive_base_url.trim_end_matches('/'),
            self.sheet_id
        )
    }
}

/// Reads the catalog from a Google Sheet and its modification time from Drive.
pub struct SheetsSource {
    config: SheetsConfig,
    http_client: reqwest::Client,
}

impl SheetsSource {
    pub fn new(config: SheetsConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn get_with_retry(
        &self,
        url: &str,
        query: &[(&str, &str)],
        attempts: usize,
    ) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..attempts {
            let response = self
                .http_client
                .get(url)
                .query(query)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == attempts {
                        return Err(anyhow::anyhow!(e));
                    }
                    tracing::debug!("GET {} failed (attempt {}): {}", url, attempt + 1, e);
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }
}

#[async_trait]
impl CatalogSource for SheetsSource {
    async fn fetch_rows(&self) -> Result<Vec<RawRow>> {
        let url = self.config.values_url();
        let response = self
            .get_with_retry(&url, &[("key", self.config.api_key.as_str())], REQUEST_ATTEMPTS)
            .await
            .context("Failed to request catalog rows")?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Catalog rows request failed {}",
                response.status()
            ));
        }

        let range: ValueRange = response
            .json()
            .await
            .context("Malformed catalog rows payload")?;
        Ok(range.values)
    }

    async fn fetch_modified_time(&self) -> Result<DateTime<Utc>> {
        let url = self.config.metadata_url();
        let response = self
            .get_with_retry(
                &url,
                &[
                    ("fields", "modifiedTime"),
                    ("key", self.config.api_key.as_str()),
                ],
                REQUEST_ATTEMPTS,
            )
            .await
            .context("Failed to request catalog modification time")?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Modification time request failed {}",
                response.status()
            ));
        }

        let metadata: ModifiedTimeResponse = response
            .json()
            .await
            .context("Malformed modification time payload")?;
        Ok(metadata.modified_time)
    }

    fn describe(&self) -> String {
        format!("sheet {} ({})", self.config.sheet_id, self.config.range)
    }
}

/// Reads a catalog saved in the Sheets `values` format from a local file.
///
/// The file's mtime stands in for the upstream modification time.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileSource {
    async fn fetch_rows(&self) -> Result<Vec<RawRow>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let range: ValueRange = serde_json::from_str(&text)
            .with_context(|| format!("Malformed catalog file {}", self.path.display()))?;
        Ok(range.values)
    }

    async fn fetch_modified_time(&self) -> Result<DateTime<Utc>> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .with_context(|| format!("Failed to stat {}", self.path.display()))?;
        let modified = metadata.modified()?;
        Ok(DateTime::<Utc>::from(modified))
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
