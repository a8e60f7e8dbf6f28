//! Service Configuration
//!
//! Settings come from environment variables with sensible defaults; `--bind` and
//! `--catalog` on the command line are parsed first and take precedence over the
//! corresponding variables.

use crate::api::service::DEFAULT_LIMIT;
use crate::catalog::ExclusionFilter;
use crate::catalog::source::{
    CatalogSource, DEFAULT_SHEET_RANGE, FileSource, SheetsConfig, SheetsSource,
};
use crate::sync::SyncOptions;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8081";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Where the catalog is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    Sheets(SheetsConfig),
    File(PathBuf),
}

impl SourceConfig {
    pub fn build(&self) -> Arc<dyn CatalogSource> {
        match self {
            SourceConfig::Sheets(config) => Arc::new(SheetsSource::new(config.clone())),
            SourceConfig::File(path) => Arc::new(FileSource::new(path.clone())),
        }
    }
}

/// Command-line overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub bind_addr: Option<SocketAddr>,
    pub catalog: Option<PathBuf>,
}

impl CliArgs {
    /// Parses `--bind <addr:port>` and `--catalog <path>`; unknown arguments are skipped.
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut parsed = Self::default();
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--bind" => {
                    let value = args.get(i + 1).context("--bind requires <addr:port>")?;
                    let addr: SocketAddr = value
                        .parse()
                        .with_context(|| format!("Invalid --bind address: {}", value))?;
                    parsed.bind_addr = Some(addr);
                    i += 2;
                }
                "--catalog" => {
                    let value = args.get(i + 1).context("--catalog requires <path>")?;
                    parsed.catalog = Some(PathBuf::from(value));
                    i += 2;
                }
                other => {
                    tracing::warn!("Ignoring unknown argument {}", other);
                    i += 1;
                }
            }
        }
        Ok(parsed)
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    /// `0` disables truncation of search results.
    pub default_limit: usize,
    pub blocklist: ExclusionFilter,
    pub source: SourceConfig,
}

impl ServiceConfig {
    pub fn from_env(args: &CliArgs) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), args)
    }

    /// Builds the configuration from an arbitrary key lookup, with `args` taking
    /// precedence over the looked-up values.
    pub fn from_lookup<F>(lookup: F, args: &CliArgs) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let default_addr: SocketAddr = DEFAULT_BIND_ADDR.parse()?;
        let bind_addr: SocketAddr = match args.bind_addr {
            Some(addr) => addr,
            None => parse_or(get("BIND_ADDR"), "BIND_ADDR", default_addr)?,
        };
        let poll_secs: u64 = parse_or(
            get("POLL_INTERVAL_SECS"),
            "POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL_SECS,
        )?;
        let timeout_secs: u64 = parse_or(
            get("FETCH_TIMEOUT_SECS"),
            "FETCH_TIMEOUT_SECS",
            DEFAULT_FETCH_TIMEOUT_SECS,
        )?;
        let default_limit: usize = parse_or(get("DEFAULT_LIMIT"), "DEFAULT_LIMIT", DEFAULT_LIMIT)?;

        if poll_secs == 0 {
            anyhow::bail!("POLL_INTERVAL_SECS must be greater than zero");
        }
        if timeout_secs == 0 {
            anyhow::bail!("FETCH_TIMEOUT_SECS must be greater than zero");
        }

        let blocklist = get("CATALOG_BLOCKLIST")
            .map(|list| ExclusionFilter::from_csv(&list))
            .unwrap_or_default();

        let catalog_path = args
            .catalog
            .clone()
            .or_else(|| get("CATALOG_PATH").map(PathBuf::from));
        let source = match catalog_path {
            Some(path) => SourceConfig::File(path),
            None => {
                let sheet_id = get("SHEET_ID")
                    .context("Either CATALOG_PATH or SHEET_ID must be set")?;
                let api_key = get("SHEETS_API_KEY").context("SHEETS_API_KEY must be set")?;
                let mut sheets = SheetsConfig::new(&sheet_id, &api_key);
                sheets.range =
                    get("SHEET_RANGE").unwrap_or_else(|| DEFAULT_SHEET_RANGE.to_string());
                SourceConfig::Sheets(sheets)
            }
        };

        Ok(Self {
            bind_addr,
            poll_interval: Duration::from_secs(poll_secs),
            fetch_timeout: Duration::from_secs(timeout_secs),
            default_limit,
            blocklist,
            source,
        })
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            poll_interval: self.poll_interval,
            fetch_timeout: self.fetch_timeout,
            blocklist: self.blocklist.clone(),
        }
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {} {:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}
