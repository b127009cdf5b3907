// src/watermark.rs
//! File-backed watermark: the creation time of the newest delivered post.
//!
//! The record is a single ISO-8601 UTC timestamp. Older state files carried a
//! second, human-readable line; only the first line is ever parsed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use tokio::fs;

pub const DEFAULT_STATE_PATH: &str = "last_post_info.txt";

/// "Never synced": everything fetched counts as new.
pub fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

#[async_trait::async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Never fails: missing or malformed state yields [`epoch`].
    async fn load(&self) -> DateTime<Utc>;
    async fn save(&self, ts: DateTime<Utc>) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileWatermarkStore {
    path: PathBuf,
}

impl FileWatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl WatermarkStore for FileWatermarkStore {
    async fn load(&self) -> DateTime<Utc> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(target: "watermark", path = %self.path.display(), "no saved state, starting from epoch");
                return epoch();
            }
            Err(e) => {
                tracing::warn!(target: "watermark", path = %self.path.display(), error = %e, "state unreadable, starting from epoch");
                return epoch();
            }
        };

        match parse_watermark(&raw) {
            Some(ts) => {
                tracing::info!(target: "watermark", %ts, "last seen post was from");
                ts
            }
            None => {
                tracing::warn!(
                    target: "watermark",
                    path = %self.path.display(),
                    first_line = raw.lines().next().unwrap_or_default(),
                    "malformed state, starting from epoch"
                );
                epoch()
            }
        }
    }

    async fn save(&self, ts: DateTime<Utc>) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating state dir {}", dir.display()))?;
        }

        // write-then-rename: readers see the old record or the new one, never half of it
        let tmp = self.tmp_path();
        fs::write(&tmp, format_watermark(ts))
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;

        tracing::info!(target: "watermark", ts = %ts.format("%Y-%m-%d %H:%M:%S"), "saved newest seen post timestamp");
        Ok(())
    }
}

pub fn format_watermark(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse the first line of a state record. Naive timestamps are taken as UTC.
pub fn parse_watermark(raw: &str) -> Option<DateTime<Utc>> {
    let line = raw.lines().next()?.trim();
    if line.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(line) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(line, fmt).ok())
        .map(|naive| naive.and_utc())
}
