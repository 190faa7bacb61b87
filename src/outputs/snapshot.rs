//! The day-stamped snapshot cache.
//!
//! One JSON file holds `{ "date": "YYYY-MM-DD", "items": [...] }`. A snapshot
//! is only reused on the local calendar day it was written; on any other day
//! it reads as absent. Caching is an optimization, so every failure here is
//! logged and swallowed.
//!
//! # Layout
//!
//! ```text
//! cache_dir/
//! └── fastnews_daily_cache_v1.json
//! ```

use crate::models::{Collection, DailySnapshot};
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// File name of the single snapshot slot.
pub const SNAPSHOT_KEY: &str = "fastnews_daily_cache_v1.json";

/// Whole-value persistence for the collection.
pub trait SnapshotStore {
    /// Today's snapshot, or `None` when absent, stale, or unreadable.
    async fn read(&self) -> Option<Collection>;

    /// Replace the stored snapshot with `collection`, stamped with today.
    async fn write(&self, collection: &Collection);
}

/// File-backed [`SnapshotStore`].
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    path: PathBuf,
    enabled: bool,
}

impl SnapshotCache {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            path: cache_dir.as_ref().join(SNAPSHOT_KEY),
            enabled: true,
        }
    }

    /// A cache that never reads or writes anything.
    pub fn disabled() -> Self {
        Self {
            path: PathBuf::new(),
            enabled: false,
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot as of `today`.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display(), %today))]
    pub async fn read_on(&self, today: NaiveDate) -> Option<Collection> {
        if !self.enabled {
            return None;
        }

        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No snapshot on disk");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read snapshot; ignoring cache");
                return None;
            }
        };

        let snapshot: DailySnapshot = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Snapshot is corrupt; ignoring cache");
                return None;
            }
        };

        if snapshot.date != day_stamp(today) {
            info!(snapshot_date = %snapshot.date, "Snapshot is from another day; ignoring");
            return None;
        }

        debug!(count = snapshot.items.len(), "Snapshot restored");
        Some(snapshot.items)
    }

    /// Write `collection` stamped with `today`.
    ///
    /// Goes through a sibling temp file and a rename, so a crash mid-write
    /// leaves the previous snapshot intact.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display(), %today, count = collection.len()))]
    pub async fn write_on(&self, today: NaiveDate, collection: &Collection) {
        if !self.enabled {
            return;
        }

        let snapshot = DailySnapshot {
            date: day_stamp(today),
            items: collection.clone(),
        };
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize snapshot; skipping cache write");
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                warn!(error = %e, "Failed to create cache dir; skipping cache write");
                return;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        if let Err(e) = fs::write(&tmp_path, json).await {
            warn!(error = %e, "Failed to write snapshot; skipping cache write");
            return;
        }
        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            warn!(error = %e, "Failed to move snapshot into place");
            let _ = fs::remove_file(&tmp_path).await;
            return;
        }
        info!("Wrote snapshot");
    }
}

impl SnapshotStore for SnapshotCache {
    async fn read(&self) -> Option<Collection> {
        self.read_on(Local::now().date_naive()).await
    }

    async fn write(&self, collection: &Collection) {
        self.write_on(Local::now().date_naive(), collection).await
    }
}

/// `YYYY-MM-DD` for `day`.
pub fn day_stamp(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}
