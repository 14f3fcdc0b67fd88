//! services/api/src/adapters/prefs_file.rs
//!
//! This module contains the device-local preferences adapter. It implements the
//! `PreferencesStore` port by keeping the last-read marker in a small JSON file.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quran_study_core::domain::LastReadMarker;
use quran_study_core::ports::{PortError, PortResult, PreferencesStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Storage key of the marker; also the file stem.
pub const LAST_READ_KEY: &str = "quran_last_read";

/// Stores preferences as JSON files under one directory.
#[derive(Clone, Debug)]
pub struct JsonFilePreferences {
    dir: PathBuf,
}

impl JsonFilePreferences {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn last_read_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", LAST_READ_KEY))
    }
}

/// On-disk shape of the marker. The timestamp is kept in epoch milliseconds.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LastReadRecord {
    surah_number: u32,
    surah_name: String,
    timestamp: i64,
}
impl LastReadRecord {
    fn from_domain(marker: &LastReadMarker) -> Self {
        Self {
            surah_number: marker.chapter_id,
            surah_name: marker.chapter_name.clone(),
            timestamp: marker.timestamp.timestamp_millis(),
        }
    }

    fn to_domain(self) -> PortResult<LastReadMarker> {
        let timestamp = DateTime::<Utc>::from_timestamp_millis(self.timestamp)
            .ok_or_else(|| PortError::Malformed(format!("timestamp {} out of range", self.timestamp)))?;
        Ok(LastReadMarker {
            chapter_id: self.surah_number,
            chapter_name: self.surah_name,
            timestamp,
        })
    }
}

fn io_error(path: &Path, e: std::io::Error) -> PortError {
    PortError::Unexpected(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl PreferencesStore for JsonFilePreferences {
    async fn load_last_read(&self) -> PortResult<Option<LastReadMarker>> {
        let path = self.last_read_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };

        match serde_json::from_slice::<LastReadRecord>(&bytes) {
            Ok(record) => record.to_domain().map(Some),
            Err(e) => {
                // A corrupt file reads as "no marker" rather than blocking startup.
                warn!("Ignoring unreadable {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    async fn save_last_read(&self, marker: &LastReadMarker) -> PortResult<()> {
        let path = self.last_read_path();
        let body = serde_json::to_vec(&LastReadRecord::from_domain(marker))
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        // Write-then-rename so a reader never sees a half-written marker.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(&path, e))?;

        debug!("Saved last-read marker for chapter {}", marker.chapter_id);
        Ok(())
    }
}
