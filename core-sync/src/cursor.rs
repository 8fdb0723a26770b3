//! # Sync Cursor Store
//!
//! Persists the high-water mark of the last successfully processed audit's
//! modification time. The cursor is a single RFC 3339 UTC timestamp,
//! monotonically non-decreasing across a run, updated exactly once per
//! fully-processed audit.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Result, SyncError};

/// Cursor value used when nothing has ever been persisted: the beginning of
/// time as far as discovery is concerned.
pub fn epoch_default() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()
}

/// Persistence seam for the incremental-sync cursor.
///
/// A single orchestrator owns the store; no concurrent writers.
pub trait CursorStore: Send + Sync {
    /// Read the persisted cursor, or the epoch default if none exists.
    /// First read persists the default so subsequent reads are idempotent.
    fn read(&self) -> Result<DateTime<Utc>>;

    /// Overwrite the stored value. Readers never observe a half-written
    /// value.
    fn write(&self, timestamp: DateTime<Utc>) -> Result<()>;
}

/// File-backed cursor store: one timestamp on one line.
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn render(timestamp: DateTime<Utc>) -> String {
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl CursorStore for FileCursorStore {
    fn read(&self) -> Result<DateTime<Utc>> {
        if self.path.is_file() {
            let contents = fs::read_to_string(&self.path)?;
            let line = contents.lines().next().unwrap_or("").trim();
            line.parse::<DateTime<Utc>>()
                .map_err(|e| SyncError::InvalidCursor(format!("{}: {}", line, e)))
        } else {
            let default = epoch_default();
            self.write(default)?;
            info!(
                cursor = %Self::render(default),
                "No sync cursor found, starting from the beginning of time"
            );
            Ok(default)
        }
    }

    fn write(&self, timestamp: DateTime<Utc>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write-then-rename so a reader never sees a torn value.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, Self::render(timestamp))?;
        fs::rename(&tmp, &self.path)?;

        debug!(cursor = %Self::render(timestamp), "Cursor advanced");
        Ok(())
    }
}

/// In-memory cursor store for tests and dry runs.
pub struct MemoryCursorStore {
    value: Mutex<DateTime<Utc>>,
}

impl MemoryCursorStore {
    pub fn new(initial: DateTime<Utc>) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }
}

impl Default for MemoryCursorStore {
    fn default() -> Self {
        Self::new(epoch_default())
    }
}

impl CursorStore for MemoryCursorStore {
    fn read(&self) -> Result<DateTime<Utc>> {
        Ok(*self.value.lock().unwrap())
    }

    fn write(&self, timestamp: DateTime<Utc>) -> Result<()> {
        *self.value.lock().unwrap() = timestamp;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_read_persists_epoch_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_successful").join("cursor.txt");
        let store = FileCursorStore::new(&path);

        let first = store.read().unwrap();
        assert_eq!(first, epoch_default());
        assert!(path.is_file(), "default must be persisted on first read");

        let second = store.read().unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCursorStore::new(dir.path().join("cursor.txt"));

        let timestamp = "2024-01-05T10:00:00.123Z".parse().unwrap();
        store.write(timestamp).unwrap();

        assert_eq!(store.read().unwrap(), timestamp);
    }

    #[test]
    fn test_write_replaces_whole_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor.txt");
        let store = FileCursorStore::new(&path);

        store.write("2024-01-05T10:00:00.000Z".parse().unwrap()).unwrap();
        store.write("2024-02-01T00:00:00.000Z".parse().unwrap()).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "2024-02-01T00:00:00.000Z");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_garbage_cursor_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor.txt");
        fs::write(&path, "not a timestamp").unwrap();

        let store = FileCursorStore::new(&path);
        assert!(matches!(
            store.read(),
            Err(SyncError::InvalidCursor(_))
        ));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryCursorStore::default();
        assert_eq!(store.read().unwrap(), epoch_default());

        let timestamp = "2024-03-01T12:00:00.000Z".parse().unwrap();
        store.write(timestamp).unwrap();
        assert_eq!(store.read().unwrap(), timestamp);
    }
}
