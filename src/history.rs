//! History entries in the blob store (`history/<timestamp>`).

use std::io;
use std::path::Path;

use keyvc_core::model::HistoryEntry;

use crate::error::{Result, VcError};
use crate::layout::{HISTORY_DIR, history_path};
use crate::store::BlobStore;

/// Write a new entry. Entries are never overwritten.
///
/// # Errors
/// An I/O error, including `AlreadyExists` if an entry with the same
/// timestamp was already recorded.
pub fn write_entry<S: BlobStore>(store: &S, entry: &HistoryEntry) -> Result<()> {
    let path = history_path(entry.timestamp);
    store
        .create_new(&path, entry.render().as_bytes())
        .map_err(|e| VcError::io(&path, e))
}

/// Timestamps of all recorded entries, oldest first.
///
/// # Errors
/// I/O errors listing the history directory.
pub fn list_timestamps<S: BlobStore>(store: &S) -> Result<Vec<u64>> {
    let dir = Path::new(HISTORY_DIR);
    let entries = match store.list(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(VcError::io(dir, e)),
    };
    let mut timestamps: Vec<u64> = entries
        .into_iter()
        .filter(|entry| !entry.is_dir)
        .filter_map(|entry| match entry.name.parse() {
            Ok(ts) => Some(ts),
            Err(_) => {
                if !entry.name.starts_with('.') {
                    tracing::warn!(name = %entry.name, "ignoring stray file in history");
                }
                None
            }
        })
        .collect();
    timestamps.sort_unstable();
    Ok(timestamps)
}

/// Timestamp of the most recent entry.
///
/// # Errors
/// Same as [`list_timestamps`].
pub fn latest_timestamp<S: BlobStore>(store: &S) -> Result<Option<u64>> {
    Ok(list_timestamps(store)?.last().copied())
}

/// Read one entry.
///
/// # Errors
/// An I/O error, or [`VcError::History`] if the entry is malformed.
pub fn read_entry<S: BlobStore>(store: &S, timestamp: u64) -> Result<HistoryEntry> {
    let path = history_path(timestamp);
    let bytes = store.read(&path).map_err(|e| VcError::io(&path, e))?;
    let text = String::from_utf8_lossy(&bytes);
    HistoryEntry::parse(timestamp, &text).map_err(|source| VcError::History {
        timestamp: timestamp.to_string(),
        source,
    })
}

/// All entries, oldest first.
///
/// # Errors
/// Same as [`read_entry`].
pub fn list_entries<S: BlobStore>(store: &S) -> Result<Vec<HistoryEntry>> {
    list_timestamps(store)?
        .into_iter()
        .map(|ts| read_entry(store, ts))
        .collect()
}
