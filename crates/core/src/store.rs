//! Timestamp-keyed JSON record storage
//!
//! A record directory holds one JSON file per record, named by its key in
//! decimal milliseconds:
//! ```text
//! concrete-history/
//!   1718000000000
//!   1718000004211
//!   .1718000009000.tmp   <- in-flight write, never a valid key
//! ```

use crate::error::{IoResultExt, Result, TrackError};
use crate::time::Millis;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Path of the record stored under `key`
pub fn record_path(dir: &Path, key: Millis) -> PathBuf {
    dir.join(key.to_string())
}

/// Parse a record file name back into its key
///
/// Only the canonical spelling is accepted, so `0100` is not key 100.
pub fn parse_key(name: &str) -> Option<Millis> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let key: Millis = name.parse().ok()?;
    (key.to_string() == name).then_some(key)
}

/// All record keys in `dir`, ascending. A missing directory has no keys.
pub fn list_keys(dir: &Path) -> Result<Vec<Millis>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(TrackError::io(dir, e)),
    };

    let mut keys = Vec::new();
    for entry in entries {
        let entry = entry.at(dir)?;
        match entry.file_name().to_str().and_then(parse_key) {
            Some(key) => keys.push(key),
            None => tracing::trace!("Skipping non-record entry {}", entry.path().display()),
        }
    }
    keys.sort_unstable();
    Ok(keys)
}

/// Greatest key in `dir`, if any
pub fn last_key(dir: &Path) -> Result<Option<Millis>> {
    Ok(list_keys(dir)?.pop())
}

/// Does a record exist under `key`
pub fn contains(dir: &Path, key: Millis) -> bool {
    record_path(dir, key).is_file()
}

/// Read and parse one record; `None` if it does not exist
pub fn read_record<T: DeserializeOwned>(dir: &Path, key: Millis) -> Result<Option<T>> {
    let path = record_path(dir, key);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(TrackError::io(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| TrackError::Malformed { path, source })
}

/// Every readable record in `dir`, in key order
///
/// A malformed record is skipped with a warning so one bad file does not hide
/// the rest. I/O errors still fail the listing.
pub fn read_all<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut records = Vec::new();
    for key in list_keys(dir)? {
        match read_record(dir, key) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(err @ TrackError::Malformed { .. }) => tracing::warn!("Skipping {}", err),
            Err(err) => return Err(err),
        }
    }
    Ok(records)
}

/// Write one record under `key`, creating `dir` as needed
///
/// The record is written to a dot-prefixed temp file in the same directory
/// and renamed into place, so readers never observe a partial record.
pub fn write_record<T: Serialize>(dir: &Path, key: Millis, record: &T) -> Result<PathBuf> {
    let target = record_path(dir, key);
    let data = serde_json::to_vec(record).map_err(|source| TrackError::Malformed {
        path: target.clone(),
        source,
    })?;

    fs::create_dir_all(dir).at(dir)?;
    atomic_write(dir, &target, &data)?;
    Ok(target)
}

/// Atomic write helper: temp file in `dir`, fsync, rename over `target`
pub fn atomic_write(dir: &Path, target: &Path, data: &[u8]) -> Result<()> {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = dir.join(format!(".{}.{}.tmp", name, std::process::id()));

    let write = || -> io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
        Ok(())
    };
    if let Err(e) = write() {
        let _ = fs::remove_file(&tmp);
        return Err(TrackError::io(tmp, e));
    }

    fs::rename(&tmp, target).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        TrackError::io(target, e)
    })
}
