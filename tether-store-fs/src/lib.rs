#![deny(missing_docs)]
//! Filesystem-backed implementation of tether's RecordStore trait.
//!
//! Each `/`-separated key segment becomes a directory (or, for the last
//! segment, a file) under the root. Segments are percent-encoded so any
//! key maps to a safe filename. Writes are fsynced, renamed into place,
//! and the rename is fsynced through the parent directory, so a record is
//! either absent or complete after a crash.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tether_types::error::StoreError;
use tether_types::store::RecordStore;
use tokio::io::AsyncWriteExt;

/// Suffix of in-flight writes. `~` is always percent-encoded in segments,
/// so no real key can end up with this name.
const TEMP_SUFFIX: &str = ".~tmp";

/// Filesystem-backed record store.
///
/// Directory layout for the key `sessions/abc/events/0.json`:
/// ```text
/// root/
///   sessions/
///     abc/
///       events/
///         0.json
/// ```
///
/// Suitable for development, single-machine deployments, and cases
/// where the log must survive process restarts without a database.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a new filesystem store rooted at the given directory.
    ///
    /// The directory is created lazily on first write.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// The directory this store writes under.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Encode one key segment into a safe filename.
fn encode_segment(segment: &str) -> String {
    let mut encoded = String::new();
    for ch in segment.chars() {
        match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => encoded.push(ch),
            _ => {
                let mut buf = [0u8; 4];
                for byte in ch.encode_utf8(&mut buf).as_bytes() {
                    encoded.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }
    encoded
}

/// Decode a filename back to a key segment.
fn decode_segment(filename: &str) -> Option<String> {
    let mut result = Vec::new();
    let bytes = filename.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok()?;
            let byte = u8::from_str_radix(hex, 16).ok()?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(result).ok()
}

/// Map `key` to a path under `root`, rejecting segments that would escape
/// it or collapse onto a parent.
fn key_to_path(root: &Path, key: &str) -> Result<PathBuf, StoreError> {
    let mut path = root.to_path_buf();
    for segment in key.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(StoreError::InvalidKey {
                key: key.to_owned(),
                reason: format!("segment {segment:?} is not allowed"),
            });
        }
        path.push(encode_segment(segment));
    }
    Ok(path)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

/// Persist a rename by fsyncing the directory entry that holds it.
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> io::Result<()> {
    tokio::fs::File::open(dir).await?.sync_all().await
}

/// Directories cannot be opened for syncing here; rename durability is
/// left to the filesystem.
#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

fn write_failed(key: &str, e: io::Error) -> StoreError {
    StoreError::WriteFailed {
        key: key.to_owned(),
        message: e.to_string(),
    }
}

fn list_failed(prefix: &str, e: io::Error) -> StoreError {
    StoreError::ListFailed {
        prefix: prefix.to_owned(),
        message: e.to_string(),
    }
}

#[async_trait]
impl RecordStore for FsStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = key_to_path(&self.root, key)?;
        match tokio::fs::read(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::ReadFailed {
                key: key.to_owned(),
                message: e.to_string(),
            }),
        }
    }

    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let path = key_to_path(&self.root, key)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| write_failed(key, e))?;
        }

        let tmp = temp_path(&path);
        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| write_failed(key, e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| write_failed(key, e))?;
        file.sync_all().await.map_err(|e| write_failed(key, e))?;
        drop(file);

        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| write_failed(key, e))?;
        if let Some(dir) = path.parent() {
            sync_dir(dir).await.map_err(|e| write_failed(key, e))?;
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        // Start from the deepest directory the prefix names in full.
        let (base, base_key) = match prefix.rsplit_once('/') {
            Some((dir, _)) => (key_to_path(&self.root, dir)?, format!("{dir}/")),
            None => (self.root.clone(), String::new()),
        };

        let mut keys = Vec::new();
        let mut pending = vec![(base, base_key)];
        while let Some((dir, dir_key)) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(list_failed(prefix, e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| list_failed(prefix, e))?
            {
                let raw = entry.file_name();
                let Some(name) = raw.to_str() else {
                    tracing::warn!(path = ?entry.path(), "skipping non-utf8 entry");
                    continue;
                };
                if name.contains('~') {
                    continue;
                }
                let Some(segment) = decode_segment(name) else {
                    tracing::warn!(path = ?entry.path(), "skipping undecodable entry");
                    continue;
                };

                let key = format!("{dir_key}{segment}");
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| list_failed(prefix, e))?;
                if file_type.is_dir() {
                    let nested = format!("{key}/");
                    if nested.starts_with(prefix) || prefix.starts_with(&nested) {
                        pending.push((entry.path(), nested));
                    }
                } else if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }
}
