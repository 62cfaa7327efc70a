//! The persistence seam: durable bytes addressed by path-like keys.

use crate::error::StoreError;
use async_trait::async_trait;

/// Durable key/value byte storage.
///
/// Keys are `/`-separated paths such as `sessions/abc/events/0.json`.
/// The event log writes one record per event and rehydrates by listing a
/// prefix, so the trait is deliberately minimal: read, write, list.
///
/// Implementations:
/// - `MemoryStore`: ordered map (testing, ephemeral)
/// - `FsStore`: one file per key, fsynced on write
///
/// A `write` that returns `Ok` must be durable to the degree the backend
/// can promise; the log treats the record as committed from then on.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read the bytes stored under `key`.
    /// Returns `None` if the key doesn't exist.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `bytes` under `key`. Creates or overwrites.
    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// List every key that starts with `prefix`, in no particular order.
    /// A prefix nothing was ever written under yields an empty vec.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}
