//! FlakyStore: a RecordStore wrapper with switchable failures.

use crate::error::StoreError;
use crate::store::RecordStore;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Delegates to an inner store until told to fail.
///
/// `fail_next_writes(n)` makes the next `n` writes return
/// [`StoreError::WriteFailed`] without touching the inner store.
/// `set_unreachable(true)` makes every read and list fail.
pub struct FlakyStore {
    inner: Arc<dyn RecordStore>,
    failing_writes: AtomicUsize,
    unreachable: AtomicBool,
}

impl FlakyStore {
    /// Wrap `inner`. Starts out healthy.
    pub fn new(inner: Arc<dyn RecordStore>) -> Self {
        Self {
            inner,
            failing_writes: AtomicUsize::new(0),
            unreachable: AtomicBool::new(false),
        }
    }

    /// Fail the next `n` writes.
    pub fn fail_next_writes(&self, n: usize) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    /// Toggle read/list failures.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::ReadFailed {
                key: key.to_owned(),
                message: "store unreachable".into(),
            });
        }
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let armed = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if armed {
            return Err(StoreError::WriteFailed {
                key: key.to_owned(),
                message: "injected write failure".into(),
            });
        }
        self.inner.write(key, bytes).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::ListFailed {
                prefix: prefix.to_owned(),
                message: "store unreachable".into(),
            });
        }
        self.inner.list(prefix).await
    }
}
