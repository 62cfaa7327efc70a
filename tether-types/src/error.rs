//! Error types for each seam.

use crate::id::EventId;
use thiserror::Error;

/// Record store errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key cannot be stored by this backend.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A read failed for a reason other than the key being absent.
    #[error("read failed for {key}: {message}")]
    ReadFailed {
        /// The key being read.
        key: String,
        /// Backend error message.
        message: String,
    },

    /// A write failed; the record may not be durable.
    #[error("write failed for {key}: {message}")]
    WriteFailed {
        /// The key being written.
        key: String,
        /// Backend error message.
        message: String,
    },

    /// Listing keys under a prefix failed.
    #[error("list failed for prefix {prefix:?}: {message}")]
    ListFailed {
        /// The prefix being listed.
        prefix: String,
        /// Backend error message.
        message: String,
    },

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Event stream errors. Each one is fatal to the `open` or `append` call
/// that raised it.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StreamError {
    /// The stream id cannot be used as a single key segment.
    #[error("invalid stream id {0:?}")]
    InvalidStreamId(String),

    /// The stream was opened outside a tokio runtime.
    #[error("no tokio runtime to drive subscribers")]
    NoRuntime,

    /// The record store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// An event could not be encoded for persistence.
    #[error("failed to encode event {id}: {source}")]
    Encode {
        /// Id the event would have received.
        id: EventId,
        /// Serializer error.
        source: serde_json::Error,
    },

    /// A persisted record could not be decoded.
    #[error("corrupt record at {key}: {source}")]
    CorruptRecord {
        /// Key of the record.
        key: String,
        /// Deserializer error.
        source: serde_json::Error,
    },

    /// A persisted record's id disagrees with the id in its key.
    #[error("record at {key} carries id {found}")]
    IdMismatch {
        /// Key of the record.
        key: String,
        /// Id found inside the record.
        found: EventId,
    },

    /// Persisted ids have a gap or do not start at zero.
    #[error("persisted ids are not contiguous: expected {expected}, found {found}")]
    NonContiguous {
        /// The id that should have come next.
        expected: EventId,
        /// The id actually found.
        found: EventId,
    },
}

/// Subscriber errors. These are logged by the registry and never reach the
/// producer that appended the event.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SubscriberError {
    /// The callback failed.
    #[error("subscriber failed: {0}")]
    Failed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
