#![deny(missing_docs)]
//! # tether: umbrella crate
//!
//! A single import surface for the tether event log. Re-exports the event
//! model, the stream, conversation queries, and store backends behind
//! feature flags, plus a `prelude` for the happy path.

pub use tether_types;
#[cfg(feature = "memory")]
pub use tether_memory;
#[cfg(feature = "store-fs")]
pub use tether_store_fs;
#[cfg(feature = "store-memory")]
pub use tether_store_memory;
#[cfg(feature = "stream")]
pub use tether_stream;

/// Happy-path imports for recording and reading agent sessions.
pub mod prelude {
    pub use tether_types::{
        Action, AgentState, Event, EventDraft, EventId, EventKind, EventSource, Observation,
        RecordStore, StreamError, StreamId, Subscriber, SubscriberError,
    };

    #[cfg(feature = "stream")]
    pub use tether_stream::{
        DelegateRange, EventQuery, EventReader, EventStream, StreamConfig, SubscribeOptions,
    };

    #[cfg(feature = "memory")]
    pub use tether_memory::{ConversationMemory, UserIntent};

    #[cfg(feature = "store-memory")]
    pub use tether_store_memory::MemoryStore;

    #[cfg(feature = "store-fs")]
    pub use tether_store_fs::FsStore;
}
