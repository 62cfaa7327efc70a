//! # tether-types: event model and protocol traits for the tether event log
//!
//! This crate defines the vocabulary every other tether crate speaks: the
//! typed event record, the two seams where the log meets the outside world,
//! and the errors that cross those seams.
//!
//! ## The Model
//!
//! | Type | What it is |
//! |------|-----------|
//! | [`Event`] | Immutable, id-stamped record of one [`Action`] or [`Observation`] |
//! | [`EventDraft`] | What a producer hands to the log before an id is assigned |
//! | [`EventKind`] | Closed set of variant names used for filtering |
//! | [`EventId`] | Dense, stream-local sequence number |
//!
//! ## The Seams
//!
//! | Seam | Trait | What it does |
//! |------|-------|-------------|
//! | Persistence | [`RecordStore`] | Durable key/value bytes addressed by path-like keys |
//! | Notification | [`Subscriber`] | Receives every new event, in id order |
//!
//! ## Wire Format
//!
//! [`Event`] serializes to a flat JSON object: `id`, `timestamp`, `source`,
//! exactly one of `action` / `observation` carrying the kind name, the
//! variant's own fields, `extras`, and a human-readable `message`. The
//! `message` is derived on write and ignored on read.
//!
//! ## Dependency Notes
//!
//! Payload mappings (delegate inputs, finish outputs, extras) are
//! `serde_json::Map`. Agents exchange JSON, and keeping the maps untyped
//! lets the log persist whatever a runtime produces without a schema.

#![deny(missing_docs)]

pub mod action;
pub mod agent;
pub mod error;
pub mod event;
pub mod id;
pub mod kind;
pub mod observation;
pub mod store;
pub mod subscriber;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports for convenience
pub use action::Action;
pub use agent::AgentState;
pub use error::{StoreError, StreamError, SubscriberError};
pub use event::{Event, EventDraft, EventPayload, EventSource};
pub use id::{EventId, StreamId, SubscriberId};
pub use kind::{ActionKind, EventKind, ObservationKind};
pub use observation::Observation;
pub use store::RecordStore;
pub use subscriber::Subscriber;
