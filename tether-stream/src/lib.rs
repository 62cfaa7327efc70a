#![deny(missing_docs)]
//! Append-only event stream for tether.
//!
//! [`EventStream`] owns one stream id: it assigns dense ids, persists each
//! event through a [`RecordStore`](tether_types::RecordStore) before anyone
//! can see it, and fans new events out to named subscribers in a fixed
//! order. Reads go through [`EventReader`] and never touch the store.
//!
//! Delegated sub-tasks are tracked automatically. The stream registers an
//! inline tracker that records a [`DelegateRange`] whenever a `delegate`
//! observation closes one, and the default [`EventQuery`] hides everything
//! strictly inside those ranges.
//!
//! ```no_run
//! # async fn demo(store: std::sync::Arc<dyn tether_types::RecordStore>) -> Result<(), tether_types::StreamError> {
//! use tether_stream::{EventQuery, EventStream};
//! use tether_types::{Action, EventSource};
//!
//! let stream = EventStream::open("session-1", store).await?;
//! stream.append(Action::read("notes.md"), EventSource::Agent).await?;
//! for event in stream.events(&EventQuery::default().reverse()) {
//!     println!("{}: {}", event.id, event.message());
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod delegate;
mod keys;
mod log;
mod query;
mod registry;
mod stream;

pub use config::StreamConfig;
pub use delegate::DelegateRange;
pub use query::{EventQuery, EventReader, Events};
pub use registry::{Delivery, Position, SubscribeOptions};
pub use stream::EventStream;
