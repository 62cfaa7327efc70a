//! Configuration for EventStream.

use std::time::Duration;

/// Static configuration for an [`EventStream`](crate::EventStream).
///
/// Subscriber queues are unbounded: a slow subscriber never blocks the
/// producer or its peers, it only grows its own backlog. `backlog_warning`
/// decides when that growth gets logged, and `callback_timeout` bounds how
/// long any single callback may run before it is cancelled.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// First key segment of every record. Records live at
    /// `<key_prefix>/<stream_id>/events/<id>.json`.
    pub key_prefix: String,

    /// Backlog size at which a queued subscriber is reported as falling
    /// behind.
    pub backlog_warning: usize,

    /// Upper bound on a single callback. `None` lets callbacks run for as
    /// long as they need.
    pub callback_timeout: Option<Duration>,
}

impl StreamConfig {
    /// Store records under a different first key segment.
    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    /// Report queued subscribers once their backlog reaches `events`.
    pub fn with_backlog_warning(mut self, events: usize) -> Self {
        self.backlog_warning = events;
        self
    }

    /// Cancel callbacks that run longer than `timeout`.
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = Some(timeout);
        self
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            key_prefix: "sessions".into(),
            backlog_warning: 1024,
            callback_timeout: None,
        }
    }
}
