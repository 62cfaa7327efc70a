//! RecordingSubscriber: remembers every event it is handed.

use crate::error::SubscriberError;
use crate::event::Event;
use crate::id::EventId;
use crate::subscriber::Subscriber;
use async_trait::async_trait;
use std::sync::Mutex;

/// A subscriber that records every event and always succeeds.
/// Use `.ids()` or `.events()` to inspect what was recorded.
pub struct RecordingSubscriber {
    events: Mutex<Vec<Event>>,
}

impl RecordingSubscriber {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of every recorded event, in delivery order.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Ids of every recorded event, in delivery order.
    pub fn ids(&self) -> Vec<EventId> {
        self.events.lock().unwrap().iter().map(|e| e.id).collect()
    }
}

impl Default for RecordingSubscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Subscriber for RecordingSubscriber {
    async fn on_event(&self, event: &Event) -> Result<(), SubscriberError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}
