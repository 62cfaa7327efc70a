//! SlowSubscriber: sleeps before recording each event.

use crate::error::SubscriberError;
use crate::event::Event;
use crate::id::EventId;
use crate::subscriber::Subscriber;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// A subscriber that waits `delay` on every event, then records its id.
pub struct SlowSubscriber {
    delay: Duration,
    ids: Mutex<Vec<EventId>>,
}

impl SlowSubscriber {
    /// Create a subscriber that takes `delay` per event.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ids: Mutex::new(Vec::new()),
        }
    }

    /// Ids whose callback ran to completion, in completion order.
    pub fn ids(&self) -> Vec<EventId> {
        self.ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl Subscriber for SlowSubscriber {
    async fn on_event(&self, event: &Event) -> Result<(), SubscriberError> {
        tokio::time::sleep(self.delay).await;
        self.ids.lock().unwrap().push(event.id);
        Ok(())
    }
}
