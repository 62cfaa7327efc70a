//! FailingSubscriber: errors on every event.

use crate::error::SubscriberError;
use crate::event::Event;
use crate::subscriber::Subscriber;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A subscriber that counts its calls and returns an error from each.
pub struct FailingSubscriber {
    calls: AtomicUsize,
}

impl FailingSubscriber {
    /// Create a new failing subscriber.
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    /// How many events were delivered.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FailingSubscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Subscriber for FailingSubscriber {
    async fn on_event(&self, event: &Event) -> Result<(), SubscriberError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SubscriberError::Failed(format!("refused event {}", event.id)))
    }
}
